//! Job list and job detail views kept in sync with the service.

pub mod detail;
pub mod job_board;
pub mod poller;

pub use detail::{JobDetailView, PartPager, DEFAULT_PARTS_PER_PAGE};
pub use job_board::{
    BoardQuery, BoardRow, BoardSort, JobBoard, ReplaceOutcome, DEFAULT_JOBS_PER_PAGE,
};
pub use poller::{BoardEvent, JobPoller, JobSource, DEFAULT_POLL_INTERVAL};
