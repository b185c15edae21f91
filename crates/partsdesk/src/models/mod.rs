//! Request and response models of the parts service API.

pub mod dashboard;
pub mod job;
pub mod part;
pub mod problem;
pub mod timestamp;
pub mod user;

pub use dashboard::{DashboardData, DashboardQuery, JobSummary, PartStatistics};
pub use job::{Job, JobDetail, JobRecord, JobsResponse, ServiceType, ServiceTypes};
pub use part::{decode_field_map, FieldMap, PartImage, PartRecord, VerifyRequest};
pub use problem::{ErrorBody, ErrorDetail, FieldError, LocSegment};
pub use user::{Message, UserPublic, UserRef};
