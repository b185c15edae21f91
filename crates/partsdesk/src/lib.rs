pub mod api;
pub mod board;
pub mod config;
pub mod dashboard;
pub mod eligibility;
pub mod error;
pub mod images;
pub mod inflight;
pub mod logging;
pub mod models;
pub mod secrets;
pub mod status;
pub mod verification;

pub use api::{ApiClient, ApiClientBuilder, ApiError, Download, DownloadKind, ScrapingUpload};
pub use board::{BoardEvent, BoardRow, JobBoard, JobDetailView, JobPoller, JobSource};
pub use config::{load_config, load_config_or_default, Config};
pub use dashboard::{DashboardFilters, DateRangePreset};
pub use eligibility::{evaluate, Action, ActionSet, DataWarning, Evaluation};
pub use error::{ConfigError, PartsdeskError, Result};
pub use images::ImageGallery;
pub use inflight::{InFlight, InFlightGuard};
pub use secrets::{resolve_secret, resolve_secret_optional, SecretError};
pub use status::{JobKind, JobStatus, PartStatus, UnknownStatus};
pub use verification::{apply_verification, VerificationDraft, VerificationError};
