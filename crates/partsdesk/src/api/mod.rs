//! Typed client for the parts service HTTP API.
//!
//! All endpoints live under `/api/v1`. Every call either returns the decoded
//! response or an [`ApiError`]; nothing is retried.

mod client;
mod dashboard;
mod download;
mod error;
mod jobs;
mod parts;
mod upload;

pub use client::{
    ApiClient, ApiClientBuilder, DEFAULT_CATALOG_TTL, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_REQUEST_TIMEOUT,
};
pub use download::{filename_from_disposition, Download, DownloadKind};
pub use error::ApiError;
pub use upload::{format_estimated_duration, PreparedUpload, ScrapingUpload};
