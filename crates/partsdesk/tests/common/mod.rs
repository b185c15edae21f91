//! Shared test utilities for partsdesk integration tests.
//!
//! This module provides:
//! - Builders for job, part and catalog records
//! - `FakeBackend`, an in-process HTTP service speaking the `/api/v1` contract

pub mod backend;
pub mod builders;

pub use backend::{BackendState, FakeBackend, RecordedUpload};
pub use builders::*;
