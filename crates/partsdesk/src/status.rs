//! Closed status vocabularies for jobs and parts.
//!
//! The backend transmits these as loosely-typed strings. Everything that
//! enters the crate is parsed into one of the enums below; a value outside
//! the vocabulary is reported as [`UnknownStatus`] and never defaulted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which vocabulary a rejected value was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Vocabulary {
    JobKind,
    JobStatus,
    PartStatus,
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vocabulary::JobKind => write!(f, "job kind"),
            Vocabulary::JobStatus => write!(f, "job status"),
            Vocabulary::PartStatus => write!(f, "part status"),
        }
    }
}

/// A status (or kind) string outside its closed vocabulary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {vocabulary} '{value}'{}", record_suffix(.record))]
pub struct UnknownStatus {
    pub vocabulary: Vocabulary,
    pub value: String,
    /// Identifier of the offending record, when known.
    pub record: Option<String>,
}

impl UnknownStatus {
    pub fn new(vocabulary: Vocabulary, value: &str) -> Self {
        Self {
            vocabulary,
            value: value.to_string(),
            record: None,
        }
    }

    /// Attaches the identifier of the record carrying the bad value.
    pub fn on(mut self, record: &str) -> Self {
        if !record.is_empty() {
            self.record = Some(record.to_string());
        }
        self
    }
}

fn record_suffix(record: &Option<String>) -> String {
    record
        .as_deref()
        .map(|r| format!(" on {}", r))
        .unwrap_or_default()
}

fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Kind of job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Scraping,
    Enrichment,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Scraping => "scraping",
            JobKind::Enrichment => "enrichment",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobKind::Scraping => "Scraping",
            JobKind::Enrichment => "Enrichment",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "scraping" => Ok(JobKind::Scraping),
            "enrichment" => Ok(JobKind::Enrichment),
            _ => Err(UnknownStatus::new(Vocabulary::JobKind, s)),
        }
    }
}

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Pending,
        JobStatus::InProgress,
        JobStatus::Completed,
        JobStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::InProgress => "In progress",
            JobStatus::Completed => "Completed",
            JobStatus::Failed => "Failed",
        }
    }

    /// Returns true once the backend has finished with the job.
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "pending" => Ok(JobStatus::Pending),
            "in_progress" => Ok(JobStatus::InProgress),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(UnknownStatus::new(Vocabulary::JobStatus, s)),
        }
    }
}

/// Lifecycle status of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartStatus {
    NotFound,
    Scraped,
    Enriched,
    Verified,
}

impl PartStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartStatus::NotFound => "not_found",
            PartStatus::Scraped => "scraped",
            PartStatus::Enriched => "enriched",
            PartStatus::Verified => "verified",
        }
    }

    /// `not_found` parts carry no data and stay out of verification.
    pub fn is_verifiable(&self) -> bool {
        !matches!(self, PartStatus::NotFound)
    }
}

impl fmt::Display for PartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "not_found" => Ok(PartStatus::NotFound),
            "scraped" => Ok(PartStatus::Scraped),
            "enriched" => Ok(PartStatus::Enriched),
            "verified" => Ok(PartStatus::Verified),
            _ => Err(UnknownStatus::new(Vocabulary::PartStatus, s)),
        }
    }
}
