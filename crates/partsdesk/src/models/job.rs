//! Job records as transmitted by the service, and their validated form.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::part::PartRecord;
use crate::models::timestamp;
use crate::status::{JobKind, JobStatus, UnknownStatus};

/// A job exactly as the service sends it.
///
/// `kind` and `status` stay raw strings here; [`Job::try_from`] validates
/// them against the closed vocabularies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Empty when the service omitted it.
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    #[serde(default)]
    pub name: String,
    /// Scraper or enrichment service identifier.
    #[serde(default)]
    pub service_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<Decimal>,
    /// Estimated duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<u64>,
    /// Percent, 0-100.
    #[serde(default)]
    pub progress: f64,
    /// `None` when absent or not a recognizable timestamp.
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_by_id: Option<String>,
    #[serde(default)]
    pub part_ids: Vec<String>,
    /// For enrichment jobs: the scraping job being enriched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// The enrichment child of a scraping job. The service nests it under
    /// `parent_job` in list and detail responses.
    #[serde(
        default,
        rename = "parent_job",
        skip_serializing_if = "Option::is_none"
    )]
    pub enrichment: Option<Box<JobRecord>>,
}

impl JobRecord {
    /// Returns true when the record carries a usable identifier.
    pub fn has_id(&self) -> bool {
        !self.id.trim().is_empty()
    }
}

/// A job whose kind and status were validated.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: String,
    pub kind: JobKind,
    pub status: JobStatus,
    pub name: String,
    pub service_type: String,
    pub error_message: Option<String>,
    pub estimated_cost: Option<Decimal>,
    pub estimated_time: Option<u64>,
    pub progress: f64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub parent_id: Option<String>,
    pub part_ids: Vec<String>,
}

impl Job {
    /// Progress clamped to the 0-100 range.
    pub fn progress_percent(&self) -> f64 {
        if self.progress.is_nan() {
            return 0.0;
        }
        self.progress.clamp(0.0, 100.0)
    }
}

impl TryFrom<&JobRecord> for Job {
    type Error = UnknownStatus;

    fn try_from(record: &JobRecord) -> Result<Self, Self::Error> {
        let kind: JobKind = record.kind.parse().map_err(|e: UnknownStatus| e.on(&record.id))?;
        let status: JobStatus = record
            .status
            .parse()
            .map_err(|e: UnknownStatus| e.on(&record.id))?;

        Ok(Self {
            id: record.id.clone(),
            kind,
            status,
            name: record.name.clone(),
            service_type: record.service_type.clone(),
            error_message: record.error_message.clone(),
            estimated_cost: record.estimated_cost,
            estimated_time: record.estimated_time,
            progress: record.progress,
            created_at: record.created_at,
            updated_at: record.updated_at,
            parent_id: record.parent_id.clone(),
            part_ids: record.part_ids.clone(),
        })
    }
}

/// A job with its parts, as returned by the job read endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDetail {
    #[serde(flatten)]
    pub job: JobRecord,
    #[serde(default)]
    pub parts: Vec<PartRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_parts: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_parts_count: Option<u64>,
}

impl JobDetail {
    pub fn total_parts(&self) -> u64 {
        self.total_parts.unwrap_or(self.parts.len() as u64)
    }
}

/// Paginated job list envelope. Some deployments return a bare array instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobsResponse {
    Page { data: Vec<JobRecord>, count: u64 },
    List(Vec<JobRecord>),
}

impl JobsResponse {
    pub fn into_records(self) -> Vec<JobRecord> {
        match self {
            JobsResponse::Page { data, .. } => data,
            JobsResponse::List(data) => data,
        }
    }
}

/// A scraper or enrichment service offered by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ServiceTypeRepr")]
pub struct ServiceType {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ServiceTypeRepr {
    Named { id: String, name: String },
    Bare(String),
}

impl From<ServiceTypeRepr> for ServiceType {
    fn from(repr: ServiceTypeRepr) -> Self {
        match repr {
            ServiceTypeRepr::Named { id, name } => Self { id, name },
            ServiceTypeRepr::Bare(id) => Self {
                name: id.clone(),
                id,
            },
        }
    }
}

/// Services available per job kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTypes {
    #[serde(default)]
    pub scraping: Vec<ServiceType>,
    #[serde(default)]
    pub enrichment: Vec<ServiceType>,
}

impl ServiceTypes {
    pub fn for_kind(&self, kind: JobKind) -> &[ServiceType] {
        match kind {
            JobKind::Scraping => &self.scraping,
            JobKind::Enrichment => &self.enrichment,
        }
    }

    /// Display name for a service identifier, falling back to the identifier.
    pub fn display_name<'a>(&'a self, kind: JobKind, id: &'a str) -> &'a str {
        self.for_kind(kind)
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.name.as_str())
            .unwrap_or(id)
    }
}
