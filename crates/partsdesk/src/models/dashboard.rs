//! Aggregate dashboard read contract.
//!
//! The aggregation itself happens on the service; these types only carry
//! the result.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::timestamp;
use crate::status::{JobKind, JobStatus, UnknownStatus};

/// Query parameters of `GET /dashboard/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardQuery {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<JobKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

/// Part counters over the selected jobs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartStatistics {
    pub total_parts: u64,
    pub parts_enriched: u64,
    pub parts_verified: u64,
    pub parts_not_found: u64,
    /// Percent, 0-100.
    pub enrichment_success_rate: f64,
}

/// One row of the dashboard job table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<u64>,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Response of `GET /dashboard/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    pub total_jobs: u64,
    pub average_cost: Decimal,
    /// Seconds.
    pub average_time: f64,
    #[serde(default)]
    pub job_type_distribution: BTreeMap<String, u64>,
    #[serde(default)]
    pub status_distribution: BTreeMap<String, u64>,
    #[serde(default)]
    pub part_statistics: PartStatistics,
    #[serde(default)]
    pub jobs: Vec<JobSummary>,
    #[serde(default)]
    pub total_pages: u32,
}

impl DashboardData {
    /// Job counts keyed by kind. Foreign keys are a data-integrity error.
    pub fn job_type_counts(&self) -> Result<BTreeMap<JobKind, u64>, UnknownStatus> {
        typed_counts(&self.job_type_distribution)
    }

    /// Job counts keyed by status. Foreign keys are a data-integrity error.
    pub fn status_counts(&self) -> Result<BTreeMap<JobStatus, u64>, UnknownStatus> {
        typed_counts(&self.status_distribution)
    }
}

fn typed_counts<K>(raw: &BTreeMap<String, u64>) -> Result<BTreeMap<K, u64>, UnknownStatus>
where
    K: std::str::FromStr<Err = UnknownStatus> + Ord,
{
    let mut counts = BTreeMap::new();
    for (key, count) in raw {
        *counts.entry(key.parse::<K>()?).or_insert(0) += count;
    }
    Ok(counts)
}
