//! Dashboard filter state and the query it produces.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, Months, NaiveDate};

use crate::api::ApiError;
use crate::models::{DashboardQuery, FieldError};
use crate::status::{JobKind, JobStatus};

/// Rows per dashboard page unless configured otherwise.
pub const DEFAULT_DASHBOARD_PAGE_SIZE: u32 = 20;

/// Date range shortcuts. Each preset ends today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateRangePreset {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
    /// Explicit `date_from`/`date_to`.
    Custom,
}

impl DateRangePreset {
    /// Resolves to `(date_from, date_to)`. `Custom` has no fixed range.
    pub fn resolve(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let from = match self {
            DateRangePreset::Week => today.checked_sub_days(Days::new(7)),
            DateRangePreset::Month => today.checked_sub_months(Months::new(1)),
            DateRangePreset::Quarter => today.checked_sub_months(Months::new(3)),
            DateRangePreset::Year => today.checked_sub_months(Months::new(12)),
            DateRangePreset::Custom => return None,
        };
        Some((from.unwrap_or(NaiveDate::MIN), today))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DateRangePreset::Week => "week",
            DateRangePreset::Month => "month",
            DateRangePreset::Quarter => "quarter",
            DateRangePreset::Year => "year",
            DateRangePreset::Custom => "custom",
        }
    }
}

impl fmt::Display for DateRangePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateRangePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(DateRangePreset::Week),
            "month" => Ok(DateRangePreset::Month),
            "quarter" => Ok(DateRangePreset::Quarter),
            "year" => Ok(DateRangePreset::Year),
            "custom" => Ok(DateRangePreset::Custom),
            other => Err(format!(
                "unknown date range '{}' (expected week, month, quarter, year or custom)",
                other
            )),
        }
    }
}

/// Filter state of the dashboard. Any filter change goes back to page 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardFilters {
    job_type: Option<JobKind>,
    status: Option<JobStatus>,
    range: DateRangePreset,
    custom_from: Option<NaiveDate>,
    custom_to: Option<NaiveDate>,
    page: u32,
    page_size: u32,
}

impl Default for DashboardFilters {
    fn default() -> Self {
        Self::new(DEFAULT_DASHBOARD_PAGE_SIZE)
    }
}

impl DashboardFilters {
    pub fn new(page_size: u32) -> Self {
        Self {
            job_type: None,
            status: None,
            range: DateRangePreset::default(),
            custom_from: None,
            custom_to: None,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn range(&self) -> DateRangePreset {
        self.range
    }

    pub fn set_job_type(&mut self, job_type: Option<JobKind>) {
        self.job_type = job_type;
        self.page = 1;
    }

    pub fn set_status(&mut self, status: Option<JobStatus>) {
        self.status = status;
        self.page = 1;
    }

    pub fn set_range(&mut self, range: DateRangePreset) {
        self.range = range;
        self.page = 1;
    }

    /// Sets an explicit range and switches to [`DateRangePreset::Custom`].
    pub fn set_custom_range(&mut self, from: NaiveDate, to: NaiveDate) {
        self.custom_from = Some(from);
        self.custom_to = Some(to);
        self.set_range(DateRangePreset::Custom);
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Builds the request for the current filters relative to `today`.
    pub fn to_query(&self, today: NaiveDate) -> Result<DashboardQuery, ApiError> {
        let (date_from, date_to) = match self.range.resolve(today) {
            Some(range) => range,
            None => match (self.custom_from, self.custom_to) {
                (Some(from), Some(to)) => (from, to),
                (from, to) => {
                    let mut errors = Vec::new();
                    if from.is_none() {
                        errors.push(FieldError::for_field(
                            "date_from",
                            "Start date is required for a custom range",
                            "value_error.missing",
                        ));
                    }
                    if to.is_none() {
                        errors.push(FieldError::for_field(
                            "date_to",
                            "End date is required for a custom range",
                            "value_error.missing",
                        ));
                    }
                    return Err(ApiError::Validation(errors));
                }
            },
        };

        if date_from > date_to {
            return Err(ApiError::Validation(vec![FieldError::for_field(
                "date_from",
                "Start date is after end date",
                "value_error",
            )]));
        }

        Ok(DashboardQuery {
            date_from,
            date_to,
            job_type: self.job_type,
            status: self.status,
            page: Some(self.page),
            page_size: Some(self.page_size),
        })
    }
}

/// Formats a duration in seconds as fractional hours.
pub fn format_hours(seconds: f64) -> String {
    format!("{:.2} hours", seconds / 3600.0)
}
