//! Cached view of one page of the job list.

use std::cmp::Ordering;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::eligibility::{self, ActionSet, DataWarning, Evaluation};
use crate::models::JobRecord;
use crate::status::{JobKind, JobStatus, UnknownStatus};

/// Jobs shown per page of the list.
pub const DEFAULT_JOBS_PER_PAGE: usize = 5;

// ─── Rows ───────────────────────────────────────────────────────────────────

/// One listed job with its evaluated actions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardRow {
    pub job: JobRecord,
    #[serde(serialize_with = "serialize_evaluation")]
    pub evaluation: Result<Evaluation, UnknownStatus>,
}

fn serialize_evaluation<S>(
    evaluation: &Result<Evaluation, UnknownStatus>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    #[derive(Serialize)]
    struct Invalid {
        integrity_error: String,
    }
    match evaluation {
        Ok(evaluation) => evaluation.serialize(serializer),
        Err(e) => Invalid {
            integrity_error: e.to_string(),
        }
        .serialize(serializer),
    }
}

impl BoardRow {
    pub fn new(job: JobRecord) -> Self {
        let evaluation = eligibility::evaluate(&job);
        if let Err(e) = &evaluation {
            log::warn!("Job {} cannot be evaluated: {}", job.id, e);
        }
        Self { job, evaluation }
    }

    pub fn id(&self) -> &str {
        &self.job.id
    }

    pub fn kind(&self) -> Option<JobKind> {
        self.job.kind.parse().ok()
    }

    pub fn status(&self) -> Option<JobStatus> {
        self.job.status.parse().ok()
    }

    pub fn enrichment(&self) -> Option<&JobRecord> {
        self.job.enrichment.as_deref()
    }

    /// Enabled actions; empty when the row failed evaluation.
    pub fn actions(&self) -> ActionSet {
        self.evaluation
            .as_ref()
            .map(|e| e.actions.clone())
            .unwrap_or_default()
    }

    pub fn warnings(&self) -> &[DataWarning] {
        match &self.evaluation {
            Ok(e) => &e.warnings,
            Err(_) => &[],
        }
    }

    pub fn integrity_error(&self) -> Option<&UnknownStatus> {
        self.evaluation.as_ref().err()
    }
}

// ─── Query ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BoardSort {
    #[default]
    NewestFirst,
    OldestFirst,
    Name,
    /// Highest progress first.
    Progress,
}

/// Client-side filter and sort over the cached page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardQuery {
    pub kind: Option<JobKind>,
    pub status: Option<JobStatus>,
    /// Case-insensitive substring of the job name.
    pub name_contains: Option<String>,
    pub sort: BoardSort,
}

impl BoardQuery {
    fn matches(&self, row: &BoardRow) -> bool {
        if let Some(kind) = self.kind {
            if row.kind() != Some(kind) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if row.status() != Some(status) {
                return false;
            }
        }
        if let Some(needle) = self.name_contains.as_deref().map(str::trim) {
            if !needle.is_empty()
                && !row
                    .job
                    .name
                    .to_lowercase()
                    .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        true
    }

    fn compare(&self, a: &BoardRow, b: &BoardRow) -> Ordering {
        match self.sort {
            BoardSort::NewestFirst => b.job.created_at.cmp(&a.job.created_at),
            BoardSort::OldestFirst => a.job.created_at.cmp(&b.job.created_at),
            BoardSort::Name => a
                .job
                .name
                .to_lowercase()
                .cmp(&b.job.name.to_lowercase()),
            BoardSort::Progress => b.job.progress.total_cmp(&a.job.progress),
        }
    }
}

// ─── JobBoard ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct BoardState {
    page: u32,
    /// Sequence number of the last applied fetch.
    applied_seq: u64,
    rows: Vec<BoardRow>,
    fetched: usize,
    refreshed_at: Option<DateTime<Utc>>,
}

/// Result of offering a fetch to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Applied,
    /// An equal or newer fetch was already applied.
    Stale,
    /// The fetch was for a page no longer shown.
    WrongPage,
}

/// Paginated, cached job list.
///
/// Fetch results replace the cached page wholesale. Each fetch carries a
/// sequence number taken when it was issued, and only a result newer than
/// the last applied one is accepted.
#[derive(Debug)]
pub struct JobBoard {
    page_size: usize,
    state: RwLock<BoardState>,
}

impl Default for JobBoard {
    fn default() -> Self {
        Self::new(DEFAULT_JOBS_PER_PAGE)
    }
}

impl JobBoard {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            state: RwLock::new(BoardState {
                page: 1,
                ..Default::default()
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, BoardState> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Job board lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, BoardState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Job board lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page(&self) -> u32 {
        self.read().page
    }

    /// Offset of the current page for the list request.
    pub fn skip(&self) -> u64 {
        (u64::from(self.page()) - 1) * self.page_size as u64
    }

    /// Switches pages. The cached rows belong to the old page and are dropped.
    pub fn set_page(&self, page: u32) {
        let page = page.max(1);
        let mut state = self.write();
        if state.page != page {
            state.page = page;
            state.rows.clear();
            state.fetched = 0;
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page() > 1
    }

    /// A full page suggests more jobs exist beyond it.
    pub fn has_next(&self) -> bool {
        self.read().fetched == self.page_size
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.read().refreshed_at
    }

    /// Offers the result of a fetch issued with `seq` for `page`.
    pub fn replace(&self, seq: u64, page: u32, records: Vec<JobRecord>) -> ReplaceOutcome {
        let mut state = self.write();

        if page != state.page {
            log::debug!(
                "Discarding fetch {} for page {} (showing page {})",
                seq,
                page,
                state.page
            );
            return ReplaceOutcome::WrongPage;
        }
        if seq <= state.applied_seq {
            log::debug!(
                "Discarding stale fetch {} (already applied {})",
                seq,
                state.applied_seq
            );
            return ReplaceOutcome::Stale;
        }

        let fetched = records.len();
        let rows = records
            .into_iter()
            .map(|mut record| {
                if let Some(previous) = state.rows.iter().find(|r| r.job.id == record.id) {
                    keep_progress(&previous.job, &mut record);
                    if let (Some(old), Some(new)) =
                        (previous.job.enrichment.as_deref(), record.enrichment.as_deref_mut())
                    {
                        if old.id == new.id {
                            keep_progress(old, new);
                        }
                    }
                }
                BoardRow::new(record)
            })
            .collect();

        state.rows = rows;
        state.fetched = fetched;
        state.applied_seq = seq;
        state.refreshed_at = Some(Utc::now());
        ReplaceOutcome::Applied
    }

    /// All cached rows in service order.
    pub fn rows(&self) -> Vec<BoardRow> {
        self.read().rows.clone()
    }

    pub fn row(&self, job_id: &str) -> Option<BoardRow> {
        self.read().rows.iter().find(|r| r.job.id == job_id).cloned()
    }

    /// Cached rows filtered and sorted by `query`.
    pub fn query(&self, query: &BoardQuery) -> Vec<BoardRow> {
        let mut rows: Vec<BoardRow> = self
            .read()
            .rows
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| query.compare(a, b));
        rows
    }

    pub fn len(&self) -> usize {
        self.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().rows.is_empty()
    }
}

/// While a job stays `in_progress`, progress never moves backwards.
fn keep_progress(previous: &JobRecord, current: &mut JobRecord) {
    let in_progress = |r: &JobRecord| r.status.parse::<JobStatus>().ok() == Some(JobStatus::InProgress);
    if in_progress(previous) && in_progress(current) && current.progress < previous.progress {
        log::debug!(
            "Job {} progress went from {} to {}, keeping {}",
            current.id,
            previous.progress,
            current.progress,
            previous.progress
        );
        current.progress = previous.progress;
    }
}
