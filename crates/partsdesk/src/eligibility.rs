//! Action eligibility for a scraping job and its optional enrichment child.
//!
//! Every rule is evaluated independently, so several actions can be
//! enabled at once. Evaluation is pure and cheap: it runs again on each
//! poll tick against the freshly observed records.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::models::{Job, JobRecord};
use crate::status::{JobKind, JobStatus, UnknownStatus};

/// A user action offered for a job row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    RunScraping,
    CreateEnrichment,
    RunEnrichment,
    ViewDetails,
    ViewError,
    Delete,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::RunScraping,
        Action::CreateEnrichment,
        Action::RunEnrichment,
        Action::ViewDetails,
        Action::ViewError,
        Action::Delete,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Action::RunScraping => "Run scraping",
            Action::CreateEnrichment => "Create enrichment",
            Action::RunEnrichment => "Run enrichment",
            Action::ViewDetails => "View details",
            Action::ViewError => "View error",
            Action::Delete => "Delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Set of enabled actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ActionSet(BTreeSet<Action>);

impl ActionSet {
    pub fn contains(&self, action: Action) -> bool {
        self.0.contains(&action)
    }

    pub fn iter(&self) -> impl Iterator<Item = Action> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn enable_if(&mut self, action: Action, condition: bool) {
        if condition {
            self.0.insert(action);
        }
    }
}

impl FromIterator<Action> for ActionSet {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A data problem noticed during evaluation that did not prevent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataWarning {
    /// The enrichment child has no identifier; it was treated as absent.
    EnrichmentWithoutId { scraping_job: String },
    /// The nested child is not an enrichment job; it was treated as absent.
    EnrichmentWrongKind {
        scraping_job: String,
        child: String,
        job_kind: JobKind,
    },
    /// The job evaluated as a scraping parent is of another kind; only the
    /// rules for a standalone job of that kind were applied.
    ParentNotScraping { job: String, job_kind: JobKind },
}

impl fmt::Display for DataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataWarning::EnrichmentWithoutId { scraping_job } => write!(
                f,
                "enrichment job of {} has no identifier and was ignored",
                scraping_job
            ),
            DataWarning::EnrichmentWrongKind {
                scraping_job,
                child,
                job_kind,
            } => write!(
                f,
                "job {} nested under {} is a {} job and was ignored",
                child, scraping_job, job_kind
            ),
            DataWarning::ParentNotScraping { job, job_kind } => {
                write!(f, "job {} is a {} job, not a scraping job", job, job_kind)
            }
        }
    }
}

/// Outcome of evaluating a job row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub actions: ActionSet,
    pub warnings: Vec<DataWarning>,
}

/// Actions enabled for a validated scraping job and enrichment child.
pub fn eligible_actions(scraping: &Job, enrichment: Option<&Job>) -> ActionSet {
    let s = scraping.status;
    let e = enrichment.map(|job| job.status);

    let mut actions = ActionSet::default();
    actions.enable_if(Action::RunScraping, s == JobStatus::Pending);
    actions.enable_if(
        Action::CreateEnrichment,
        s == JobStatus::Completed && e.is_none(),
    );
    actions.enable_if(Action::RunEnrichment, e == Some(JobStatus::Pending));
    actions.enable_if(
        Action::ViewDetails,
        s == JobStatus::Completed && matches!(e, None | Some(JobStatus::Completed)),
    );
    actions.enable_if(
        Action::ViewError,
        s == JobStatus::Failed || e == Some(JobStatus::Failed),
    );
    actions.enable_if(Action::Delete, true);
    actions
}

/// Actions for an enrichment job listed on its own, without its scraping
/// parent at hand. Only the rules that depend on the enrichment job alone
/// apply.
pub fn eligible_enrichment_actions(enrichment: &Job) -> ActionSet {
    let mut actions = ActionSet::default();
    actions.enable_if(
        Action::RunEnrichment,
        enrichment.status == JobStatus::Pending,
    );
    actions.enable_if(Action::ViewError, enrichment.status == JobStatus::Failed);
    actions.enable_if(Action::Delete, true);
    actions
}

/// Actions left for a record whose statuses are outside the vocabulary.
/// Only [`Action::Delete`] does not depend on status.
pub fn integrity_fallback() -> Evaluation {
    Evaluation {
        actions: [Action::Delete].into_iter().collect(),
        warnings: Vec::new(),
    }
}

/// Evaluates a scraping job record against an explicit enrichment record.
///
/// An enrichment record without an identifier, or one that is not an
/// enrichment job, is treated as absent and reported as a [`DataWarning`].
/// A parent that is not a scraping job gets the standalone rules and a
/// warning. Status strings outside the vocabulary on either record yield
/// [`UnknownStatus`] instead of an action set.
pub fn evaluate_pair(
    scraping: &JobRecord,
    enrichment: Option<&JobRecord>,
) -> Result<Evaluation, UnknownStatus> {
    let scraping_job = Job::try_from(scraping)?;
    if scraping_job.kind != JobKind::Scraping {
        log::warn!(
            "Job {} is a {} job, not a scraping job; ignoring its enrichment",
            scraping.id,
            scraping_job.kind
        );
        return Ok(Evaluation {
            actions: eligible_enrichment_actions(&scraping_job),
            warnings: vec![DataWarning::ParentNotScraping {
                job: scraping.id.clone(),
                job_kind: scraping_job.kind,
            }],
        });
    }

    let mut warnings = Vec::new();
    let enrichment_job = match enrichment {
        Some(record) if !record.has_id() => {
            log::warn!(
                "Enrichment job nested under {} has no identifier, ignoring it",
                scraping.id
            );
            warnings.push(DataWarning::EnrichmentWithoutId {
                scraping_job: scraping.id.clone(),
            });
            None
        }
        Some(record) => {
            let job = Job::try_from(record)?;
            if job.kind == JobKind::Enrichment {
                Some(job)
            } else {
                log::warn!(
                    "Job {} nested under {} is a {} job, ignoring it",
                    record.id,
                    scraping.id,
                    job.kind
                );
                warnings.push(DataWarning::EnrichmentWrongKind {
                    scraping_job: scraping.id.clone(),
                    child: record.id.clone(),
                    job_kind: job.kind,
                });
                None
            }
        }
        None => None,
    };

    Ok(Evaluation {
        actions: eligible_actions(&scraping_job, enrichment_job.as_ref()),
        warnings,
    })
}

/// Evaluates a listed job record.
///
/// Scraping jobs are paired with the enrichment child nested in them. A
/// standalone enrichment job gets [`eligible_enrichment_actions`].
pub fn evaluate(record: &JobRecord) -> Result<Evaluation, UnknownStatus> {
    let job = Job::try_from(record)?;
    if job.kind == JobKind::Enrichment {
        return Ok(Evaluation {
            actions: eligible_enrichment_actions(&job),
            warnings: Vec::new(),
        });
    }
    evaluate_pair(record, record.enrichment.as_deref())
}
