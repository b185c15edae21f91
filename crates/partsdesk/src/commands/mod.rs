//! Console commands. Each module handles one group of subcommands.

pub mod dashboard;
pub mod jobs;
pub mod parts;

use std::sync::Arc;

use serde::Serialize;

use partsdesk::eligibility::{Action, Evaluation};
use partsdesk::inflight::{InFlightGuard, JobActionKey};
use partsdesk::{ApiClient, Config, InFlight, PartsdeskError, Result};

/// How command results are printed on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Everything a command needs, built once per invocation.
pub struct CommandContext {
    pub config: Config,
    pub client: Arc<ApiClient>,
    pub format: OutputFormat,
    in_flight: InFlight<JobActionKey>,
}

impl CommandContext {
    pub fn new(config: Config, client: ApiClient, format: OutputFormat) -> Self {
        Self {
            config,
            client: Arc::new(client),
            format,
            in_flight: InFlight::new(),
        }
    }

    /// Prints `value` as JSON, or the text rendering otherwise.
    pub fn emit<T, F>(&self, value: &T, text: F) -> Result<()>
    where
        T: Serialize,
        F: FnOnce() -> String,
    {
        match self.format {
            OutputFormat::Json => println!("{}", to_json(value)?),
            OutputFormat::Text => println!("{}", text()),
        }
        Ok(())
    }

    /// Checks that `action` is offered for `job_id` and marks it in flight.
    ///
    /// The returned guard must be held until the request completes. A
    /// console run dispatches one action, so the registry only rejects a
    /// second `begin` for the same key made while the guard is alive;
    /// callers running actions concurrently share one [`InFlight`] instead.
    pub fn begin(
        &self,
        evaluation: &Evaluation,
        job_id: &str,
        action: Action,
    ) -> Result<InFlightGuard<JobActionKey>> {
        require(evaluation, job_id, action)?;
        self.in_flight
            .try_begin((job_id.to_string(), action))
            .ok_or_else(|| {
                PartsdeskError::ActionUnavailable(format!(
                    "{} is already running for job {}",
                    action.label(),
                    job_id
                ))
            })
    }
}

pub fn require(evaluation: &Evaluation, job_id: &str, action: Action) -> Result<()> {
    if evaluation.actions.contains(action) {
        return Ok(());
    }
    Err(PartsdeskError::ActionUnavailable(format!(
        "{} is not available for job {}",
        action.label(),
        job_id
    )))
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Joins action labels for a text row.
pub fn action_list(evaluation: &Evaluation) -> String {
    let labels: Vec<&str> = evaluation.actions.iter().map(|a| a.label()).collect();
    if labels.is_empty() {
        "-".to_string()
    } else {
        labels.join(", ")
    }
}
