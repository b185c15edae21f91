//! `jobs` subcommands: listing, watching and operating on jobs.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Subcommand, ValueEnum};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use partsdesk::api::format_estimated_duration;
use partsdesk::board::{BoardQuery, BoardSort, JobDetailView};
use partsdesk::eligibility::{self, Action, Evaluation};
use partsdesk::models::{FieldError, JobRecord, PartRecord};
use partsdesk::{
    ApiError, BoardEvent, BoardRow, DownloadKind, JobBoard, JobKind, JobPoller, JobStatus,
    PartsdeskError, Result, ScrapingUpload,
};

use super::{action_list, CommandContext};

#[derive(Subcommand)]
pub enum JobsCommand {
    /// Show one page of jobs
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Keep a page of jobs on screen, refreshed until Ctrl-C
    Watch {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Show a job with one page of its parts
    Show {
        id: String,
        /// Page of parts
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Upload a parts list and create a scraping job
    Upload {
        #[arg(long)]
        name: String,
        #[arg(long)]
        file: PathBuf,
        /// Scraping service; the first one offered when omitted
        #[arg(long)]
        scraper_type: Option<String>,
        /// Start scraping right after creation
        #[arg(long)]
        run: bool,
    },

    /// Create an enrichment job for a completed scraping job
    Enrich {
        id: String,
        /// Enrichment service; the first one offered when omitted
        #[arg(long = "type")]
        enrichment_type: Option<String>,
        /// Start enrichment right after creation
        #[arg(long)]
        run: bool,
    },

    /// Recompute the cost and duration estimates of a job
    Estimate { id: String },

    /// Start scraping or enrichment, whichever the job allows
    Run { id: String },

    /// Delete a job and its parts
    Delete { id: String },

    /// Save a bulk export of a job
    Download {
        id: String,
        #[arg(long, value_enum)]
        kind: ExportKind,
        /// Target directory; `downloads.directory` from the config when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportKind {
    Enriched,
    Scraped,
    Images,
}

impl From<ExportKind> for DownloadKind {
    fn from(kind: ExportKind) -> Self {
        match kind {
            ExportKind::Enriched => DownloadKind::EnrichedCsv,
            ExportKind::Scraped => DownloadKind::ScrapedCsv,
            ExportKind::Images => DownloadKind::ImagesZip,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Newest,
    Oldest,
    Name,
    Progress,
}

impl From<SortArg> for BoardSort {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Newest => BoardSort::NewestFirst,
            SortArg::Oldest => BoardSort::OldestFirst,
            SortArg::Name => BoardSort::Name,
            SortArg::Progress => BoardSort::Progress,
        }
    }
}

/// Client-side filter over the fetched page.
#[derive(Debug, Clone, clap::Args)]
pub struct FilterArgs {
    /// scraping or enrichment
    #[arg(long = "type")]
    kind: Option<JobKind>,
    #[arg(long)]
    status: Option<JobStatus>,
    /// Case-insensitive part of the job name
    #[arg(long)]
    name: Option<String>,
    #[arg(long, value_enum, default_value = "newest")]
    sort: SortArg,
}

impl From<FilterArgs> for BoardQuery {
    fn from(args: FilterArgs) -> Self {
        BoardQuery {
            kind: args.kind,
            status: args.status,
            name_contains: args.name,
            sort: args.sort.into(),
        }
    }
}

pub async fn run(ctx: &CommandContext, command: JobsCommand) -> Result<()> {
    match command {
        JobsCommand::List { page, filter } => list(ctx, page, filter.into()).await,
        JobsCommand::Watch { page, filter } => watch(ctx, page, filter.into()).await,
        JobsCommand::Show { id, page } => show(ctx, &id, page).await,
        JobsCommand::Upload {
            name,
            file,
            scraper_type,
            run,
        } => upload(ctx, name, file, scraper_type, run).await,
        JobsCommand::Enrich {
            id,
            enrichment_type,
            run,
        } => enrich(ctx, &id, enrichment_type, run).await,
        JobsCommand::Estimate { id } => {
            let job = ctx.client.estimate_job(&id).await?;
            report_estimate(ctx, &job)
        }
        JobsCommand::Run { id } => run_job(ctx, &id).await,
        JobsCommand::Delete { id } => delete(ctx, &id).await,
        JobsCommand::Download { id, kind, out } => download(ctx, &id, kind.into(), out).await,
    }
}

// ─── Board ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct PageOutput<'a> {
    page: u32,
    has_previous: bool,
    has_next: bool,
    jobs: &'a [BoardRow],
}

async fn list(ctx: &CommandContext, page: u32, query: BoardQuery) -> Result<()> {
    let board = JobBoard::new(ctx.config.paging.jobs_per_page);
    board.set_page(page);

    let records = ctx
        .client
        .list_jobs(board.skip(), board.page_size() as u64)
        .await?;
    board.replace(1, board.page(), records);

    print_page(ctx, &board, &query)
}

async fn watch(ctx: &CommandContext, page: u32, query: BoardQuery) -> Result<()> {
    let board = Arc::new(JobBoard::new(ctx.config.paging.jobs_per_page));
    board.set_page(page);

    let poller = JobPoller::new(
        Arc::clone(&ctx.client),
        Arc::clone(&board),
        ctx.config.poll_interval(),
    );
    let mut events = poller.subscribe();
    let (trigger_tx, trigger_rx) = broadcast::channel::<()>(4);

    let stopper = poller.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        stopper.stop();
        // Wake the loop so it notices the stop right away
        let _ = trigger_tx.send(());
    }) {
        log::warn!("Failed to install Ctrl-C handler: {}", e);
    }

    let mut handle = poller.start(trigger_rx);
    log::info!(
        "Watching page {} every {:?}",
        board.page(),
        ctx.config.poll_interval()
    );

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(BoardEvent::Refreshed { .. }) => print_page(ctx, &board, &query)?,
                Ok(BoardEvent::FetchFailed { message, .. }) => {
                    log::warn!("Refresh failed, showing cached jobs: {}", message);
                }
                Ok(BoardEvent::Discarded { .. }) => {}
                Err(RecvError::Lagged(skipped)) => {
                    log::debug!("Skipped {} board events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut handle => break,
        }
    }

    Ok(())
}

fn print_page(ctx: &CommandContext, board: &JobBoard, query: &BoardQuery) -> Result<()> {
    let rows = board.query(query);
    let output = PageOutput {
        page: board.page(),
        has_previous: board.has_previous(),
        has_next: board.has_next(),
        jobs: &rows,
    };

    ctx.emit(&output, || {
        let mut lines = vec![format!(
            "Page {}{}{}",
            output.page,
            if output.has_previous { "  [previous]" } else { "" },
            if output.has_next { "  [next]" } else { "" }
        )];
        if rows.is_empty() {
            lines.push("  no jobs".to_string());
        }
        for row in &rows {
            lines.push(render_row(row));
        }
        lines.join("\n")
    })
}

fn render_job_line(job: &JobRecord) -> String {
    format!(
        "{:<36}  {:<10}  {:<11}  {:>5.1}%  {}",
        job.id, job.kind, job.status, job.progress, job.name
    )
}

fn render_row(row: &BoardRow) -> String {
    let mut lines = vec![render_job_line(&row.job)];
    if let Some(enrichment) = row.enrichment() {
        lines.push(format!("  enrichment: {}", render_job_line(enrichment)));
    }
    match &row.evaluation {
        Ok(evaluation) => {
            lines.push(format!("  actions: {}", action_list(evaluation)));
            for warning in &evaluation.warnings {
                lines.push(format!("  warning: {}", warning));
            }
        }
        Err(e) => lines.push(format!("  data error: {}", e)),
    }
    lines.join("\n")
}

// ─── Detail ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct DetailOutput<'a> {
    job: &'a JobRecord,
    actions: &'a Evaluation,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<&'a str>,
    total_parts: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    processed_parts: Option<u64>,
    page: usize,
    total_pages: usize,
    /// Empty unless details are viewable.
    parts: &'a [PartRecord],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    integrity_errors: Vec<String>,
}

async fn show(ctx: &CommandContext, job_id: &str, page: usize) -> Result<()> {
    let detail = ctx.client.get_job(job_id).await?;
    let mut view = JobDetailView::new(detail, ctx.config.paging.parts_per_page);
    let page = view.set_page(page);
    let evaluation = logged(view.evaluation())?;

    let details_visible = evaluation.actions.contains(Action::ViewDetails);
    let error_visible = evaluation.actions.contains(Action::ViewError);

    let job = view.job();
    let error_message = if error_visible {
        job.error_message
            .as_deref()
            .or_else(|| view.enrichment().and_then(|e| e.error_message.as_deref()))
    } else {
        None
    };
    let parts: &[PartRecord] = if details_visible {
        view.page_parts()
    } else {
        &[]
    };
    let integrity_errors: Vec<String> = view
        .part_integrity_errors()
        .iter()
        .map(|e| {
            log::warn!("Data integrity: {}", e);
            e.to_string()
        })
        .collect();

    let output = DetailOutput {
        job,
        actions: &evaluation,
        error_message,
        total_parts: view.total_parts(),
        processed_parts: view.processed_parts(),
        page,
        total_pages: view.total_pages(),
        parts,
        integrity_errors,
    };

    ctx.emit(&output, || {
        let mut lines = vec![render_job_line(job)];
        if let Some(enrichment) = view.enrichment() {
            lines.push(format!("enrichment: {}", render_job_line(enrichment)));
        }
        lines.push(format!("actions: {}", action_list(&evaluation)));
        if let Some(message) = error_message {
            lines.push(format!("error: {}", message));
        }
        lines.push(format!(
            "parts: {} total{}",
            output.total_parts,
            output
                .processed_parts
                .map(|n| format!(", {} processed", n))
                .unwrap_or_default()
        ));
        if details_visible {
            lines.push(format!("page {} of {}", output.page, output.total_pages));
            for part in parts {
                lines.push(format!(
                    "  {:<36}  {:<16}  {:<9}  {} image(s){}",
                    part.id,
                    part.code,
                    part.status,
                    part.images.len(),
                    part.verified_by
                        .as_ref()
                        .map(|u| format!("  verified by {}", u.display_name()))
                        .unwrap_or_default()
                ));
            }
        } else {
            lines.push("details become available once scraping and enrichment completed".to_string());
        }
        for error in &output.integrity_errors {
            lines.push(format!("integrity: {}", error));
        }
        lines.join("\n")
    })
}

// ─── Operations ─────────────────────────────────────────────────────────────

/// Evaluates a record, surfacing data warnings in the log.
pub fn evaluate_logged(record: &JobRecord) -> Result<Evaluation> {
    logged(eligibility::evaluate(record))
}

fn logged(evaluation: std::result::Result<Evaluation, partsdesk::UnknownStatus>) -> Result<Evaluation> {
    let evaluation = evaluation?;
    for warning in &evaluation.warnings {
        log::warn!("{}", warning);
    }
    Ok(evaluation)
}

#[derive(Serialize)]
struct EstimateOutput<'a> {
    job_id: &'a str,
    estimated_cost: Option<Decimal>,
    estimated_time: Option<u64>,
    estimated_duration: Option<String>,
}

fn report_estimate(ctx: &CommandContext, job: &JobRecord) -> Result<()> {
    let output = EstimateOutput {
        job_id: &job.id,
        estimated_cost: job.estimated_cost,
        estimated_time: job.estimated_time,
        estimated_duration: job.estimated_time.map(format_estimated_duration),
    };
    ctx.emit(&output, || {
        format!(
            "{} ({})\n  estimated cost: {}\n  estimated time: {}",
            job.name,
            job.id,
            output
                .estimated_cost
                .map(|c| c.round_dp(2).to_string())
                .unwrap_or_else(|| "-".to_string()),
            output.estimated_duration.as_deref().unwrap_or("-")
        )
    })
}

async fn upload(
    ctx: &CommandContext,
    name: String,
    file: PathBuf,
    scraper_type: Option<String>,
    run: bool,
) -> Result<()> {
    let catalog = ctx.client.service_types().await?;
    let mut form = ScrapingUpload::new(name, file);
    if let Some(scraper_type) = scraper_type {
        form = form.with_scraper_type(scraper_type);
    }
    let prepared = form.validate(&catalog)?;

    let created = ctx.client.create_scraping_job(&prepared).await?;
    let estimated = ctx.client.estimate_job(&created.id).await?;
    report_estimate(ctx, &estimated)?;

    if run {
        let evaluation = evaluate_logged(&estimated)?;
        let _guard = ctx.begin(&evaluation, &estimated.id, Action::RunScraping)?;
        ctx.client.run_scraping(&estimated.id).await?;
    }
    Ok(())
}

/// Picks an enrichment service: the requested one if offered, else the first.
fn choose_enrichment_type(
    offered: &[partsdesk::models::ServiceType],
    requested: Option<String>,
) -> std::result::Result<String, ApiError> {
    let invalid = |msg: String| {
        ApiError::Validation(vec![FieldError::for_field(
            "enrichment_type",
            &msg,
            "value_error",
        )])
    };

    match requested.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => {
            if offered.is_empty() || offered.iter().any(|s| s.id == id) {
                Ok(id.to_string())
            } else {
                Err(invalid(format!("Unknown enrichment type '{}'", id)))
            }
        }
        _ => offered
            .first()
            .map(|s| s.id.clone())
            .ok_or_else(|| invalid("No enrichment service is available".to_string())),
    }
}

async fn enrich(
    ctx: &CommandContext,
    job_id: &str,
    enrichment_type: Option<String>,
    run: bool,
) -> Result<()> {
    let detail = ctx.client.get_job(job_id).await?;
    let evaluation = evaluate_logged(&detail.job)?;

    let created = {
        let _guard = ctx.begin(&evaluation, job_id, Action::CreateEnrichment)?;
        let catalog = ctx.client.service_types().await?;
        let enrichment_type = choose_enrichment_type(&catalog.enrichment, enrichment_type)?;
        ctx.client
            .create_enrichment_job(job_id, &enrichment_type)
            .await?
    };

    let estimated = ctx.client.estimate_job(&created.id).await?;
    report_estimate(ctx, &estimated)?;

    if run {
        let evaluation = evaluate_logged(&estimated)?;
        let _guard = ctx.begin(&evaluation, &estimated.id, Action::RunEnrichment)?;
        ctx.client.run_enrichment(&estimated.id).await?;
    }
    Ok(())
}

#[derive(Serialize)]
struct StartedOutput<'a> {
    job_id: &'a str,
    started: &'static str,
}

async fn run_job(ctx: &CommandContext, job_id: &str) -> Result<()> {
    let detail = ctx.client.get_job(job_id).await?;
    let evaluation = evaluate_logged(&detail.job)?;

    if evaluation.actions.contains(Action::RunScraping) {
        let _guard = ctx.begin(&evaluation, job_id, Action::RunScraping)?;
        ctx.client.run_scraping(job_id).await?;
        let output = StartedOutput {
            job_id,
            started: "scraping",
        };
        return ctx.emit(&output, || format!("Scraping started for {}", job_id));
    }

    if evaluation.actions.contains(Action::RunEnrichment) {
        let kind: JobKind = detail.job.kind.parse()?;
        let target = match kind {
            JobKind::Enrichment => job_id.to_string(),
            JobKind::Scraping => detail
                .job
                .enrichment
                .as_deref()
                .map(|e| e.id.clone())
                .ok_or_else(|| {
                    PartsdeskError::ActionUnavailable(format!(
                        "job {} has no enrichment job to run",
                        job_id
                    ))
                })?,
        };
        let _guard = ctx.begin(&evaluation, job_id, Action::RunEnrichment)?;
        ctx.client.run_enrichment(&target).await?;
        let output = StartedOutput {
            job_id: &target,
            started: "enrichment",
        };
        return ctx.emit(&output, || format!("Enrichment started for {}", target));
    }

    Err(PartsdeskError::ActionUnavailable(format!(
        "nothing can be started for job {} ({})",
        job_id, detail.job.status
    )))
}

/// Like [`evaluate_logged`], but a record with an unknown status can still
/// be deleted.
fn evaluate_for_delete(record: &JobRecord) -> Result<Evaluation> {
    match evaluate_logged(record) {
        Err(PartsdeskError::UnknownStatus(e)) => {
            log::warn!("Data integrity: {}; only deletion is offered", e);
            Ok(eligibility::integrity_fallback())
        }
        other => other,
    }
}

async fn delete(ctx: &CommandContext, job_id: &str) -> Result<()> {
    let detail = ctx.client.get_job(job_id).await?;
    let evaluation = evaluate_for_delete(&detail.job)?;
    let _guard = ctx.begin(&evaluation, job_id, Action::Delete)?;

    let message = ctx.client.delete_job(job_id).await?;
    ctx.emit(&message, || message.message.clone())
}

#[derive(Serialize)]
struct SavedOutput {
    path: PathBuf,
    bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
}

async fn download(
    ctx: &CommandContext,
    job_id: &str,
    kind: DownloadKind,
    out: Option<PathBuf>,
) -> Result<()> {
    let dir = out.unwrap_or_else(|| ctx.config.downloads_dir());
    let export = ctx.client.download(job_id, kind).await?;
    let path = export.save_into(&dir)?;

    let output = SavedOutput {
        path,
        bytes: export.bytes.len(),
        content_type: export.content_type.clone(),
    };
    ctx.emit(&output, || {
        format!("Saved {} ({} bytes)", output.path.display(), output.bytes)
    })
}
