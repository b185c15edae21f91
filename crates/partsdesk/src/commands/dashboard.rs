//! Dashboard, service catalog and account commands.

use chrono::{Local, NaiveDate};
use serde::Serialize;

use partsdesk::dashboard::format_hours;
use partsdesk::models::{DashboardData, ServiceType, ServiceTypes};
use partsdesk::{DashboardFilters, DateRangePreset, JobKind, JobStatus, Result};

use super::CommandContext;

#[derive(Debug, Clone, clap::Args)]
pub struct DashboardArgs {
    /// week, month, quarter, year or custom
    #[arg(long, default_value = "month")]
    range: DateRangePreset,
    /// Start of a custom range (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,
    /// End of a custom range (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,
    #[arg(long = "type")]
    kind: Option<JobKind>,
    #[arg(long)]
    status: Option<JobStatus>,
    #[arg(long, default_value_t = 1)]
    page: u32,
}

impl DashboardArgs {
    fn filters(&self, page_size: u32) -> DashboardFilters {
        let mut filters = DashboardFilters::new(page_size);
        filters.set_job_type(self.kind);
        filters.set_status(self.status);
        match (self.from, self.to) {
            // Explicit dates win over the preset
            (Some(from), Some(to)) => filters.set_custom_range(from, to),
            _ => filters.set_range(self.range),
        }
        filters.set_page(self.page);
        filters
    }
}

pub async fn dashboard(ctx: &CommandContext, args: DashboardArgs) -> Result<()> {
    let filters = args.filters(ctx.config.paging.dashboard_page_size);
    let query = filters.to_query(Local::now().date_naive())?;
    let data = ctx.client.get_dashboard(&query).await?;

    // Foreign distribution keys are a data error, not something to show
    let kinds = data.job_type_counts()?;
    let statuses = data.status_counts()?;

    ctx.emit(&data, || {
        let mut lines = vec![
            format!(
                "{} to {}  (page {} of {})",
                query.date_from,
                query.date_to,
                filters.page(),
                data.total_pages.max(1)
            ),
            format!("jobs: {}", data.total_jobs),
            format!("average cost: {}", data.average_cost.round_dp(2)),
            format!("average time: {}", format_hours(data.average_time)),
        ];
        lines.push(format!(
            "by type: {}",
            kinds
                .iter()
                .map(|(k, n)| format!("{} {}", k.label(), n))
                .collect::<Vec<_>>()
                .join(", ")
        ));
        lines.push(format!(
            "by status: {}",
            statuses
                .iter()
                .map(|(s, n)| format!("{} {}", s.label(), n))
                .collect::<Vec<_>>()
                .join(", ")
        ));
        lines.push(render_part_statistics(&data));
        for job in &data.jobs {
            lines.push(format!(
                "  {:<36}  {:<10}  {:<11}  {}",
                job.id, job.kind, job.status, job.name
            ));
        }
        lines.join("\n")
    })
}

fn render_part_statistics(data: &DashboardData) -> String {
    let stats = &data.part_statistics;
    format!(
        "parts: {} total, {} enriched, {} verified, {} not found ({:.1}% enriched)",
        stats.total_parts,
        stats.parts_enriched,
        stats.parts_verified,
        stats.parts_not_found,
        stats.enrichment_success_rate
    )
}

fn render_services(title: &str, services: &[ServiceType]) -> String {
    let mut lines = vec![format!("{}:", title)];
    if services.is_empty() {
        lines.push("  none".to_string());
    }
    for service in services {
        lines.push(format!("  {:<20}  {}", service.id, service.name));
    }
    lines.join("\n")
}

pub async fn service_types(ctx: &CommandContext, refresh: bool) -> Result<()> {
    let catalog: ServiceTypes = if refresh {
        ctx.client.refresh_service_types().await?
    } else {
        ctx.client.service_types().await?
    };
    ctx.emit(&catalog, || {
        format!(
            "{}\n{}",
            render_services("scraping", &catalog.scraping),
            render_services("enrichment", &catalog.enrichment)
        )
    })
}

#[derive(Serialize)]
struct WhoAmI<'a> {
    base_url: &'a str,
    #[serde(flatten)]
    user: &'a partsdesk::models::UserPublic,
}

pub async fn whoami(ctx: &CommandContext) -> Result<()> {
    let user = ctx.client.current_user().await?;
    let output = WhoAmI {
        base_url: ctx.client.base_url(),
        user: &user,
    };
    ctx.emit(&output, || {
        format!(
            "{} <{}> on {}",
            user.full_name.as_deref().unwrap_or("-"),
            user.email,
            output.base_url
        )
    })
}
