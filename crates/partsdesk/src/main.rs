//! `partsdesk` console.
//!
//! ```bash
//! partsdesk jobs list --page 2 --status in_progress
//! partsdesk jobs upload --name "March catalog" --file parts.csv --run
//! partsdesk parts verify <part-id> --job <job-id> --set price=12.5
//! partsdesk dashboard --range quarter --format json
//! ```

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::dashboard::DashboardArgs;
use commands::jobs::JobsCommand;
use commands::parts::{ImagesCommand, PartsCommand};
use commands::{CommandContext, OutputFormat};
use partsdesk::config::{load_config_or_default, API_URL_ENV_VAR};
use partsdesk::logging::{self, LogFormat};
use partsdesk::{PartsdeskError, Result};

#[derive(Parser)]
#[command(name = "partsdesk")]
#[command(version)]
#[command(about = "Console for the parts scraping and enrichment service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file; ~/.partsdesk/config.json when omitted
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Service URL, overriding the config file
    #[arg(long, global = true, env = API_URL_ENV_VAR)]
    api_url: Option<String>,

    /// Output format of command results
    #[arg(long, short = 'o', global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Debug logging for this crate
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scraping and enrichment jobs
    #[command(subcommand)]
    Jobs(JobsCommand),

    /// Part review and verification
    #[command(subcommand)]
    Parts(PartsCommand),

    /// Part images
    #[command(subcommand)]
    Images(ImagesCommand),

    /// Aggregated statistics over a date range
    Dashboard(DashboardArgs),

    /// Scraping and enrichment services offered by the backend
    ServiceTypes {
        /// Bypass the cached catalog
        #[arg(long)]
        refresh: bool,
    },

    /// The account the configured token belongs to
    Whoami,
}

fn build_context(cli: &Cli) -> Result<CommandContext> {
    let mut config = load_config_or_default(cli.config.as_deref())?;
    if let Some(url) = cli.api_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        config.api.base_url = url.to_string();
    }
    let client = config.api_client()?;
    log::debug!("Using {:?}", client);
    Ok(CommandContext::new(config, client, cli.format))
}

async fn dispatch(ctx: &CommandContext, command: Commands) -> Result<()> {
    match command {
        Commands::Jobs(command) => commands::jobs::run(ctx, command).await,
        Commands::Parts(command) => commands::parts::run(ctx, command).await,
        Commands::Images(command) => commands::parts::run_images(ctx, command).await,
        Commands::Dashboard(args) => commands::dashboard::dashboard(ctx, args).await,
        Commands::ServiceTypes { refresh } => {
            commands::dashboard::service_types(ctx, refresh).await
        }
        Commands::Whoami => commands::dashboard::whoami(ctx).await,
    }
}

fn report(format: OutputFormat, error: &PartsdeskError) {
    match format {
        OutputFormat::Json => {
            let body = match error {
                PartsdeskError::Api(api) if !api.field_errors().is_empty() => serde_json::json!({
                    "error": error.to_string(),
                    "fields": api
                        .field_errors()
                        .iter()
                        .map(|f| serde_json::json!({"field": f.field(), "message": f.to_string()}))
                        .collect::<Vec<_>>(),
                }),
                _ => serde_json::json!({ "error": error.to_string() }),
            };
            println!("{}", body);
        }
        OutputFormat::Text => eprintln!("error: {}", error),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_format = match cli.format {
        OutputFormat::Json => LogFormat::Json,
        OutputFormat::Text => LogFormat::Text,
    };
    logging::init(cli.verbose, log_format);

    let format = cli.format;
    let result = match build_context(&cli) {
        Ok(ctx) => dispatch(&ctx, cli.command).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::debug!("Command failed: {:?}", e);
            report(format, &e);
            ExitCode::FAILURE
        }
    }
}
