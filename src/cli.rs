use crate::absence::{AbsenceQuery, GridLayout, ReportPeriod};
use crate::browser::WebDriverSession;
use crate::config::{AppConfig, PortalConfig};
use crate::error::AppError;
use crate::pipeline::{classify_file, Crawl, PipelineError};
use crate::portal::export::DEFAULT_CANONICAL_NAME;
use crate::server;
use crate::telemetry;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "timeoff-crawler",
    about = "Export the portal's time-off report and classify absences per employee",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in, export the report and print the classification (default command)
    Crawl(CrawlArgs),
    /// Classify an export that is already on disk
    Classify(ExportArgs),
    /// Look up one employee in an export that is already on disk
    Search(SearchArgs),
    /// Serve lookups over HTTP for an export that is already on disk
    Serve(ServeArgs),
}

#[derive(Args, Debug, Default)]
struct CrawlArgs {
    /// Month the report covers (YYYY-MM); defaults to the current month
    #[arg(long, value_parser = parse_period)]
    period: Option<ReportPeriod>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Export to read; defaults to ppf_data.xlsx in the download directory
    #[arg(long)]
    file: Option<PathBuf>,
    /// Month the report covers (YYYY-MM); defaults to the current month
    #[arg(long, value_parser = parse_period)]
    period: Option<ReportPeriod>,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Full name exactly as exported, e.g. "Jane Doe"
    #[arg(long)]
    name: String,
    #[command(flatten)]
    export: ExportArgs,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
    #[command(flatten)]
    export: ExportArgs,
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Crawl(CrawlArgs::default()));

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match command {
        Command::Crawl(args) => run_crawl(&config, args),
        Command::Classify(args) => {
            let query = load_export(&config, args)?;
            print_json(query.all())
        }
        Command::Search(args) => {
            let query = load_export(&config, args.export)?;
            print_json(&query.search(&args.name)?)
        }
        Command::Serve(mut args) => {
            let mut config = config;
            if let Some(host) = args.host.take() {
                config.server.host = host;
            }
            if let Some(port) = args.port.take() {
                config.server.port = port;
            }
            let query = load_export(&config, args.export)?;
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::run(config, query))
        }
    }
}

fn run_crawl(config: &AppConfig, args: CrawlArgs) -> Result<(), AppError> {
    let portal = PortalConfig::load()?;
    let period = resolve_period(args.period);
    let crawl = Crawl::new(&portal, config.webdriver.download_dir.clone(), period);

    let session = WebDriverSession::launch(&config.webdriver).map_err(PipelineError::Launch)?;
    let outcome = crawl.run(session)?;

    let skipped = outcome.login.faults.len() + outcome.export.faults.len();
    if skipped > 0 {
        warn!(skipped, "crawl finished with skipped interactions");
    }
    info!(
        path = %outcome.export.path.display(),
        employees = outcome.result.len(),
        "crawl finished"
    );
    print_json(&outcome.result)
}

fn load_export(config: &AppConfig, args: ExportArgs) -> Result<AbsenceQuery, AppError> {
    let path = args
        .file
        .unwrap_or_else(|| config.webdriver.download_dir.join(DEFAULT_CANONICAL_NAME));
    let period = resolve_period(args.period);
    let result = classify_file(&path, &GridLayout::default(), period)?;
    Ok(AbsenceQuery::new(result))
}

fn resolve_period(requested: Option<ReportPeriod>) -> ReportPeriod {
    requested.unwrap_or_else(|| {
        let period = ReportPeriod::current();
        info!(%period, "no --period given, assuming the export covers the current month");
        period
    })
}

fn parse_period(raw: &str) -> Result<ReportPeriod, String> {
    raw.parse()
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
