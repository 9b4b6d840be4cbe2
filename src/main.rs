//! aatp - weekly GitHub activity reports and project triage
//!
//! `aatp report` collects the issues and pull requests a user was involved
//! in during an ISO week and writes them as a report. `aatp triage` adds
//! newly opened or assigned items involving the user to a GitHub project.
//!
//! Exit codes:
//!   0 - Success (failed project additions are reported as warnings)
//!   1 - Runtime error (configuration, API, file output)

mod analysis;
mod cli;
mod collector;
mod config;
mod github;
mod models;
mod report;
mod triage;

use anyhow::{Context, Result};
use chrono::{Datelike, Local, Utc};
use cli::{Args, Command, ReportArgs, TriageArgs};
use config::Config;
use github::{GitHubClient, Platform};
use models::TimeWindow;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("aatp v{}", env!("CARGO_PKG_VERSION"));
    debug!(
        "User: {:?}, config: {:?}, command: {:?}",
        args.user, args.config, args.command
    );

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .aatp.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", config::CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE);
    println!("   Set github.user and triage.project_number, or use AATP_USER and AATP_PROJECT_NUMBER.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Resolve configuration and dispatch the subcommand.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args)?;

    let token = args
        .token
        .as_deref()
        .context("No GitHub token: set AATP_TOKEN or pass --token")?;
    let client = GitHubClient::new(config.client_config(token)?)
        .context("Failed to create GitHub client")?;

    match args.command {
        Some(Command::Report(ref report_args)) => {
            run_report(&client, &config, report_args, !args.quiet).await
        }
        Some(Command::Triage(ref triage_args)) => {
            run_triage(&client, &config, triage_args, !args.quiet).await
        }
        None => Ok(()),
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default()? {
        Some(config) => {
            info!("Loaded default config from {}", config::CONFIG_FILE);
            Ok(config)
        }
        None => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

/// The requested ISO week, or the current one.
fn report_window(report_args: &ReportArgs) -> Result<TimeWindow> {
    let today = Local::now().date_naive();
    match (report_args.year, report_args.week) {
        (year, Some(week)) => {
            let year = year.unwrap_or_else(|| today.iso_week().year());
            TimeWindow::iso_week(year, week)
                .with_context(|| format!("{} has no ISO week {}", year, week))
        }
        _ => Ok(TimeWindow::containing(today)),
    }
}

/// Collect, aggregate, render and write the weekly report.
async fn run_report<P: Platform>(
    platform: &P,
    config: &Config,
    report_args: &ReportArgs,
    show_progress: bool,
) -> Result<()> {
    let user = config.user()?;
    let window = report_window(report_args)?;
    let format = config.report.format;
    let ordering = config.report.effective_ordering();

    info!(
        "Collecting activity of {} for {}-W{} ({})",
        user,
        window.year,
        window.week,
        window.date_range()
    );

    let progress = collector::spinner(show_progress);
    let collected = collector::collect_activity(platform, user, &window, &progress).await;
    progress.finish_and_clear();
    let records = collected?;

    let grouped = analysis::aggregate(records, ordering);
    info!(
        "{} records in {} repositories",
        analysis::record_count(&grouped),
        grouped.len()
    );

    let content = report::render(format, &window, &grouped)?;
    if report_args.print {
        println!("{}", content);
    }

    let path = report::write_report(&config.report.output_dir, &window, format, &content)?;
    println!("✅ Report saved to: {}", path.display());

    Ok(())
}

/// Collect events received since Monday 00:00 UTC of the current week and
/// file the ones involving the user.
async fn run_triage<P: Platform>(
    platform: &P,
    config: &Config,
    triage_args: &TriageArgs,
    show_progress: bool,
) -> Result<()> {
    let user = config.user()?;
    let number = config.project_number()?;

    let project_id = platform
        .project_id(user, number)
        .await
        .with_context(|| format!("Failed to resolve project #{} of {}", number, user))?;
    debug!("Project #{} resolved to {}", number, project_id);

    // Event timestamps are UTC, so the week boundary is taken in UTC too.
    let window = TimeWindow::containing(Utc::now().date_naive());
    let progress = collector::spinner(show_progress);
    let collected =
        collector::collect_events(platform, user, window.start_instant(), &progress).await;
    progress.finish_and_clear();
    let events = collected?;

    let mutator = triage::ProjectMutator::new(platform, project_id, triage_args.dry_run);
    let summary = mutator.run(&events, user).await;

    println!("\n📋 Triage Summary:");
    println!("   Events inspected: {}", summary.events_seen);
    println!("   Matching events: {}", summary.matched);
    if triage_args.dry_run {
        println!("   Would add: {}", summary.filed.len());
    } else {
        println!("   Added to project: {}", summary.filed.len());
    }

    if !summary.is_clean() {
        warn!("{} item(s) could not be added", summary.warnings.len());
        for warning in &summary.warnings {
            println!("   ⚠️  {}: {}", warning.url, warning.message);
        }
    }

    Ok(())
}
