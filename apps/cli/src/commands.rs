//! CLI command definitions, routing, and tracing setup.

use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use whatson_ingest::{Ingestor, RunReport};
use whatson_shared::{AppConfig, EventStatus, IngestOptions, init_config, load_config};
use whatson_sources::SourceRegistry;
use whatson_storage::{Catalog, EventFilter};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Whatson — aggregate city events into a local catalog.
#[derive(Parser)]
#[command(
    name = "whatson",
    version,
    about = "Scrape event listings into a local catalog with reconciliation and moderation.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run one ingestion cycle: fetch all sources, reconcile, sweep.
    Run {
        /// Use the deterministic fixture source instead of live sources.
        #[arg(long)]
        fixture: bool,
    },

    /// Run ingestion on a fixed interval until interrupted.
    Schedule {
        /// Hours between runs (overrides config).
        #[arg(long)]
        every: Option<u64>,

        /// Use the deterministic fixture source instead of live sources.
        #[arg(long)]
        fixture: bool,
    },

    /// List catalog events (public view by default).
    List {
        /// City to list (defaults to configured city).
        #[arg(short, long)]
        city: Option<String>,

        /// Keyword to match against title, description, and venue.
        #[arg(short, long)]
        keyword: Option<String>,

        /// Filter by status: new, updated, inactive, or imported.
        #[arg(short, long)]
        status: Option<String>,

        /// Moderation view: include inactive and past events.
        #[arg(long)]
        all: bool,

        /// Maximum number of events to show.
        #[arg(long)]
        limit: Option<u32>,

        /// Number of events to skip (paging).
        #[arg(long, default_value = "0")]
        skip: u32,
    },

    /// Show one event in full, including ticket requests.
    Show {
        /// Event ID.
        id: String,
    },

    /// Mark an event as imported (terminal for ingestion).
    Import {
        /// Event ID.
        id: String,

        /// Who is importing.
        #[arg(long, default_value = "cli")]
        by: String,

        /// Free-form note stored with the import.
        #[arg(long)]
        notes: Option<String>,
    },

    /// Record ticket interest for an event; prints the redirect URL.
    TicketRequest {
        /// Event ID.
        id: String,

        /// Requester email.
        #[arg(long)]
        email: String,

        /// Marketing consent.
        #[arg(long)]
        consent: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "whatson=info",
        1 => "whatson=debug",
        _ => "whatson=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run { fixture } => cmd_run(fixture).await,
        Command::Schedule { every, fixture } => cmd_schedule(every, fixture).await,
        Command::List {
            city,
            keyword,
            status,
            all,
            limit,
            skip,
        } => cmd_list(city, keyword, status, all, limit, skip).await,
        Command::Show { id } => cmd_show(&id).await,
        Command::Import { id, by, notes } => cmd_import(&id, &by, notes.as_deref()).await,
        Command::TicketRequest { id, email, consent } => {
            cmd_ticket_request(&id, &email, consent).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Shared setup
// ---------------------------------------------------------------------------

async fn open_catalog(config: &AppConfig) -> Result<Arc<Catalog>> {
    let path = config.db_path()?;
    Ok(Arc::new(Catalog::open(&path).await?))
}

fn build_ingestor(config: &AppConfig, catalog: Arc<Catalog>, fixture: bool) -> Result<Ingestor> {
    let mut sources = config.sources.clone();
    if fixture {
        sources.use_fixture = true;
    }
    let registry = SourceRegistry::from_config(&sources)?;
    if registry.is_empty() {
        return Err(eyre!("no source adapters enabled"));
    }
    Ok(Ingestor::new(
        catalog,
        registry,
        IngestOptions::from(config),
    )?)
}

fn print_report(report: &RunReport) {
    println!();
    println!("  Ingestion run complete");
    for source in &report.sources {
        match &source.error {
            Some(error) => println!("  {:<16} failed: {error}", source.source),
            None => println!("  {:<16} {} events", source.source, source.fetched),
        }
    }
    println!("  Inserted:  {}", report.inserted);
    println!("  Updated:   {}", report.updated);
    println!("  Unchanged: {}", report.unchanged);
    if report.skipped > 0 {
        println!("  Skipped:   {}", report.skipped);
    }
    if report.failed > 0 {
        println!("  Failed:    {}", report.failed);
    }
    println!(
        "  Retired:   {} past, {} stale",
        report.sweep.retired_past, report.sweep.retired_stale
    );
    println!(
        "  Time:      {:.1}s",
        (report.finished_at - report.started_at).num_milliseconds() as f64 / 1000.0
    );
    println!();
}

fn run_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner.set_message("Ingesting events...");
    spinner
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(fixture: bool) -> Result<()> {
    let config = load_config()?;
    let catalog = open_catalog(&config).await?;
    let ingestor = build_ingestor(&config, catalog, fixture)?;

    let spinner = run_spinner();
    let report = ingestor.run().await?;
    spinner.finish_and_clear();

    print_report(&report);
    Ok(())
}

async fn cmd_schedule(every: Option<u64>, fixture: bool) -> Result<()> {
    let config = load_config()?;
    let catalog = open_catalog(&config).await?;
    let ingestor = build_ingestor(&config, catalog, fixture)?;

    let interval_hours = every.unwrap_or(config.scheduler.interval_hours);
    if interval_hours == 0 {
        return Err(eyre!("interval must be at least one hour"));
    }
    info!(interval_hours, "scheduler started, ctrl-c to stop");

    let mut ticker =
        tokio::time::interval(std::time::Duration::from_secs(interval_hours * 60 * 60));
    // First tick fires immediately: run at start, then every interval
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match ingestor.run().await {
                    Ok(report) => print_report(&report),
                    Err(e) => tracing::error!(error = %e, "scheduled run failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("scheduler stopped");
                return Ok(());
            }
        }
    }
}

async fn cmd_list(
    city: Option<String>,
    keyword: Option<String>,
    status: Option<String>,
    all: bool,
    limit: Option<u32>,
    skip: u32,
) -> Result<()> {
    let config = load_config()?;
    let catalog = open_catalog(&config).await?;

    let city = city.unwrap_or_else(|| config.defaults.default_city.clone());
    let mut filter = if all {
        EventFilter::dashboard(city)
    } else {
        EventFilter::public(city, Utc::now())
    };
    filter.keyword = keyword;
    filter.status = status.as_deref().map(str::parse::<EventStatus>).transpose()?;
    if let Some(limit) = limit {
        filter.limit = limit;
    }
    filter.skip = skip;

    let total = catalog.count_events(&filter).await?;
    let events = catalog.list_events(&filter).await?;

    if events.is_empty() {
        println!("No events found.");
        return Ok(());
    }

    for event in &events {
        let venue = event.venue_name.as_deref().unwrap_or("venue TBA");
        println!(
            "{}  {:<10} {:<9} {}  @ {}",
            event.id,
            event.date.format("%Y-%m-%d"),
            event.status,
            event.title,
            venue,
        );
    }
    println!();
    println!("{} of {total} event(s)", events.len());
    Ok(())
}

async fn cmd_show(id: &str) -> Result<()> {
    let config = load_config()?;
    let catalog = open_catalog(&config).await?;

    let event = catalog
        .get_event(id)
        .await?
        .ok_or_else(|| eyre!("no event with id '{id}'"))?;

    println!("{}", serde_json::to_string_pretty(&event)?);

    let requests = catalog.list_ticket_requests(id).await?;
    if !requests.is_empty() {
        println!();
        println!("Ticket requests:");
        for request in &requests {
            println!(
                "  {}  {}  consent={}",
                request.requested_at.format("%Y-%m-%d %H:%M"),
                request.email,
                request.consent
            );
        }
    }
    Ok(())
}

async fn cmd_import(id: &str, by: &str, notes: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let catalog = open_catalog(&config).await?;

    let event = catalog.import_event(id, by, notes, Utc::now()).await?;
    info!(id, by, "event imported");
    println!("Imported '{}' ({})", event.title, event.id);
    Ok(())
}

async fn cmd_ticket_request(id: &str, email: &str, consent: bool) -> Result<()> {
    let config = load_config()?;
    let catalog = open_catalog(&config).await?;

    let redirect = catalog
        .add_ticket_request(id, email, consent, Utc::now())
        .await?;
    println!("Recorded. Tickets at: {redirect}");
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
