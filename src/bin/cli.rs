//! Catalog Harvester CLI
//!
//! Local entry point: harvest a single source or sweep stale files.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use harvester::{
    config::Config,
    error::Result,
    models::{HarvestJob, HarvestType},
    notify::{CkanClient, LogNotifier, NotificationThrottle},
    pipeline::{self, HarvestContext},
    storage::{CatalogStore, MemoryStore},
    utils::{Interrupt, http::HttpFetcher},
};

/// Catalog Harvester - WAF and CSW metadata harvesting
#[derive(Parser, Debug)]
#[command(name = "harvester", version, about = "Harvests WAF and CSW metadata catalogs")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, default_value = "harvester.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Harvest a single source into a destination folder
    Harvest {
        /// Source WAF root or CSW endpoint URL
        #[arg(short, long)]
        src: String,

        /// Destination folder for downloaded documents
        #[arg(short, long)]
        dest: PathBuf,

        /// Harvest type: WAF, ERDDAP-WAF or CSW
        #[arg(short = 't', long, default_value = "WAF")]
        harvest_type: String,

        /// Organization the source belongs to (also the subdirectory
        /// documents are stored under)
        #[arg(short, long, default_value = "default")]
        organization: String,
    },

    /// Remove stale .xml files from a destination folder
    Clean {
        /// Folder to sweep
        #[arg(short, long)]
        dest: PathBuf,

        /// Retention in days (overrides config and the
        /// CLEAN_RETENTION_DAYS environment variable)
        #[arg(long)]
        max_days: Option<u64>,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    config.validate()?;

    match cli.command {
        Command::Harvest {
            src,
            dest,
            harvest_type,
            organization,
        } => {
            let harvest_type: HarvestType = harvest_type.parse()?;

            let store = MemoryStore::new();
            let job = HarvestJob::new("cli", &organization, &src, harvest_type, &organization);
            store.upsert_harvest(&job).await?;

            let fetcher = HttpFetcher::new(&config.http)?;
            let notifier = LogNotifier::from_config(&config.notify);
            let throttle = NotificationThrottle::from_config(&config.notify);
            let ckan = CkanClient::from_config(&config.registry, &config.http)?;

            let interrupt = Interrupt::new();
            let ctrl_c = interrupt.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::warn!("Interrupt received, stopping harvest...");
                    ctrl_c.trigger();
                }
            });

            let ctx = HarvestContext {
                config: &config,
                store: &store,
                fetcher: &fetcher,
                notifier: &notifier,
                throttle: &throttle,
                ckan: ckan.as_ref(),
                dest,
                interrupt,
            };
            pipeline::run_harvest(&ctx, &job).await?;

            if let Some(finished) = store.find_harvest(&job.id).await? {
                log::info!(
                    "Harvest {:?}: {} records ({} good, {} bad)",
                    finished.last_status,
                    finished.last_record_count,
                    finished.last_good_count,
                    finished.last_bad_count
                );
            }
        }

        Command::Clean { dest, max_days } => {
            let retention = max_days
                .or_else(|| {
                    std::env::var("CLEAN_RETENTION_DAYS")
                        .ok()
                        .and_then(|v| v.parse().ok())
                })
                .unwrap_or(config.clean.retention_days);

            log::info!(
                "Sweeping {} for .xml files older than {} days",
                dest.display(),
                retention
            );
            let removed = pipeline::force_clean(&dest, retention)?;
            log::info!("Removed {} stale files", removed);
        }
    }

    log::info!("Done!");

    Ok(())
}
