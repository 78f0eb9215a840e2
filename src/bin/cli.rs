//! Snapshill CLI
//!
//! Runs the bot locally, a single cycle, or offline checks.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use snapshill::{
    error::Result,
    models::{ArchiveConfig, Config},
    pipeline::{self, Runner},
    services::ProviderRegistry,
    utils::url::{normalize, should_skip},
};

/// Snapshill - archives links posted to reddit
#[derive(Parser, Debug)]
#[command(name = "snapshill", version, about = "Link archiving bot")]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "snapshill.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the feed until interrupted
    Run,

    /// Run a single cycle and exit
    Once,

    /// Validate configuration
    Validate,

    /// Show how a URL would be handled, without archiving it
    Inspect {
        url: String,
    },
}

/// Initialize logging. Without `RUST_LOG`, output starts at info and the
/// crate's own debug lines can be enabled later with [`apply_level`].
fn init_logging() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("snapshill=debug,info"),
    )
    .format_timestamp_secs()
    .init();
    apply_level("info");
}

/// Set the configured level unless `RUST_LOG` took over.
fn apply_level(level: &str) {
    if std::env::var_os("RUST_LOG").is_some() {
        return;
    }
    match level.parse::<log::LevelFilter>() {
        Ok(filter) => log::set_max_level(filter),
        Err(_) => log::warn!("Unknown log level {:?}, keeping info", level),
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = Config::load_or_default(&cli.config).with_env();
    apply_level(if cli.verbose {
        "debug"
    } else {
        &config.logging.level
    });
    log::debug!("Configuration from {}", cli.config.display());

    match cli.command {
        Command::Run => {
            config.validate()?;
            let bot = pipeline::connect(&config).await?;
            log::info!("Starting poll loop");
            Runner::new(bot, &config.bot).run().await?;
        }

        Command::Once => {
            config.validate()?;
            let mut bot = pipeline::connect(&config).await?;
            bot.refresh().await;
            let report = bot.run_cycle().await?;
            log::info!("Cycle done: {}", report);
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }

        Command::Inspect { url } => inspect(&url, &config.archive),
    }

    Ok(())
}

fn inspect(url: &str, archive: &ArchiveConfig) {
    let normalized = normalize(url);
    log::info!("Normalized: {}", normalized);

    if should_skip(&normalized) {
        log::info!("Skipped: bare community or user link");
        return;
    }

    let registry = ProviderRegistry::standard(reqwest::Client::new(), archive);
    for (i, provider) in registry.select(&normalized).iter().enumerate() {
        log::info!(
            "{}. {} (resubmit: {})",
            i + 1,
            provider.name(),
            provider.resubmit_link(&normalized)
        );
    }
}
