use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use civicsync::commands::{init_db, sync};
use civicsync::config::Config;

#[derive(Parser)]
#[command(
    name = "civicsync",
    version,
    about = "Taipei civic-disruption feed synchronizer (water, road, power)",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); environment variables are used when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the config file's logging.format
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the event store schema
    InitDb,

    /// Fetch, normalize, and reconcile feeds against the event store
    Sync {
        /// Only sync one source (water, road, power); all three when absent
        #[arg(short, long)]
        source: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let format = cli.log_format.as_deref().unwrap_or(&config.logging.format);
    setup_tracing(format, cli.verbose, &config.logging.level)?;
    tracing::info!("civicsync starting");

    match cli.command {
        Commands::InitDb => init_db(&config),
        Commands::Sync { source } => sync(config, source).await,
    }
}

fn setup_tracing(format: &str, verbose: bool, level: &str) -> Result<()> {
    let default_level = if verbose { "debug" } else { level };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
    Ok(())
}
