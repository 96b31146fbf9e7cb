use clap::{Parser, Subcommand};
use scraper_registry::{
    config::{self, RegistryConfig},
    HttpFetcher, Registry,
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Directory holding modules.json and cached scripts
    #[arg(
        short = 'd',
        long,
        env = "SCRAPER_REGISTRY_STORAGE_DIR",
        global = true
    )]
    storage_dir: Option<PathBuf>,

    /// HTTP request timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a module's metadata and script and register it
    Add {
        /// URL of the module's metadata document
        metadata_url: String,
    },

    /// Remove a module and its cached script
    Delete {
        /// Module ID
        id: Uuid,
    },

    /// List registered modules
    List,

    /// Print a module's cached script
    Content {
        /// Module ID
        id: Uuid,
    },

    /// Check every module for a new version and download updated scripts
    Refresh,
}

fn load_config(cli: &Cli) -> Result<RegistryConfig, config::ConfigError> {
    let mut config: RegistryConfig = if cli.config.exists() {
        config::from_file(&cli.config)?
    } else {
        RegistryConfig::default()
    };

    if let Some(dir) = &cli.storage_dir {
        config.storage_dir = dir.clone();
    }
    if let Some(ms) = cli.timeout_ms {
        config.request_timeout = Duration::from_millis(ms);
    }
    Ok(config)
}

fn output_json<T: serde::Serialize>(data: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

async fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(cli)?;
    debug!("config: {:?}", config);

    if config.create_storage_dir {
        tokio::fs::create_dir_all(&config.storage_dir).await?;
    }

    let fetcher = HttpFetcher::try_from_config(&config)?;
    let registry = Registry::new(&config.storage_dir, Arc::new(fetcher)).await;
    let storage_dir = config.storage_dir.as_path();

    match &cli.command {
        Commands::Add { metadata_url } => {
            let record = registry.add(metadata_url, storage_dir).await?;
            output_json(&record)?;
        }
        Commands::Delete { id } => {
            registry.delete(*id, storage_dir).await?;
            println!("Module {} deleted successfully", id);
        }
        Commands::List => {
            output_json(&registry.list().await)?;
        }
        Commands::Content { id } => {
            let content = registry.get_content(*id, storage_dir).await?;
            print!("{}", content);
        }
        Commands::Refresh => {
            let report = registry.refresh(storage_dir).await;
            info!(
                updated = report.updated(),
                unchanged = report.unchanged(),
                failed = report.failed(),
                "Refresh completed"
            );
            output_json(&report)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
