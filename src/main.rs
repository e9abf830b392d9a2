// src/main.rs

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, Result, WrapErr};
use tracing::info;

use panda_rs_scanner::config::{ProviderMode, Settings, DEFAULT_CONFIG_FILE};
use panda_rs_scanner::core::report::store::ReportStore;
use panda_rs_scanner::logging;
use panda_rs_scanner::storage::Database;
use panda_rs_scanner::{web, Scanner};

#[derive(Parser)]
#[command(name = "panda-rs-scanner", about = "Web security header scanner with PDF reports", version)]
struct Cli {
    /// Config file path
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to listen on (overrides config)
        #[arg(long, short = 'b')]
        bind: Option<String>,
    },

    /// Scan one URL and print the result as JSON
    Scan {
        url: String,

        /// Skip writing the PDF report
        #[arg(long)]
        no_report: bool,

        /// Provider set for the non-header sections (stub, live)
        #[arg(long)]
        providers: Option<ProviderMode>,
    },

    /// Write a starter config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => cmd_init(cli.config, force),
        Commands::Serve { bind } => {
            let mut settings = start(cli.config)?;
            if let Some(bind) = bind {
                settings.bind = bind;
            }
            web::serve(&settings).await.wrap_err("server failed")?;
            Ok(())
        }
        Commands::Scan { url, no_report, providers } => {
            let mut settings = start(cli.config)?;
            if let Some(mode) = providers {
                settings.providers = mode;
            }
            cmd_scan(&settings, &url, no_report).await
        }
    }
}

/// Starts logging and loads settings for the commands that need them.
fn start(config: Option<PathBuf>) -> Result<Settings> {
    let log_path = logging::initialize_logging()?;
    info!(log = %log_path.display(), "Logging initialized.");
    Settings::load(config.as_deref()).wrap_err("failed to load configuration")
}

async fn cmd_scan(settings: &Settings, url: &str, no_report: bool) -> Result<()> {
    let scanner = Scanner::new(settings)?;
    let result = scanner.run_scan(url).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if !no_report {
        let store = ReportStore::new(settings.reports_dir.clone());
        let handle = store.render(&result, &result.target)?;
        println!("Report: {}", handle.path.display());
    }

    if settings.persistence_enabled() {
        let db = Database::connect(&settings.database_url).await?;
        db.record_scan(&result.target, &result).await?;
    }
    Ok(())
}

fn cmd_init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    std::fs::write(&path, Settings::starter_toml())?;
    println!("Wrote {}", path.display());
    Ok(())
}
