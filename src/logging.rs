// src/logging.rs

use color_eyre::eyre::Result;
use directories::ProjectDirs;
use lazy_static::lazy_static;
use std::path::PathBuf;
use tracing_error::ErrorLayer;
use tracing_subscriber::{self, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

lazy_static! {
    static ref ENV_PREFIX: String = env!("CARGO_CRATE_NAME").to_uppercase();
    /// Log directive variable consulted when `RUST_LOG` is unset.
    pub static ref LOG_LEVEL_ENV: String = format!("{}_LOGLEVEL", *ENV_PREFIX);
    /// Overrides the directory the log file is written to.
    pub static ref DATA_DIR_ENV: String = format!("{}_DATA", *ENV_PREFIX);
    pub static ref LOG_FILE_NAME: String = format!("{}.log", env!("CARGO_PKG_NAME"));
}

/// Where the log file goes: the override variable, then the platform's local
/// data directory, then `./.data`.
pub fn data_dir() -> PathBuf {
    data_dir_from(|key| std::env::var(key).ok())
}

fn data_dir_from<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = lookup(DATA_DIR_ENV.as_str()).filter(|d| !d.trim().is_empty()) {
        return PathBuf::from(dir);
    }
    ProjectDirs::from("com", "panda-rs", env!("CARGO_PKG_NAME"))
        .map(|dirs| dirs.data_local_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".data"))
}

/// `RUST_LOG`, then `<CRATE>_LOGLEVEL`, then info for this crate and the HTTP layer.
fn log_directives<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup("RUST_LOG")
        .or_else(|| lookup(LOG_LEVEL_ENV.as_str()))
        .unwrap_or_else(|| format!("{}=info,tower_http=info", env!("CARGO_CRATE_NAME")))
}

/// Initializes logging to a file in the data directory and to stderr.
///
/// Both outputs share one set of filter directives. Returns the log file path.
pub fn initialize_logging() -> Result<PathBuf> {
    let directory = data_dir();
    std::fs::create_dir_all(&directory)?;
    let log_path = directory.join(LOG_FILE_NAME.as_str());
    let log_file = std::fs::File::create(&log_path)?;

    let directives = log_directives(|key| std::env::var(key).ok());

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_filter(EnvFilter::new(&directives));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::new(&directives));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .with(ErrorLayer::default())
        .init();

    Ok(log_path)
}
