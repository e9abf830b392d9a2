// src/error.rs

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

/// Every failure the scanner core can surface.
///
/// `Transport` is recovered inside the aggregator (the headers section is
/// downgraded to an error record); the others abort the request they occur in.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{0}")]
    Transport(String),

    #[error("Report rendering failed: {0}")]
    Render(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl From<reqwest::Error> for ScanError {
    fn from(e: reqwest::Error) -> Self {
        ScanError::Transport(describe_transport_error(&e))
    }
}

/// Flattens a reqwest error and its source chain into one line, so the
/// recorded cause names the DNS/TCP/TLS failure and not just "error sending request".
pub fn describe_transport_error(e: &reqwest::Error) -> String {
    let mut message = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
