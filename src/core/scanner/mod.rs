// src/core/scanner/mod.rs

// This file acts as the public interface for the `scanner` module.
pub mod dns_scanner;
pub mod headers_scanner;
pub mod port_scanner;
pub mod providers;
pub mod target;

use chrono::Local;
use futures::future::join_all;
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::config::Settings;
use crate::core::models::{ScanResult, Section, SectionFailure};
use crate::error::Result;
use self::headers_scanner::{grade, HeaderFetcher};
use self::providers::ProviderSet;
use self::target::Target;

/// Wall-clock format of `ScanResult::timestamp`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Runs the header check and every configured finding provider for a target.
pub struct Scanner {
    fetcher: HeaderFetcher,
    providers: ProviderSet,
}

impl Scanner {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self::with_providers(HeaderFetcher::new(settings)?, ProviderSet::from_settings(settings)))
    }

    pub fn with_providers(fetcher: HeaderFetcher, providers: ProviderSet) -> Self {
        Self { fetcher, providers }
    }

    pub fn providers(&self) -> &ProviderSet {
        &self.providers
    }

    /// Runs a full scan against a target.
    ///
    /// The header check and every configured provider run concurrently. A
    /// header fetch failure turns the `headers` section into an error record
    /// and the remaining sections are still collected.
    ///
    /// # Arguments
    /// * `raw_url` - The target as the user typed it. A bare host gets
    ///   `https://`; other schemes are rejected.
    ///
    /// # Returns
    /// A `ScanResult` with one entry per section in the fixed section order,
    /// stamped with the local time. Fails only with `ScanError::Validation`
    /// when the URL cannot be turned into a scannable target.
    #[instrument(skip(self))]
    pub async fn run_scan(&self, raw_url: &str) -> Result<ScanResult> {
        let target = Target::parse(raw_url)?;
        info!(target = %target.as_str(), netloc = %target.netloc(), providers = self.providers.len(), "Starting scan.");

        let provider_runs = self.providers.iter().map(|provider| {
            let target = &target;
            async move { (provider.section(), provider.scan(target).await) }
        });

        let (headers, mut sections) = tokio::join!(self.scan_headers(&target), join_all(provider_runs));
        sections.push((Section::Headers, headers));

        let result = ScanResult::new(target.as_str(), sections, Local::now().format(TIMESTAMP_FORMAT).to_string());
        info!(sections = result.section_count(), "Scan finished.");
        Ok(result)
    }

    async fn scan_headers(&self, target: &Target) -> Value {
        match self.fetcher.fetch(target.as_str()).await {
            Ok(meta) => serde_json::to_value(grade(&meta.headers))
                .unwrap_or_else(|e| serde_json::json!(SectionFailure::new(e.to_string()))),
            Err(e) => {
                error!(url = %target.as_str(), error = %e, "HTTP request failed for headers scan.");
                serde_json::json!(SectionFailure::new(e.to_string()))
            }
        }
    }
}
