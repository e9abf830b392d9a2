// src/config.rs

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{Result, ScanError};

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "panda-scanner.toml";

/// The client signatures a header fetch picks its `User-Agent` from.
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)",
    "Mozilla/5.0 (Linux; Android 10; SM-G975F)",
];

/// Which finding providers back the non-header sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProviderMode {
    /// Deterministic "nothing found" records.
    Stub,
    /// DNS and TCP based providers where a real detector exists.
    Live,
}

/// Runtime settings, layered as: defaults, TOML file, environment, CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bind: String,
    pub reports_dir: PathBuf,
    /// Empty string disables scan/feedback persistence.
    pub database_url: String,
    pub fetch_timeout_secs: u64,
    pub retry_transient: bool,
    pub user_agents: Vec<String>,
    pub user_agent_seed: Option<u64>,
    pub providers: ProviderMode,
    pub port_probe_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
            reports_dir: PathBuf::from("reports"),
            database_url: "sqlite://panda-scanner.db".to_string(),
            fetch_timeout_secs: 10,
            retry_transient: false,
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            user_agent_seed: None,
            providers: ProviderMode::Stub,
            port_probe_timeout_ms: 1500,
        }
    }
}

impl Settings {
    /// Loads settings from `path` (or the default file when present) and applies
    /// environment overrides. A missing explicit file is an error; a missing
    /// default file is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ScanError::Config(format!("config file not found: {}", p.display())));
                }
                Self::from_file(p)?
            }
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() { Self::from_file(default)? } else { Self::default() }
            }
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Applies `PANDA_*` overrides. The lookup is injected so tests don't touch
    /// the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("PANDA_BIND") {
            self.bind = bind;
        }
        if let Some(dir) = lookup("PANDA_REPORTS_DIR") {
            self.reports_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("PANDA_DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(mode) = lookup("PANDA_PROVIDERS") {
            self.providers = mode
                .parse()
                .map_err(|_| ScanError::Config(format!("unknown provider mode: {mode}")))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.user_agents.is_empty() {
            return Err(ScanError::Config("user_agents must not be empty".into()));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ScanError::Config("fetch_timeout_secs must be greater than zero".into()));
        }
        if self.port_probe_timeout_ms == 0 {
            return Err(ScanError::Config("port_probe_timeout_ms must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn persistence_enabled(&self) -> bool {
        !self.database_url.trim().is_empty()
    }

    /// A commented starter file for `panda-rs-scanner init`.
    pub fn starter_toml() -> &'static str {
        r#"# panda-rs-scanner configuration

bind = "0.0.0.0:5000"
reports_dir = "reports"

# Leave empty to disable scan and feedback logging.
database_url = "sqlite://panda-scanner.db"

fetch_timeout_secs = 10
retry_transient = false

# Fix the User-Agent rotation for reproducible runs.
# user_agent_seed = 42

# "stub" or "live"
providers = "stub"
port_probe_timeout_ms = 1500
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.fetch_timeout_secs, 10);
        assert_eq!(settings.user_agents.len(), 3);
        assert_eq!(settings.providers, ProviderMode::Stub);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind = \"127.0.0.1:8080\"\nproviders = \"live\"").unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.bind, "127.0.0.1:8080");
        assert_eq!(settings.providers, ProviderMode::Live);
        assert_eq!(settings.reports_dir, PathBuf::from("reports"));
    }

    #[test]
    fn starter_file_parses() {
        let settings: Settings = toml::from_str(Settings::starter_toml()).unwrap();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("PANDA_BIND", "127.0.0.1:9000"),
            ("PANDA_DATABASE_URL", ""),
            ("PANDA_PROVIDERS", "live"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.apply_env(|k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(settings.bind, "127.0.0.1:9000");
        assert!(!settings.persistence_enabled());
        assert_eq!(settings.providers, ProviderMode::Live);
    }

    #[test]
    fn unknown_provider_mode_is_rejected() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env(|k| (k == "PANDA_PROVIDERS").then(|| "random".to_string()))
            .unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
    }

    #[test]
    fn empty_user_agent_pool_is_rejected() {
        let settings = Settings { user_agents: Vec::new(), ..Default::default() };
        assert!(matches!(settings.validate(), Err(ScanError::Config(_))));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/panda.toml"))).unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
    }
}
