//! Process-wide configuration.
//!
//! Loaded once at startup: defaults, then the TOML file named by
//! `INCIDENT_LENS_CONFIG` (if set), then individual environment overrides.

use std::path::PathBuf;

use incident_lens_analytics_models::AnalysisConfig;
use incident_lens_scraper::FetchConfig;
use serde::{Deserialize, Serialize};

/// Names the optional TOML config file.
pub const CONFIG_ENV: &str = "INCIDENT_LENS_CONFIG";

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;
/// Default cap on request bodies (20 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
/// Default feedback log location.
pub const DEFAULT_FEEDBACK_PATH: &str = "data/feedback.jsonl";

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        /// The file named by [`CONFIG_ENV`].
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`AppConfig`].
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override could not be parsed.
    #[error("Invalid value for {name}: '{value}'")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Rejected value.
        value: String,
    },
}

/// Server and pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listen address (`BIND_ADDR`).
    pub bind_addr: String,
    /// Listen port (`PORT`).
    pub port: u16,
    /// Largest accepted request body (`MAX_UPLOAD_BYTES`).
    pub max_upload_bytes: usize,
    /// Append-only feedback log (`FEEDBACK_PATH`).
    pub feedback_path: PathBuf,
    /// HTTP fetch settings; `FETCH_TIMEOUT_SECS` overrides the timeout.
    pub fetch: FetchConfig,
    /// Analysis tunables.
    pub analysis: AnalysisConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_owned(),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            feedback_path: PathBuf::from(DEFAULT_FEEDBACK_PATH),
            fetch: FetchConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { name, value })
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed,
    /// or an override is malformed.
    pub fn load() -> Result<Self, ConfigError> {
        let config = match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => {
                let path = PathBuf::from(path);
                log::info!("Loading config from {}", path.display());
                let text = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Read { path, source })?;
                Self::from_toml(&text)?
            }
            _ => Self::default(),
        };

        config.with_env(|name| std::env::var(name).ok())
    }

    /// Parses a TOML document; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is malformed.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::de::from_str(text)?)
    }

    /// Applies environment overrides read through `var`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if a numeric override does not
    /// parse.
    pub fn with_env(
        mut self,
        var: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(addr) = var("BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(port) = var("PORT") {
            self.port = parse_env("PORT", port)?;
        }
        if let Some(secs) = var("FETCH_TIMEOUT_SECS") {
            self.fetch.timeout_secs = parse_env("FETCH_TIMEOUT_SECS", secs)?;
        }
        if let Some(bytes) = var("MAX_UPLOAD_BYTES") {
            self.max_upload_bytes = parse_env("MAX_UPLOAD_BYTES", bytes)?;
        }
        if let Some(path) = var("FEEDBACK_PATH") {
            self.feedback_path = PathBuf::from(path);
        }
        Ok(self)
    }
}
