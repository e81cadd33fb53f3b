//! # Configuration
//!
//! Layered settings for a probe run, lowest priority first:
//! 1. Built-in defaults
//! 2. `todoprobe.toml` in the working directory
//! 3. Environment variables (`TODOPROBE_*`, `__` separates nested keys)
//! 4. Command-line flags
//!
//! `TODOPROBE_REPORT__FORMAT=json` maps to `report.format`.

use std::path::PathBuf;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::ClientConfig;
use crate::report::ReportFormat;

pub const CONFIG_FILE: &str = "todoprobe.toml";
pub const ENV_PREFIX: &str = "TODOPROBE_";
pub const DEFAULT_BASE_URL: &str = "http://localhost:4567";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    pub base_url: String,
    /// Per-request timeout in milliseconds; `0` keeps the client default.
    pub timeout_ms: u64,
    /// Shuffle seed. A fresh one is drawn per run when unset.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Snapshot before a scenario run and restore afterwards.
    pub restore: bool,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub format: ReportFormat,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: 0,
            seed: None,
            restore: true,
            report: ReportConfig::default(),
        }
    }
}

/// Values given on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restore: Option<bool>,
    pub report: ReportOverrides,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ReportFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl ProbeConfig {
    pub fn load_with(overrides: &Overrides) -> Result<Self, ConfigError> {
        let config: Self = Self::figment().merge(Serialized::defaults(overrides)).extract()?;
        config.validate()?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Defaults, the config file and the environment, without CLI values.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidValue {
            field: "base_url",
            reason: format!("`{}` is not a URL: {e}", self.base_url),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                field: "base_url",
                reason: format!("unsupported scheme `{}`", url.scheme()),
            });
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            timeout_ms: self.timeout_ms,
        }
    }
}
