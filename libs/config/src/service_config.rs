//! Ledger Configuration Module
//!
//! Provides configuration loading for the pool ledger. Every field has a
//! default, so an empty or missing file yields a working configuration.
//! Supports loading from TOML files with environment overrides.

use crate::protocol::{
    DEFAULT_CONFIG_PATH, DEFAULT_DEPOSIT_POLICY, ENV_PREFIX, ENV_SEPARATOR,
    MINIMUM_LIQUIDITY_WITHDRAWAL,
};
use anyhow::{Context, Result};
use config_crate::{Config, Environment, File, Map};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main ledger configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct LedgerConfig {
    /// Engine arithmetic and policy settings
    pub engine: EngineSettings,

    /// Log output settings
    pub logging: LoggingSettings,

    /// Snapshot persistence
    pub storage: StorageSettings,
}

/// Engine settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    /// Smallest redemption accepted, in claim-token base units
    pub minimum_liquidity_withdrawal: u64,

    /// `anchor_on_a` or `capped_by_both`
    pub deposit_policy: String,
}

/// Log output format
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence when set
    pub level: String,
    pub format: LogFormat,
}

/// Storage settings
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct StorageSettings {
    /// Where the CLI writes engine snapshots, if anywhere
    pub snapshot_path: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            minimum_liquidity_withdrawal: MINIMUM_LIQUIDITY_WITHDRAWAL,
            deposit_policy: DEFAULT_DEPOSIT_POLICY.to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl LedgerConfig {
    /// Load configuration from defaults, an optional file, and the environment
    ///
    /// An explicit `path` must exist. Without one, `config/pool_ledger.toml`
    /// is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Same as [`LedgerConfig::load`] with an explicit environment map
    ///
    /// `None` reads the process environment.
    pub fn load_with_env(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let defaults = Config::try_from(&LedgerConfig::default())
            .context("Failed to build default configuration")?;

        let mut builder = Config::builder().add_source(defaults);

        match path {
            Some(path) => {
                info!("Loading ledger config: {:?}", path);
                builder = builder.add_source(File::from(path).required(true));
            }
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_PATH);
                if fallback.exists() {
                    info!("Loading ledger config: {:?}", fallback);
                } else {
                    debug!("No config file at {:?}, using defaults", fallback);
                }
                builder = builder.add_source(File::from(fallback).required(false));
            }
        }

        // Override with environment variables (POOL_LEDGER_ prefix)
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .source(env),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Expand environment variables and `~` in path values
    pub fn expand_env_vars(&mut self) -> Result<()> {
        if let Some(path) = &self.storage.snapshot_path {
            let raw = path.to_string_lossy();
            let expanded =
                shellexpand::full(&raw).context("Failed to expand snapshot path")?;
            self.storage.snapshot_path = Some(PathBuf::from(expanded.as_ref()));
        }
        Ok(())
    }

    /// Render as TOML, e.g. to seed a config file
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

/// Convenience function to load configuration with defaults
pub fn load_config(path: Option<&Path>) -> Result<LedgerConfig> {
    let mut config = LedgerConfig::load(path)?;
    config.expand_env_vars()?;
    Ok(config)
}
