//! Ledger configuration file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV_VAR: &str = "HARVEST_CONFIG";

/// Config file used when no override is set.
pub const DEFAULT_CONFIG_FILE: &str = "harvest.toml";

/// Complete configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub ledger: LedgerSettings,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Behavioural limits of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// Largest `add_reward_batch` accepted in one call.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Refuse to open an allow-list season the vault cannot cover.
    #[serde(default = "default_true")]
    pub require_funded_merkle_seasons: bool,
}

/// Persistence settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file. Empty = in-memory.
    #[serde(default)]
    pub db_path: String,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// "trace" | "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_max_batch_size() -> usize {
    500
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            require_funded_merkle_seasons: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl StorageConfig {
    /// The database file, or `None` for an in-memory database.
    pub fn db_path(&self) -> Option<PathBuf> {
        if self.db_path.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.db_path))
        }
    }
}

impl LedgerConfig {
    /// Load configuration from `path`.
    ///
    /// Falls back to defaults if the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml_str(&content)
        } else {
            tracing::debug!(?path, "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from `$HARVEST_CONFIG`, or `harvest.toml` in the working directory.
    pub fn load_default() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load(&path)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: LedgerConfig = toml::from_str(content)?;
        if config.ledger.max_batch_size == 0 {
            anyhow::bail!("ledger.max_batch_size must be at least 1");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.ledger.max_batch_size, 500);
        assert!(config.ledger.require_funded_merkle_seasons);
        assert!(config.storage.db_path().is_none());
        assert_eq!(config.logging.log_level, "info");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = LedgerConfig::from_toml_str(
            r#"
            [ledger]
            max_batch_size = 50

            [storage]
            db_path = "/var/lib/harvest/ledger.db"
            "#,
        )
        .expect("parse");
        assert_eq!(config.ledger.max_batch_size, 50);
        assert!(config.ledger.require_funded_merkle_seasons);
        assert_eq!(
            config.storage.db_path(),
            Some(PathBuf::from("/var/lib/harvest/ledger.db"))
        );
        assert_eq!(config.logging.log_level, "info");
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        assert!(LedgerConfig::from_toml_str("[ledger]\nmax_batch_size = 0\n").is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = LedgerConfig::default();
        let toml_str = toml::to_string(&config).expect("serialize");
        let parsed = LedgerConfig::from_toml_str(&toml_str).expect("parse");
        assert_eq!(parsed.ledger, config.ledger);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config =
            LedgerConfig::load(Path::new("/nonexistent/harvest.toml")).expect("defaults");
        assert_eq!(config.ledger, LedgerSettings::default());
    }
}
