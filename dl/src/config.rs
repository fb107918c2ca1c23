//! Deadliner configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// IANA timezone all users share (e.g. "Europe/Moscow")
    pub timezone: String,

    /// Scheduler loop configuration
    pub scheduler: SchedulerConfig,

    /// Push delivery configuration
    pub delivery: DeliveryConfig,

    /// Storage configuration
    pub storage: StorageConfig,
}

impl Config {
    /// Validate configuration before use.
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| eyre::eyre!("Unknown timezone: {}", self.timezone))?;

        if std::env::var(&self.delivery.token_env).is_err() {
            return Err(eyre::eyre!(
                "Push token not found. Set the {} environment variable.",
                self.delivery.token_env
            ));
        }
        Ok(())
    }

    /// The configured timezone, parsed
    pub fn timezone(&self) -> Result<chrono_tz::Tz> {
        self.timezone
            .parse()
            .map_err(|_| eyre::eyre!("Unknown timezone: {}", self.timezone))
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .deadliner.yml
        let local_config = PathBuf::from(".deadliner.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/deadliner/deadliner.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("deadliner").join("deadliner.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Scheduler loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Timeout applied to each user's message delivery, in milliseconds
    #[serde(rename = "deliver-timeout-ms")]
    pub deliver_timeout_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            deliver_timeout_ms: 15_000,
        }
    }
}

/// Push delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Bot API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Environment variable containing the push token
    #[serde(rename = "token-env")]
    pub token_env: String,

    /// HTTP request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.telegram.org".to_string(),
            token_env: "DEADLINER_PUSH_TOKEN".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path; empty means the platform default
    #[serde(rename = "db-path")]
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { db_path: String::new() }
    }
}

impl StorageConfig {
    /// Resolve the database path, falling back to the platform data dir
    pub fn resolve_db_path(&self) -> PathBuf {
        if !self.db_path.is_empty() {
            return PathBuf::from(&self.db_path);
        }
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("deadliner")
            .join("deadlines.db")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            scheduler: SchedulerConfig::default(),
            delivery: DeliveryConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.timezone, "UTC");
        assert_eq!(config.scheduler.deliver_timeout_ms, 15_000);
        assert_eq!(config.delivery.token_env, "DEADLINER_PUSH_TOKEN");
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
timezone: Europe/Moscow
delivery:
  timeout-ms: 5000
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.timezone, "Europe/Moscow");
        assert_eq!(config.delivery.timeout_ms, 5000);
        // Unspecified sections keep defaults
        assert_eq!(config.delivery.base_url, "https://api.telegram.org");
        assert_eq!(config.scheduler.deliver_timeout_ms, 15_000);
    }

    #[test]
    fn test_timezone_parses() {
        let mut config = Config::default();
        config.timezone = "Europe/Moscow".to_string();
        assert!(config.timezone().is_ok());
        config.timezone = "Mars/Olympus".to_string();
        assert!(config.timezone().is_err());
    }

    #[test]
    fn test_resolve_explicit_db_path() {
        let storage = StorageConfig {
            db_path: "/tmp/dl-test.db".to_string(),
        };
        assert_eq!(storage.resolve_db_path(), PathBuf::from("/tmp/dl-test.db"));
    }
}
