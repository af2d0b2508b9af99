use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
}

/// Database and runtime settings
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("migrations")
}

fn default_log_level() -> String {
    "info".to_string()
}

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace", "off"];

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in REVIEWSTORE_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();

        let config_path = std::env::var("REVIEWSTORE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        Self::from_toml_str(&config_str)
            .with_context(|| format!("Invalid config file: {}", config_path.display()))
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("Failed to parse config.toml")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.store.db_path.as_os_str().is_empty() {
            anyhow::bail!("store.db_path must not be empty");
        }

        if let Some(parent) = self.store.db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                anyhow::bail!(
                    "directory for store.db_path does not exist: {}",
                    parent.display()
                );
            }
        }

        if !LOG_LEVELS.contains(&self.store.log_level.to_lowercase().as_str()) {
            anyhow::bail!(
                "store.log_level must be one of {}, got {:?}",
                LOG_LEVELS.join("|"),
                self.store.log_level
            );
        }

        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.store.db_path
    }

    pub fn migrations_dir(&self) -> &Path {
        &self.store.migrations_dir
    }

    /// Default filter for env_logger when RUST_LOG is unset
    pub fn log_level(&self) -> &str {
        &self.store.log_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize tests that mutate REVIEWSTORE_CONFIG so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    fn config_text(dir: &TempDir) -> String {
        let db_path = dir.path().join("store.db");
        let db_path = db_path.to_str().unwrap().replace('\\', "\\\\");
        format!(
            r#"
[store]
db_path = "{}"
log_level = "debug"
"#,
            db_path
        )
    }

    #[test]
    fn test_defaults_applied() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::from_toml_str(&config_text(&temp_dir)).unwrap();
        assert_eq!(config.migrations_dir(), Path::new("migrations"));
        assert_eq!(config.log_level(), "debug");
        assert!(config.db_path().ends_with("store.db"));
    }

    #[test]
    fn test_relative_db_path_accepted() {
        let config = Config::from_toml_str("[store]\ndb_path = \"store.db\"\n").unwrap();
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn test_missing_parent_dir_rejected() {
        let err = Config::from_toml_str("[store]\ndb_path = \"/no/such/dir/store.db\"\n").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_empty_db_path_rejected() {
        let err = Config::from_toml_str("[store]\ndb_path = \"\"\n").unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let err = Config::from_toml_str("[store]\ndb_path = \"x.db\"\nlog_level = \"loud\"\n").unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn test_config_load_from_env_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, config_text(&temp_dir)).unwrap();

        let original = std::env::var("REVIEWSTORE_CONFIG").ok();
        std::env::set_var("REVIEWSTORE_CONFIG", config_path.to_str().unwrap());
        let config = Config::load();
        std::env::remove_var("REVIEWSTORE_CONFIG");
        if let Some(v) = original {
            std::env::set_var("REVIEWSTORE_CONFIG", v);
        }

        assert!(config.is_ok(), "Config::load() failed: {:?}", config.err());
        assert_eq!(config.unwrap().log_level(), "debug");
    }

    #[test]
    fn test_config_invalid_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let original = std::env::var("REVIEWSTORE_CONFIG").ok();
        std::env::set_var("REVIEWSTORE_CONFIG", "nonexistent.toml");
        let config = Config::load();
        std::env::remove_var("REVIEWSTORE_CONFIG");
        if let Some(v) = original {
            std::env::set_var("REVIEWSTORE_CONFIG", v);
        }
        assert!(config.is_err());
        assert!(config.unwrap_err().to_string().contains("nonexistent.toml"));
    }
}
