//! Configuration loading with TOML parsing and environment variable overrides
//!
//! ```toml
//! [store]
//! data_path = "patients.csv"
//!
//! [logging]
//! level = "info"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding `store.data_path`.
pub const ENV_DATA_PATH: &str = "CLINIC_RECORDS_DATA_PATH";
/// Environment variable overriding `logging.level`.
pub const ENV_LOG_LEVEL: &str = "CLINIC_RECORDS_LOG_LEVEL";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Configuration validation failed: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Patient data file
    pub data_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("patients.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.data_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("store.data_path must not be empty".into()));
        }
        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "logging.level must be one of {}, got {:?}",
                LOG_LEVELS.join(", "),
                self.logging.level
            )));
        }
        Ok(())
    }
}

/// Load configuration from `path`, falling back to defaults if it does not exist.
///
/// Environment overrides are applied after parsing, then the result is validated.
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    load_config_with(path.as_ref(), |key| std::env::var(key).ok())
}

fn load_config_with(
    path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, ConfigError> {
    let mut config = match fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => AppConfig::default(),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    apply_overrides(&mut config, lookup);
    config.validate()?;
    Ok(config)
}

/// Apply `CLINIC_RECORDS_*` overrides using `lookup` to read variables.
pub fn apply_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(path) = lookup(ENV_DATA_PATH) {
        config.store.data_path = PathBuf::from(path);
    }
    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        config.logging.level = level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_with(&dir.path().join("absent.toml"), |_| None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.store.data_path, PathBuf::from("patients.csv"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: AppConfig = toml::from_str("[store]\ndata_path = \"/srv/clinic/p.csv\"\n").unwrap();
        assert_eq!(config.store.data_path, PathBuf::from("/srv/clinic/p.csv"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clinic-records.toml");
        fs::write(&path, "[store]\ndata_path = \"x.csv\"\n[logging]\nlevel = \"debug\"\n").unwrap();

        let config = load_config_with(&path, |_| None).unwrap();
        assert_eq!(config.store.data_path, PathBuf::from("x.csv"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_env_beats_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clinic-records.toml");
        fs::write(&path, "[store]\ndata_path = \"x.csv\"\n").unwrap();

        let config = load_config_with(&path, |key| {
            (key == ENV_DATA_PATH).then(|| "from-env.csv".to_string())
        })
        .unwrap();
        assert_eq!(config.store.data_path, PathBuf::from("from-env.csv"));
    }

    #[test]
    fn test_invalid_override_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config_with(&dir.path().join("absent.toml"), |key| {
            (key == ENV_LOG_LEVEL).then(|| "chatty".to_string())
        });
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_config_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[store\n").unwrap();
        assert!(matches!(load_config_with(&path, |_| None), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> =
            HashMap::from([(ENV_DATA_PATH, "env.csv"), (ENV_LOG_LEVEL, "warn")]);
        let mut config = AppConfig::default();
        apply_overrides(&mut config, |key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.store.data_path, PathBuf::from("env.csv"));
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        config.logging.level = "loud".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.store.data_path = PathBuf::new();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.logging.level = "DEBUG".into();
        assert!(config.validate().is_ok());
    }
}
