//! Store configuration loading.
//!
//! # Responsibility
//! - Read the TOML config file and resolve the data directory.
//! - Provide defaults when no config file is present.
//!
//! # Invariants
//! - `data_dir` is never empty after loading.
//! - A leading `~` is expanded against `HOME` exactly once, at load time.

use crate::logging::normalize_level;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "DASHSTORE_CONFIG";
const DEFAULT_DATA_DIR: &str = "~/.dashstore";

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    InvalidValue {
        key: &'static str,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::InvalidValue { key, message } => write!(f, "invalid config `{key}`: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    resources: RawResources,
    logging: RawLogging,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct RawResources {
    data_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLogging {
    level: Option<String>,
    dir: Option<String>,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Root of `backups/` and `templates/`.
    pub data_dir: PathBuf,
    /// Normalized `[logging] level` (`trace|debug|info|warn|error`); `None`
    /// leaves the choice to the process front end.
    pub log_level: Option<&'static str>,
    /// Rolling log file directory; `None` logs to stderr.
    pub log_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: expand_home(DEFAULT_DATA_DIR, home_dir().as_deref()),
            log_level: None,
            log_dir: None,
        }
    }
}

impl StoreConfig {
    /// Loads and resolves the TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Loads `$DASHSTORE_CONFIG` when set, defaults otherwise.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::load(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text).map_err(ConfigError::Parse)?;
        let home = home_dir();
        let defaults = Self::default();

        let data_dir = match raw.resources.data_dir {
            Some(value) if value.trim().is_empty() => {
                return Err(ConfigError::InvalidValue {
                    key: "resources.data-dir",
                    message: "must not be empty".to_string(),
                });
            }
            Some(value) => expand_home(value.trim(), home.as_deref()),
            None => defaults.data_dir,
        };

        let log_level = match raw.logging.level {
            Some(value) => Some(normalize_level(&value).map_err(|message| {
                ConfigError::InvalidValue {
                    key: "logging.level",
                    message,
                }
            })?),
            None => None,
        };

        let log_dir = raw
            .logging
            .dir
            .filter(|value| !value.trim().is_empty())
            .map(|value| expand_home(value.trim(), home.as_deref()));

        Ok(Self {
            data_dir,
            log_level,
            log_dir,
        })
    }

    /// Replaces the data directory, expanding `~`.
    pub fn with_data_dir(mut self, data_dir: &str) -> Self {
        self.data_dir = expand_home(data_dir, home_dir().as_deref());
        self
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn expand_home(value: &str, home: Option<&Path>) -> PathBuf {
    match (value, home) {
        ("~", Some(home)) => home.to_path_buf(),
        (_, Some(home)) if value.starts_with("~/") => home.join(&value[2..]),
        _ => PathBuf::from(value),
    }
}

#[cfg(test)]
mod tests {
    use super::{expand_home, ConfigError, StoreConfig};
    use std::path::{Path, PathBuf};

    #[test]
    fn expand_home_only_touches_leading_tilde() {
        let home = Path::new("/home/ops");
        assert_eq!(expand_home("~", Some(home)), PathBuf::from("/home/ops"));
        assert_eq!(
            expand_home("~/grafana/data", Some(home)),
            PathBuf::from("/home/ops/grafana/data")
        );
        assert_eq!(expand_home("/srv/~x", Some(home)), PathBuf::from("/srv/~x"));
        assert_eq!(expand_home("~/data", None), PathBuf::from("~/data"));
    }

    #[test]
    fn from_toml_reads_kebab_case_data_dir_and_logging() {
        let config = StoreConfig::from_toml_str(
            r#"
            [resources]
            data-dir = "/srv/dashstore"

            [logging]
            level = "WARNING"
            dir = "/var/log/dashstore"
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/dashstore"));
        assert_eq!(config.log_level, Some("warn"));
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/dashstore")));
    }

    #[test]
    fn from_toml_uses_defaults_for_missing_sections() {
        let config = StoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, StoreConfig::default());
        assert!(config.log_level.is_none());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn from_toml_rejects_blank_data_dir_and_unknown_level() {
        let err = StoreConfig::from_toml_str("[resources]\ndata-dir = \"  \"\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "resources.data-dir",
                ..
            }
        ));

        let err = StoreConfig::from_toml_str("[logging]\nlevel = \"loud\"\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "logging.level",
                ..
            }
        ));
    }

    #[test]
    fn from_toml_rejects_malformed_text() {
        let err = StoreConfig::from_toml_str("[resources\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
