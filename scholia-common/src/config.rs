//! Bootstrap configuration for Scholia services
//!
//! Bootstrap covers only what a process needs before the database is open:
//! the data directory and the log filter. Everything else lives in the
//! database itself.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line argument (`--data-dir`)
//! 2. Environment variable (`SCHOLIA_DATA`)
//! 3. TOML configuration file (`~/.config/scholia/config.toml`)
//! 4. OS default data directory (e.g. `~/.local/share/scholia`)
//!
//! The resolved [`Config`] is constructed once in `main` and passed to
//! components explicitly; there is no process-global settings cache.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding the data directory
pub const ENV_DATA_DIR: &str = "SCHOLIA_DATA";

/// Database file name inside the data directory
pub const DATABASE_FILE: &str = "scholia.db";

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime. A service must restart
/// to pick up changes to the TOML file.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// Data directory holding the SQLite database (optional)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Tracing filter directive (e.g. "info", "scholia_ed=debug,info")
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

/// Resolved bootstrap configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the database file
    pub data_dir: PathBuf,

    /// Tracing filter installed when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Config {
    /// Resolve configuration using the documented source priority.
    ///
    /// `cli_data_dir` is the value of the service's `--data-dir` argument,
    /// already merged with its environment fallback by clap.
    pub fn resolve(cli_data_dir: Option<&Path>) -> Result<Config> {
        let toml = load_default_file()?;
        let env_dir = std::env::var_os(ENV_DATA_DIR).map(PathBuf::from);
        let config = resolve_parts(cli_data_dir, env_dir, toml, dirs::data_dir())?;
        debug!("Resolved data directory: {}", config.data_dir.display());
        Ok(config)
    }

    /// Path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    /// sqlx connection URL, creating the file on first open
    pub fn database_url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.database_path().display())
    }

    /// Create the data directory if it does not exist yet
    pub fn ensure_data_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

/// Default TOML file location (`<os config dir>/scholia/config.toml`)
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("scholia").join("config.toml"))
}

/// Parse a TOML configuration file
pub fn load_file(path: &Path) -> Result<TomlConfig> {
    let text = std::fs::read_to_string(path)?;
    toml::from_str(&text).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

fn load_default_file() -> Result<Option<TomlConfig>> {
    match config_file_path() {
        Some(path) if path.exists() => Ok(Some(load_file(&path)?)),
        _ => Ok(None),
    }
}

fn resolve_parts(
    cli: Option<&Path>,
    env_dir: Option<PathBuf>,
    toml: Option<TomlConfig>,
    os_default: Option<PathBuf>,
) -> Result<Config> {
    let log_filter = toml
        .as_ref()
        .map(|t| t.logging.filter.clone())
        .unwrap_or_else(default_log_filter);

    let data_dir = if let Some(dir) = cli {
        dir.to_path_buf()
    } else if let Some(dir) = env_dir {
        dir
    } else if let Some(dir) = toml.and_then(|t| t.data_dir) {
        dir
    } else if let Some(base) = os_default {
        base.join("scholia")
    } else {
        return Err(Error::Config(
            "no data directory available: pass --data-dir or set SCHOLIA_DATA".to_string(),
        ));
    };

    Ok(Config {
        data_dir,
        log_filter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_everything() {
        let toml = TomlConfig {
            data_dir: Some(PathBuf::from("/from/toml")),
            logging: LoggingConfig::default(),
        };
        let config = resolve_parts(
            Some(Path::new("/from/cli")),
            Some(PathBuf::from("/from/env")),
            Some(toml),
            Some(PathBuf::from("/from/os")),
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/from/cli"));
    }

    #[test]
    fn test_env_overrides_toml() {
        let toml = TomlConfig {
            data_dir: Some(PathBuf::from("/from/toml")),
            logging: LoggingConfig::default(),
        };
        let config = resolve_parts(
            None,
            Some(PathBuf::from("/from/env")),
            Some(toml),
            Some(PathBuf::from("/from/os")),
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/from/env"));
    }

    #[test]
    fn test_toml_overrides_os_default() {
        let toml = TomlConfig {
            data_dir: Some(PathBuf::from("/from/toml")),
            logging: LoggingConfig::default(),
        };
        let config =
            resolve_parts(None, None, Some(toml), Some(PathBuf::from("/from/os"))).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/from/toml"));
    }

    #[test]
    fn test_os_default_appends_app_dir() {
        let config = resolve_parts(None, None, None, Some(PathBuf::from("/from/os"))).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/from/os/scholia"));
    }

    #[test]
    fn test_no_source_is_config_error() {
        let err = resolve_parts(None, None, None, None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_log_filter_comes_from_toml() {
        let toml = TomlConfig {
            data_dir: None,
            logging: LoggingConfig {
                filter: "debug".to_string(),
            },
        };
        let config =
            resolve_parts(None, None, Some(toml), Some(PathBuf::from("/from/os"))).unwrap();
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn test_database_url_requests_create_mode() {
        let config = Config {
            data_dir: PathBuf::from("/tmp/scholia-test"),
            log_filter: default_log_filter(),
        };
        assert_eq!(
            config.database_url(),
            "sqlite:///tmp/scholia-test/scholia.db?mode=rwc"
        );
    }
}
