//! Server configuration.
//!
//! Settings resolve in precedence order: command-line arguments, then an
//! optional TOML config file, then environment variables, then built-in
//! defaults (bind address only — a source file must always be configured).
//!
//! ```toml
//! # divelog.toml
//! [server]
//! source = "/var/lib/divelog/divelog.xml"
//! bind = "127.0.0.1:8072"
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

/// Environment variable naming the export file to import.
pub const SOURCE_ENV_VAR: &str = "DIVELOG_DBFILE_PATH";

/// Environment variable naming the bind address.
pub const BIND_ENV_VAR: &str = "DIVELOG_BIND";

/// Bind address used when nothing else configures one.
pub const DEFAULT_BIND: &str = "127.0.0.1:8072";

/// Errors produced while resolving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No export file configured anywhere.
    #[error(
        "no dive-log source configured: pass --db, set [server].source in the \
         config file, or export {SOURCE_ENV_VAR}"
    )]
    MissingSource,

    /// A bind address that does not parse.
    #[error("invalid bind address {0:?}")]
    InvalidBind(String),

    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file could not be parsed.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Path of the file.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
}

/// Root structure of a `divelog.toml` file.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    /// Server settings.
    #[serde(default)]
    pub server: ServerSection,
}

/// The `[server]` table of the config file.
#[derive(Debug, Default, Deserialize)]
pub struct ServerSection {
    /// Export file to import.
    pub source: Option<PathBuf>,
    /// Bind address, e.g. `"127.0.0.1:8072"`.
    pub bind: Option<String>,
}

impl FileConfig {
    /// Load a config file from disk.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Export file to import and re-import.
    pub source: PathBuf,
    /// Address the HTTP layer binds.
    pub bind: SocketAddr,
}

impl Config {
    /// Resolve configuration from the three sources in precedence order.
    pub fn resolve(
        cli_source: Option<PathBuf>,
        cli_bind: Option<SocketAddr>,
        config_file: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let file = match config_file {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };

        let source = cli_source
            .or(file.server.source)
            .or_else(|| std::env::var_os(SOURCE_ENV_VAR).map(PathBuf::from))
            .ok_or(ConfigError::MissingSource)?;

        let bind = match cli_bind {
            Some(addr) => addr,
            None => {
                let raw = file
                    .server
                    .bind
                    .or_else(|| std::env::var(BIND_ENV_VAR).ok())
                    .unwrap_or_else(|| DEFAULT_BIND.to_string());
                raw.parse().map_err(|_| ConfigError::InvalidBind(raw))?
            }
        };

        debug!("resolved config: source={} bind={bind}", source.display());
        Ok(Self { source, bind })
    }
}
