//! Application settings loaded from a TOML file.
//!
//! Every field has a default, so a missing file or a partial one is fine:
//!
//! ```toml
//! [paths]
//! profile = "learning_data.json"
//!
//! [network]
//! port = 5500
//!
//! [clock]
//! initial_secs = 300
//! increment_secs = 2
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use netplay::NetConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::clock::TimeControl;

pub const DEFAULT_CONFIG_FILE: &str = "adaptive_chess.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub network: NetworkConfig,
    pub clock: ClockConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Learned weights and rating.
    pub profile: PathBuf,
    /// Appended after every finished game.
    pub report: PathBuf,
    /// Appended by the `export` command.
    pub deep_analysis: PathBuf,
    pub log: PathBuf,
    /// Replaces the embedded opening book when set.
    pub opening_book: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            profile: PathBuf::from(adaptive_engine::profile::PROFILE_FILENAME),
            report: PathBuf::from("lvl.txt"),
            deep_analysis: PathBuf::from("analysis.txt"),
            log: PathBuf::from("logs.txt"),
            opening_book: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub bind_addr: String,
    /// Random port in 5000..=6000 when unset.
    pub port: Option<u16>,
    pub public_host: Option<String>,
    pub accept_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        let net = NetConfig::default();
        Self {
            bind_addr: net.bind_addr,
            port: net.port,
            public_host: net.public_host,
            accept_timeout_secs: net.accept_timeout.as_secs(),
            connect_timeout_secs: net.connect_timeout.as_secs(),
            read_timeout_secs: net.read_timeout.as_secs(),
            write_timeout_secs: net.write_timeout.as_secs(),
        }
    }
}

impl NetworkConfig {
    pub fn to_net_config(&self) -> NetConfig {
        NetConfig {
            bind_addr: self.bind_addr.clone(),
            port: self.port,
            public_host: self.public_host.clone(),
            accept_timeout: Duration::from_secs(self.accept_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            write_timeout: Duration::from_secs(self.write_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Per side; 0 disables the clock.
    pub initial_secs: u64,
    pub increment_secs: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            initial_secs: 600,
            increment_secs: 0,
        }
    }
}

impl ClockConfig {
    pub fn time_control(&self) -> TimeControl {
        TimeControl::from_secs(self.initial_secs, self.increment_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub use_book: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { use_book: true }
    }
}

impl AppConfig {
    /// Loads settings from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = ?path, "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
