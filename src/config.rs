//! Configuration file loader.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Name of the configuration file searched in the working directory.
const LOCAL_CONFIG_FILE: &str = "scantool-supervisor.toml";

/// Error type for configuration loading.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Supervisor configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Poll interval for worker exit checks, in milliseconds.
    pub poll_interval_ms: u64,
    /// Graceful termination timeout during cleanup, in milliseconds.
    pub terminate_timeout_ms: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            terminate_timeout_ms: 5000,
        }
    }
}

impl SupervisorConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub fn terminate_timeout(&self) -> Duration {
        Duration::from_millis(self.terminate_timeout_ms)
    }
}

/// Configuration loader that searches multiple locations.
///
/// The working directory wins over the user config directory; when no file
/// exists anywhere, defaults apply.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Creates a loader with the standard search path.
    #[must_use]
    pub fn new() -> Self {
        let mut search_paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("scantool-supervisor").join("config.toml"));
        }
        Self { search_paths }
    }

    /// Creates a loader that only considers the given file.
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            search_paths: vec![path.into()],
        }
    }

    /// Loads the first configuration file found, or defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a file exists but cannot be read or parsed;
    /// a missing file is not an error.
    pub fn load(&self) -> Result<SupervisorConfig, ConfigError> {
        for path in &self.search_paths {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading configuration");
                let contents = std::fs::read_to_string(path)?;
                return Ok(toml::from_str(&contents)?);
            }
        }
        Ok(SupervisorConfig::default())
    }
}
