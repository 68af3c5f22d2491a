//! Configuration types for Interpose

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::{InterposeError, Result};

/// Default listen address
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";

/// Default maximum concurrent connections
pub const DEFAULT_MAX_CONNECTIONS: usize = 4096;

/// Default maximum buffered request body (16 MB)
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 16 * 1024 * 1024;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Cassette file to replay; may be left out when given on the command line
    #[serde(default)]
    pub cassette: PathBuf,
    /// Address to listen on
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    /// Resource limits
    #[serde(default)]
    pub limits: LimitsConfig,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

/// Resource limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum concurrent connections
    pub max_connections: usize,
    /// Maximum request size in bytes
    pub max_request_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
        }
    }
}

impl Config {
    /// Create a configuration with default listen address and limits
    #[must_use]
    pub fn new(cassette: PathBuf) -> Self {
        Self {
            cassette,
            listen: default_listen(),
            limits: LimitsConfig::default(),
        }
    }

    /// Load and validate configuration from TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, parsed or validated
    pub fn from_file(path: &Path) -> Result<Self> {
        let config = Self::parse_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without validating it
    ///
    /// Callers applying overrides validate the merged result themselves.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn parse_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| InterposeError::ConfigError(format!("Failed to read config file: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| InterposeError::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if the cassette is missing or a limit is zero
    pub fn validate(&self) -> Result<()> {
        if self.cassette.as_os_str().is_empty() {
            return Err(InterposeError::ConfigError(
                "cassette is not set".to_string(),
            ));
        }

        if !self.cassette.is_file() {
            return Err(InterposeError::ConfigError(format!(
                "Cassette file does not exist: {}",
                self.cassette.display()
            )));
        }

        if self.limits.max_connections == 0 {
            return Err(InterposeError::ConfigError(
                "limits.max_connections must be > 0".to_string(),
            ));
        }

        if self.limits.max_request_size == 0 {
            return Err(InterposeError::ConfigError(
                "limits.max_request_size must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
