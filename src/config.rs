//! Server Configuration
//!
//! Centralized configuration with defaults matching the original branch
//! server: port 8080 on all interfaces, `data.csv`, five seconds per operation.

use crate::storage::DEFAULT_PROCESSING_DELAY;
use crate::{DEFAULT_DATA_FILE, DEFAULT_HOST, DEFAULT_PORT};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a FlashBank server instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on (0 picks a free port)
    pub port: u16,

    /// Ledger file loaded at startup and written at shutdown
    pub data_file: PathBuf,

    /// Delay held under the store lock by every operation
    pub processing_delay: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            processing_delay: DEFAULT_PROCESSING_DELAY,
        }
    }
}

impl ServerConfig {
    /// Create a new config builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builder for ServerConfig
#[derive(Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_file = path.into();
        self
    }

    pub fn processing_delay(mut self, delay: Duration) -> Self {
        self.config.processing_delay = delay;
        self
    }

    pub fn build(self) -> ServerConfig {
        self.config
    }
}
