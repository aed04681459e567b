//! Configuration management for the docload CLI
//!
//! Connection string, database selection, and the batching and retry
//! tunables.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LoadError, Result};
use crate::ingest::RetryPolicy;

// ============================================================================
// Loader Configuration Constants
// ============================================================================

/// Documents per insert batch when not specified.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Base throttling backoff delay, in seconds.
pub const DEFAULT_BASE_DELAY_SECS: u64 = 2;

/// Server selection timeout for the initial connection, in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Loader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Connection string for the document store
    pub uri: Option<String>,

    /// Database name; falls back to the connection string's default database
    pub database: Option<String>,

    /// Documents per insert batch
    pub batch_size: usize,

    /// Base throttling backoff delay in seconds
    pub base_delay_secs: u64,

    /// Maximum throttling retries per batch; `None` retries indefinitely
    pub max_retries: Option<u32>,

    /// Server selection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl LoaderConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self {
            uri: None,
            database: None,
            batch_size: DEFAULT_BATCH_SIZE,
            base_delay_secs: DEFAULT_BASE_DELAY_SECS,
            max_retries: None,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }

    /// Load config from environment variables
    ///
    /// Environment variables:
    /// - `DOCLOAD_URI`: Connection string (`COSMOS_URI` is honored as a
    ///   fallback for existing deployments)
    /// - `DOCLOAD_DATABASE`: Database name
    /// - `DOCLOAD_BATCH_SIZE`: Documents per insert batch
    /// - `DOCLOAD_BASE_DELAY_SECS`: Base throttling backoff delay
    /// - `DOCLOAD_MAX_RETRIES`: Retry cap per batch (unbounded when unset)
    /// - `DOCLOAD_CONNECT_TIMEOUT_SECS`: Server selection timeout
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new();

        if let Ok(uri) = std::env::var("DOCLOAD_URI") {
            config.uri = Some(uri);
        } else if let Ok(uri) = std::env::var("COSMOS_URI") {
            config.uri = Some(uri);
        }

        if let Ok(database) = std::env::var("DOCLOAD_DATABASE") {
            config.database = Some(database);
        }

        if let Ok(size) = std::env::var("DOCLOAD_BATCH_SIZE") {
            config.batch_size = parse_env("DOCLOAD_BATCH_SIZE", &size)?;
        }

        if let Ok(delay) = std::env::var("DOCLOAD_BASE_DELAY_SECS") {
            config.base_delay_secs = parse_env("DOCLOAD_BASE_DELAY_SECS", &delay)?;
        }

        if let Ok(cap) = std::env::var("DOCLOAD_MAX_RETRIES") {
            config.max_retries = Some(parse_env("DOCLOAD_MAX_RETRIES", &cap)?);
        }

        if let Ok(timeout) = std::env::var("DOCLOAD_CONNECT_TIMEOUT_SECS") {
            config.connect_timeout_secs = parse_env("DOCLOAD_CONNECT_TIMEOUT_SECS", &timeout)?;
        }

        Ok(config)
    }

    /// Validate the config before connecting
    pub fn validate(&self) -> Result<()> {
        if self.uri.as_deref().unwrap_or("").is_empty() {
            return Err(LoadError::config(
                "connection string is required; set DOCLOAD_URI (or COSMOS_URI) or pass --uri",
            ));
        }

        if self.batch_size == 0 {
            return Err(LoadError::config("batch size must be at least 1"));
        }

        Ok(())
    }

    /// Connection string; empty until one is configured
    pub fn uri(&self) -> &str {
        self.uri.as_deref().unwrap_or("")
    }

    /// Set the connection string
    pub fn set_uri(&mut self, uri: String) {
        self.uri = Some(uri);
    }

    /// Set the database name
    pub fn set_database(&mut self, database: String) {
        self.database = Some(database);
    }

    /// Set the batch size
    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.batch_size = batch_size;
    }

    /// Retry policy derived from the configured tunables
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base_delay_secs: self.base_delay_secs,
            max_retries: self.max_retries,
        }
    }

    /// Server selection timeout as a duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| LoadError::config(format!("{name} must be a number, got '{value}'")))
}
