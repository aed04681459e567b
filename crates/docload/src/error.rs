//! Error types for the docload CLI
//!
//! This module provides user-friendly error types with clear, actionable messages
//! that help users understand what went wrong and how to fix it.

use thiserror::Error;

use crate::decode::DecodeError;
use crate::store::StoreError;

/// Result type alias for loader operations
pub type Result<T> = std::result::Result<T, LoadError>;

/// Comprehensive error type for loader operations
///
/// All errors are designed to be user-facing with clear messages and suggestions.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Decoding a line-delimited source failed; nothing was sent for it
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The store rejected the connection or a run-level operation
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and paths.")]
    Io(#[from] std::io::Error),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Collection target spec doesn't follow the expected format
    #[error("Invalid collection target '{spec}': {reason}. Expected format: 'name' or 'name=path/to/file.json'.")]
    InvalidTarget { spec: String, reason: String },
}

impl LoadError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid target error
    pub fn invalid_target(spec: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            spec: spec.into(),
            reason: reason.into(),
        }
    }
}
