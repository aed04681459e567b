//! Document store abstraction
//!
//! The loader talks to the backend through the `DocumentStore` trait so the
//! batch state machine can be exercised against scripted stores in tests.
//! The production implementation is [`mongo::MongoStore`].

pub mod mongo;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::Record;

/// Server error code for a unique key violation
pub const DUPLICATE_KEY_CODE: i32 = 11000;

/// Cosmos DB error code for a request-rate rejection
pub const THROTTLED_CODE: i32 = 16500;

/// Message fragments that identify a throttling rejection when no usable
/// error code is attached
pub const THROTTLE_MARKERS: [&str; 2] = ["RequestRateTooLarge", "Request rate is large"];

/// Typed classification of backend failures
#[derive(Error, Debug)]
pub enum StoreError {
    /// Every failed document in the write was a duplicate; the content is
    /// already present
    #[error("{duplicates} of {attempted} documents already present (duplicate keys)")]
    DuplicateKey { attempted: usize, duplicates: usize },

    /// Provisioned throughput exceeded; the same operation can be retried
    /// after a delay
    #[error("Request rate too large: {message}")]
    Throttled { code: Option<i32>, message: String },

    /// The backend refused an administrative operation
    #[error("Operation not supported by the backend: {0}")]
    Unsupported(String),

    /// Connecting to or selecting a server failed
    #[error("Connection failed: {0}. Check the connection string and network access.")]
    Connection(String),

    /// Anything the classifier could not place
    #[error("Unclassified store error: {0}")]
    Unclassified(String),
}

impl StoreError {
    /// Whether retrying the same operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Throttled { .. })
    }
}

/// Write surface of the document store consumed by the loader
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Drop a collection. Dropping a collection that does not exist succeeds.
    async fn drop_collection(&self, collection: &str) -> Result<(), StoreError>;

    /// Unordered bulk insert: one failing document does not block the others
    /// in the same call. Returns the number of documents inserted.
    async fn insert_many(&self, collection: &str, batch: &[Record]) -> Result<u64, StoreError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_only_throttling_is_retryable() {
        let throttled = StoreError::Throttled {
            code: Some(THROTTLED_CODE),
            message: "Request rate is large".to_string(),
        };
        assert!(throttled.is_retryable());

        let duplicate = StoreError::DuplicateKey {
            attempted: 50,
            duplicates: 50,
        };
        assert!(!duplicate.is_retryable());
        assert!(!StoreError::Unsupported("dropCollection".to_string()).is_retryable());
        assert!(!StoreError::Unclassified("boom".to_string()).is_retryable());
    }
}
