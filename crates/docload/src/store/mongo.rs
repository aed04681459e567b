//! MongoDB-compatible store client
//!
//! Thin wrapper over the official driver, pointed at a single database.
//! Cosmos DB's MongoDB API is the production target, so failure
//! classification understands its request-rate code (16500) alongside the
//! standard duplicate-key code (11000).

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::error::ErrorKind;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use tracing::debug;

use super::{DocumentStore, StoreError, DUPLICATE_KEY_CODE, THROTTLED_CODE, THROTTLE_MARKERS};
use crate::config::LoaderConfig;
use crate::types::Record;

/// Server error code for operating on a collection that does not exist
const NAMESPACE_NOT_FOUND: i32 = 26;

/// Server error code for an unauthorized command
const UNAUTHORIZED: i32 = 13;

/// Server error code for a command the backend does not implement
const COMMAND_NOT_SUPPORTED: i32 = 115;

/// Handle to one database of a MongoDB-compatible store
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    /// Connect using the validated configuration and verify the server
    /// responds to a ping before any writes are attempted.
    pub async fn connect(config: &LoaderConfig) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(config.uri())
            .await
            .map_err(|err| StoreError::Connection(err.to_string()))?;
        options.server_selection_timeout = Some(config.connect_timeout());

        let client = Client::with_options(options)
            .map_err(|err| StoreError::Connection(err.to_string()))?;

        let database = match &config.database {
            Some(name) => client.database(name),
            None => client.default_database().ok_or_else(|| {
                StoreError::Connection(
                    "no database specified; pass --database, set DOCLOAD_DATABASE, \
                     or include one in the connection string"
                        .to_string(),
                )
            })?,
        };

        let store = Self { database };
        store.ping().await?;

        debug!(database = store.database_name(), "Connected to document store");
        Ok(store)
    }

    /// Round-trip liveness check
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(map_command_error)?;
        Ok(())
    }

    /// Name of the database this handle points at
    pub fn database_name(&self) -> &str {
        self.database.name()
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn drop_collection(&self, collection: &str) -> Result<(), StoreError> {
        let coll = self.database.collection::<Record>(collection);
        match coll.drop().await {
            Ok(()) => Ok(()),
            // An absent collection is as good as a dropped one
            Err(err) if command_code(&err) == Some(NAMESPACE_NOT_FOUND) => Ok(()),
            Err(err) => Err(map_command_error(err)),
        }
    }

    async fn insert_many(&self, collection: &str, batch: &[Record]) -> Result<u64, StoreError> {
        let coll = self.database.collection::<Record>(collection);
        match coll.insert_many(batch).ordered(false).await {
            Ok(result) => Ok(result.inserted_ids.len() as u64),
            Err(err) => Err(map_insert_error(batch.len(), err)),
        }
    }
}

/// Command error code, when the failure is a command rejection
fn command_code(err: &mongodb::error::Error) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => Some(command.code),
        _ => None,
    }
}

/// Classify a failed command-level operation (drop, ping)
fn map_command_error(err: mongodb::error::Error) -> StoreError {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => classify_command_failure(command.code, &command.message),
        ErrorKind::ServerSelection { message, .. } => StoreError::Connection(message.clone()),
        ErrorKind::Io(io_err) => StoreError::Connection(io_err.to_string()),
        _ => classify_opaque_failure(err.to_string()),
    }
}

/// Classify a failed unordered bulk insert
fn map_insert_error(attempted: usize, err: mongodb::error::Error) -> StoreError {
    match err.kind.as_ref() {
        ErrorKind::InsertMany(failure) => {
            let write_failures: Vec<(i32, String)> = failure
                .write_errors
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|write_error| (write_error.code, write_error.message.clone()))
                .collect();

            classify_write_failures(attempted, &write_failures)
                .unwrap_or_else(|| classify_opaque_failure(err.to_string()))
        },
        ErrorKind::Command(command) => classify_command_failure(command.code, &command.message),
        ErrorKind::ServerSelection { message, .. } => StoreError::Connection(message.clone()),
        ErrorKind::Io(io_err) => StoreError::Connection(io_err.to_string()),
        _ => classify_opaque_failure(err.to_string()),
    }
}

/// A throttling rejection identified by message content alone
fn message_signals_throttle(message: &str) -> bool {
    THROTTLE_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
        || message.contains(&THROTTLED_CODE.to_string())
}

/// Classify the write errors of an unordered bulk insert.
///
/// Returns `None` when there are no write errors to inspect (the failure came
/// from elsewhere, e.g. a write concern error).
fn classify_write_failures(attempted: usize, failures: &[(i32, String)]) -> Option<StoreError> {
    if failures.is_empty() {
        return None;
    }

    if failures.iter().all(|(code, _)| *code == DUPLICATE_KEY_CODE) {
        return Some(StoreError::DuplicateKey {
            attempted,
            duplicates: failures.len(),
        });
    }

    if let Some((code, message)) = failures
        .iter()
        .find(|(code, message)| *code == THROTTLED_CODE || message_signals_throttle(message))
    {
        return Some(StoreError::Throttled {
            code: Some(*code),
            message: message.clone(),
        });
    }

    let (code, message) = &failures[0];
    Some(StoreError::Unclassified(format!(
        "{} write error(s), first: code {code}: {message}",
        failures.len()
    )))
}

/// Classify a failed administrative command by code and message
fn classify_command_failure(code: i32, message: &str) -> StoreError {
    if code == THROTTLED_CODE || message_signals_throttle(message) {
        return StoreError::Throttled {
            code: Some(code),
            message: message.to_string(),
        };
    }

    if code == UNAUTHORIZED
        || code == COMMAND_NOT_SUPPORTED
        || message.contains("not supported")
        || message.contains("not allowed")
    {
        return StoreError::Unsupported(message.to_string());
    }

    StoreError::Unclassified(format!("code {code}: {message}"))
}

/// Last-resort classification when only an error string is available
fn classify_opaque_failure(message: String) -> StoreError {
    if message_signals_throttle(&message) {
        StoreError::Throttled {
            code: None,
            message,
        }
    } else {
        StoreError::Unclassified(message)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_markers_detected() {
        assert!(message_signals_throttle(
            "Error=16500, RetryAfterMs=9.29, Details='Response status code does not indicate success'"
        ));
        assert!(message_signals_throttle("RequestRateTooLarge"));
        assert!(message_signals_throttle("Message: Request rate is large"));
        assert!(!message_signals_throttle("E11000 duplicate key error"));
        assert!(!message_signals_throttle("connection refused"));
    }

    #[test]
    fn test_all_duplicates_classify_as_duplicate_key() {
        let failures: Vec<(i32, String)> = (0..3)
            .map(|_| (DUPLICATE_KEY_CODE, "E11000 duplicate key error".to_string()))
            .collect();

        let err = classify_write_failures(50, &failures).unwrap();

        assert!(matches!(
            err,
            StoreError::DuplicateKey {
                attempted: 50,
                duplicates: 3
            }
        ));
    }

    #[test]
    fn test_throttle_among_write_errors_wins() {
        let failures = vec![
            (DUPLICATE_KEY_CODE, "E11000 duplicate key error".to_string()),
            (THROTTLED_CODE, "Request rate is large".to_string()),
        ];

        let err = classify_write_failures(50, &failures).unwrap();

        assert!(matches!(
            err,
            StoreError::Throttled {
                code: Some(THROTTLED_CODE),
                ..
            }
        ));
    }

    #[test]
    fn test_mixed_unknown_codes_are_unclassified() {
        let failures = vec![
            (DUPLICATE_KEY_CODE, "E11000 duplicate key error".to_string()),
            (8000, "something else entirely".to_string()),
        ];

        let err = classify_write_failures(50, &failures).unwrap();

        assert!(matches!(err, StoreError::Unclassified(_)));
    }

    #[test]
    fn test_no_write_errors_defers_classification() {
        assert!(classify_write_failures(50, &[]).is_none());
    }

    #[test]
    fn test_admin_rejections_classify_as_unsupported() {
        assert!(matches!(
            classify_command_failure(UNAUTHORIZED, "Unauthorized"),
            StoreError::Unsupported(_)
        ));
        assert!(matches!(
            classify_command_failure(COMMAND_NOT_SUPPORTED, "dropCollection is not allowed"),
            StoreError::Unsupported(_)
        ));
        assert!(matches!(
            classify_command_failure(2, "command dropDatabase not supported"),
            StoreError::Unsupported(_)
        ));
    }

    #[test]
    fn test_throttled_command_classifies_before_unsupported() {
        let err = classify_command_failure(THROTTLED_CODE, "Request rate is large");
        assert!(matches!(err, StoreError::Throttled { .. }));
    }

    #[test]
    fn test_opaque_throttle_text_still_backs_off() {
        assert!(matches!(
            classify_opaque_failure("RequestRateTooLarge, RetryAfterMs=34".to_string()),
            StoreError::Throttled { code: None, .. }
        ));
        assert!(matches!(
            classify_opaque_failure("broken pipe".to_string()),
            StoreError::Unclassified(_)
        ));
    }
}
