//! Batch ingestion against a rate-limited document store
//!
//! One state machine instance per batch: submit as an unordered bulk insert,
//! treat an all-duplicate conflict as completion, back off linearly and
//! resubmit the same batch on throttling, and abandon the batch on anything
//! else. A batch never takes the rest of the run down with it.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::batch;
use crate::config::DEFAULT_BASE_DELAY_SECS;
use crate::progress;
use crate::store::{DocumentStore, StoreError};
use crate::types::{CollectionTarget, Record};

/// Retry behavior for throttled batch submissions.
///
/// The delay grows linearly: `base_delay_secs + n` whole seconds before the
/// n-th retry. `max_retries: None` retries indefinitely and is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Base backoff delay in seconds
    pub base_delay_secs: u64,

    /// Maximum retries per batch; `None` retries indefinitely
    pub max_retries: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay_secs: DEFAULT_BASE_DELAY_SECS,
            max_retries: None,
        }
    }
}

impl RetryPolicy {
    /// Backoff before the n-th retry (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        Duration::from_secs(self.base_delay_secs + u64::from(retry))
    }

    /// Whether the policy permits another retry after `rejections` throttle
    /// rejections
    pub fn allows(&self, rejections: u32) -> bool {
        match self.max_retries {
            Some(cap) => rejections <= cap,
            None => true,
        }
    }
}

/// Terminal status of one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Every document in the batch was newly inserted
    Inserted,
    /// The backend reported only duplicate keys; the content is already there
    SkippedDuplicate,
    /// A non-recoverable error was logged and the batch left behind
    Abandoned,
}

/// Outcome of driving one batch to a terminal status
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Position of the batch within its collection (0-based)
    pub index: usize,

    /// Documents in the batch
    pub size: usize,

    pub status: BatchStatus,

    /// Documents actually inserted (can be non-zero for `SkippedDuplicate`
    /// when only part of the batch already existed)
    pub inserted: u64,

    /// Throttling retries performed before reaching the terminal status
    pub retries: u32,

    /// Error text when the batch was abandoned
    pub error: Option<String>,
}

/// Outcome of the best-effort collection reset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    /// Collection dropped, or it did not exist
    Dropped,
    /// The backend refused the administrative operation; load proceeds
    Unsupported(String),
    /// Any other failure; load proceeds against the existing collection
    Failed(String),
}

/// Per-collection rollup of the load
#[derive(Debug)]
pub struct CollectionReport {
    pub collection: String,

    /// Records decoded for this collection
    pub records: usize,

    pub reset: ResetOutcome,

    pub batches: Vec<BatchReport>,
}

impl CollectionReport {
    /// Documents inserted across all batches
    pub fn inserted(&self) -> u64 {
        self.batches.iter().map(|b| b.inserted).sum()
    }

    /// Batches completed as duplicates
    pub fn duplicate_batches(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| b.status == BatchStatus::SkippedDuplicate)
            .count()
    }

    /// Batches abandoned to non-recoverable errors
    pub fn abandoned_batches(&self) -> Vec<&BatchReport> {
        self.batches
            .iter()
            .filter(|b| b.status == BatchStatus::Abandoned)
            .collect()
    }

    /// Throttling retries performed across all batches
    pub fn total_retries(&self) -> u64 {
        self.batches.iter().map(|b| u64::from(b.retries)).sum()
    }
}

/// Best-effort drop of the destination collection before loading.
///
/// Restricted backends reject the administrative command; that and every
/// other failure is logged and tolerated, since loading into a stale
/// collection merely produces duplicate-key conflicts downstream.
pub async fn reset_collection<S: DocumentStore>(store: &S, collection: &str) -> ResetOutcome {
    match store.drop_collection(collection).await {
        Ok(()) => {
            info!(collection, "Collection reset");
            ResetOutcome::Dropped
        },
        Err(StoreError::Unsupported(message)) => {
            warn!(collection, %message, "Collection reset not supported, loading anyway");
            ResetOutcome::Unsupported(message)
        },
        Err(err) => {
            warn!(collection, error = %err, "Collection reset failed, loading anyway");
            ResetOutcome::Failed(err.to_string())
        },
    }
}

/// Drive one batch to a terminal status.
///
/// Throttling rejections put the machine back in the attempting state after a
/// linear backoff; the same batch is resubmitted unchanged. Duplicate-key
/// conflicts complete the batch. Anything else abandons it.
#[tracing::instrument(skip(store, batch, policy), fields(size = batch.len()))]
pub async fn insert_batch<S: DocumentStore>(
    store: &S,
    collection: &str,
    index: usize,
    batch: &[Record],
    policy: &RetryPolicy,
) -> BatchReport {
    let mut rejections: u32 = 0;

    loop {
        match store.insert_many(collection, batch).await {
            Ok(inserted) => {
                debug!(collection, batch = index, inserted, "Batch inserted");
                return BatchReport {
                    index,
                    size: batch.len(),
                    status: BatchStatus::Inserted,
                    inserted,
                    retries: rejections,
                    error: None,
                };
            },
            Err(StoreError::DuplicateKey {
                attempted,
                duplicates,
            }) => {
                debug!(
                    collection,
                    batch = index,
                    duplicates,
                    "Duplicate keys reported, batch already present"
                );
                return BatchReport {
                    index,
                    size: batch.len(),
                    status: BatchStatus::SkippedDuplicate,
                    inserted: attempted.saturating_sub(duplicates) as u64,
                    retries: rejections,
                    error: None,
                };
            },
            Err(err @ StoreError::Throttled { .. }) => {
                rejections += 1;

                if !policy.allows(rejections) {
                    let performed = rejections - 1;
                    warn!(
                        collection,
                        batch = index,
                        retries = performed,
                        "Retry budget exhausted, abandoning batch"
                    );
                    return BatchReport {
                        index,
                        size: batch.len(),
                        status: BatchStatus::Abandoned,
                        inserted: 0,
                        retries: performed,
                        error: Some(err.to_string()),
                    };
                }

                let delay = policy.delay_for(rejections);
                warn!(
                    collection,
                    batch = index,
                    retry = rejections,
                    delay_secs = delay.as_secs(),
                    "Request rate too large, backing off"
                );
                tokio::time::sleep(delay).await;
            },
            Err(err) => {
                warn!(collection, batch = index, error = %err, "Batch abandoned");
                return BatchReport {
                    index,
                    size: batch.len(),
                    status: BatchStatus::Abandoned,
                    inserted: 0,
                    retries: rejections,
                    error: Some(err.to_string()),
                };
            },
        }
    }
}

/// Load one collection target: reset, then submit every batch in order.
#[tracing::instrument(skip(store, target, records, policy), fields(collection = %target.collection))]
pub async fn load_collection<S: DocumentStore>(
    store: &S,
    target: &CollectionTarget,
    records: &[Record],
    policy: &RetryPolicy,
) -> CollectionReport {
    info!(
        collection = %target.collection,
        records = records.len(),
        batch_size = target.batch_size,
        "Loading collection"
    );

    let reset = reset_collection(store, &target.collection).await;

    let total = batch::batch_count(records.len(), target.batch_size);
    let pb = progress::create_batch_progress(total as u64, &target.collection);

    let mut batches = Vec::with_capacity(total);
    for (index, chunk) in batch::partition(records, target.batch_size).enumerate() {
        let report = insert_batch(store, &target.collection, index, chunk, policy).await;
        batches.push(report);
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!(
        collection = %target.collection,
        batches = batches.len(),
        "Collection load finished"
    );

    CollectionReport {
        collection: target.collection.clone(),
        records: records.len(),
        reset,
        batches,
    }
}
