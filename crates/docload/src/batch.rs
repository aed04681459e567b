//! Batch partitioning of decoded record sequences

use crate::types::Record;

/// Partition records into contiguous batches of at most `batch_size`,
/// preserving order. All batches are full except possibly the last.
///
/// # Panics
///
/// Panics if `batch_size` is zero; targets are validated before reaching this
/// point.
pub fn partition(records: &[Record], batch_size: usize) -> std::slice::Chunks<'_, Record> {
    records.chunks(batch_size)
}

/// Number of batches a sequence of `len` records yields at `batch_size`
pub fn batch_count(len: usize, batch_size: usize) -> usize {
    len.div_ceil(batch_size)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| {
                let mut record = Record::new();
                record.insert("n".to_string(), serde_json::json!(i));
                record
            })
            .collect()
    }

    #[test]
    fn test_partition_sizes_and_order() {
        let records = records(120);

        let batches: Vec<&[Record]> = partition(&records, 50).collect();

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 50);
        assert_eq!(batches[1].len(), 50);
        assert_eq!(batches[2].len(), 20);
        assert_eq!(batches[0][0]["n"], 0);
        assert_eq!(batches[1][0]["n"], 50);
        assert_eq!(batches[2][0]["n"], 100);
    }

    #[test]
    fn test_partition_concatenation_is_lossless() {
        let records = records(7);

        let rebuilt: Vec<Record> = partition(&records, 3).flatten().cloned().collect();

        assert_eq!(rebuilt, records);
    }

    #[test]
    fn test_partition_empty_input_yields_no_batches() {
        let records = records(0);

        assert_eq!(partition(&records, 50).count(), 0);
    }

    #[test]
    fn test_partition_exact_multiple() {
        let records = records(100);

        let batches: Vec<&[Record]> = partition(&records, 50).collect();

        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.len() == 50));
    }

    #[test]
    fn test_batch_count() {
        assert_eq!(batch_count(0, 50), 0);
        assert_eq!(batch_count(1, 50), 1);
        assert_eq!(batch_count(50, 50), 1);
        assert_eq!(batch_count(51, 50), 2);
        assert_eq!(batch_count(120, 50), 3);
    }
}
