//! Shared harvest state: store lock, stats, and the cancellation flag
//!
//! All process-wide mutable state lives in one context object constructed
//! by the coordinator and passed down explicitly; nothing here is a global.

use crate::output::HarvestStats;
use crate::store::{DedupStore, InsertOutcome, Record};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Cooperative cancellation flag.
///
/// Polled at suspension points (between patterns, batches and cycles);
/// in-flight network calls are allowed to finish rather than being aborted.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Sleeps for up to `duration`, waking early when cancellation is requested.
///
/// Returns true if the sleep was cut short by cancellation.
pub async fn cancellable_sleep(duration: Duration, cancel: &CancelFlag) -> bool {
    const SLICE: Duration = Duration::from_millis(250);

    let mut remaining = duration;
    while remaining > Duration::ZERO {
        if cancel.is_cancelled() {
            return true;
        }
        let step = remaining.min(SLICE);
        tokio::time::sleep(step).await;
        remaining = remaining.saturating_sub(step);
    }
    cancel.is_cancelled()
}

/// Cross-stage shared state for one harvest run
pub struct HarvestContext {
    store: Mutex<DedupStore>,
    pub stats: HarvestStats,
    cancel: CancelFlag,
}

impl HarvestContext {
    pub fn new(store_capacity: usize) -> Self {
        Self {
            store: Mutex::new(DedupStore::new(store_capacity)),
            stats: HarvestStats::new(),
            cancel: CancelFlag::new(),
        }
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Inserts one document's extracted batch under the store lock.
    ///
    /// The batch arrives pre-deduplicated within itself; the store's own
    /// hash check remains the uniqueness guarantee across documents and
    /// workers. Returns the number of records actually inserted.
    pub fn commit_batch(&self, records: Vec<Record>) -> usize {
        if records.is_empty() {
            return 0;
        }

        let total = records.len() as u64;
        let mut inserted = 0u64;
        let mut duplicates = 0u64;
        let mut rejected_full = 0u64;

        {
            let mut store = self.store.lock().unwrap();
            for record in records {
                match store.insert(record) {
                    InsertOutcome::Inserted => inserted += 1,
                    InsertOutcome::Duplicate => duplicates += 1,
                    InsertOutcome::Full => rejected_full += 1,
                }
            }
        }

        self.stats.record_candidates(total);
        self.stats.record_unique(inserted);
        self.stats.record_duplicates(duplicates);
        if rejected_full > 0 {
            self.stats.record_capacity_rejected(rejected_full);
            tracing::warn!("Store at capacity, {} records dropped", rejected_full);
        }

        inserted as usize
    }

    /// Copies the current records out under the store lock
    pub fn snapshot_store(&self) -> Vec<Record> {
        self.store.lock().unwrap().snapshot()
    }

    /// Current number of unique stored records
    pub fn store_len(&self) -> usize {
        self.store.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "deadbeefdeadbeefdeadbeefdeadbeef";

    fn test_record(server: &str) -> Record {
        Record::new(server.to_string(), "443".to_string(), SECRET.to_string(), "test")
    }

    #[test]
    fn test_cancel_flag_shared_across_clones() {
        let flag = CancelFlag::new();
        let clone = flag.clone();

        assert!(!clone.is_cancelled());
        flag.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_commit_batch_counts_outcomes() {
        let ctx = HarvestContext::new(10);

        let inserted = ctx.commit_batch(vec![test_record("1.1.1.1"), test_record("2.2.2.2")]);
        assert_eq!(inserted, 2);

        // Same records again are duplicates
        let inserted = ctx.commit_batch(vec![test_record("1.1.1.1")]);
        assert_eq!(inserted, 0);

        let snapshot = ctx.stats.snapshot();
        assert_eq!(snapshot.unique_records, 2);
        assert_eq!(snapshot.duplicates_rejected, 1);
        assert_eq!(snapshot.candidates_processed, 3);
        assert_eq!(ctx.store_len(), 2);
    }

    #[test]
    fn test_commit_batch_at_capacity() {
        let ctx = HarvestContext::new(1);

        let inserted = ctx.commit_batch(vec![test_record("1.1.1.1"), test_record("2.2.2.2")]);
        assert_eq!(inserted, 1);
        assert_eq!(ctx.stats.snapshot().capacity_rejected, 1);
        assert_eq!(ctx.store_len(), 1);
    }

    #[tokio::test]
    async fn test_cancellable_sleep_returns_early() {
        let cancel = CancelFlag::new();
        cancel.cancel();

        let start = std::time::Instant::now();
        let cut_short = cancellable_sleep(Duration::from_secs(30), &cancel).await;
        assert!(cut_short);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_cancellable_sleep_full_duration() {
        let cancel = CancelFlag::new();
        let cut_short = cancellable_sleep(Duration::from_millis(50), &cancel).await;
        assert!(!cut_short);
    }
}
