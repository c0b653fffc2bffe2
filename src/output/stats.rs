//! Cross-cutting harvest statistics
//!
//! Every pipeline stage bumps these counters without taking a lock. All
//! cumulative counters are monotonically non-decreasing for the process
//! lifetime; the active-worker gauge is the sole exception.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Instant;

/// Atomically-updated counters shared by all pipeline stages
pub struct HarvestStats {
    started: Instant,
    sources_fetched: AtomicU64,
    candidates_processed: AtomicU64,
    network_errors: AtomicU64,
    unique_records: AtomicU64,
    duplicates_rejected: AtomicU64,
    capacity_rejected: AtomicU64,
    bytes_transferred: AtomicU64,
    active_workers: AtomicI64,
    completed_cycles: AtomicU64,
}

/// Point-in-time copy of the counters, used for rendering and checkpoints
#[derive(Debug, Clone, Copy)]
pub struct StatsSnapshot {
    pub uptime_secs: u64,
    pub sources_fetched: u64,
    pub candidates_processed: u64,
    pub network_errors: u64,
    pub unique_records: u64,
    pub duplicates_rejected: u64,
    pub capacity_rejected: u64,
    pub bytes_transferred: u64,
    pub active_workers: i64,
    pub completed_cycles: u64,
}

impl HarvestStats {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            sources_fetched: AtomicU64::new(0),
            candidates_processed: AtomicU64::new(0),
            network_errors: AtomicU64::new(0),
            unique_records: AtomicU64::new(0),
            duplicates_rejected: AtomicU64::new(0),
            capacity_rejected: AtomicU64::new(0),
            bytes_transferred: AtomicU64::new(0),
            active_workers: AtomicI64::new(0),
            completed_cycles: AtomicU64::new(0),
        }
    }

    pub fn record_source_fetched(&self) {
        self.sources_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_candidates(&self, count: u64) {
        self.candidates_processed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_network_error(&self) {
        self.network_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unique(&self, count: u64) {
        self.unique_records.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_duplicates(&self, count: u64) {
        self.duplicates_rejected.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_capacity_rejected(&self, count: u64) {
        self.capacity_rejected.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_bytes(&self, count: u64) {
        self.bytes_transferred.fetch_add(count, Ordering::Relaxed);
    }

    pub fn worker_started(&self) {
        self.active_workers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn worker_finished(&self) {
        self.active_workers.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn record_cycle_completed(&self) {
        self.completed_cycles.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            uptime_secs: self.started.elapsed().as_secs(),
            sources_fetched: self.sources_fetched.load(Ordering::Relaxed),
            candidates_processed: self.candidates_processed.load(Ordering::Relaxed),
            network_errors: self.network_errors.load(Ordering::Relaxed),
            unique_records: self.unique_records.load(Ordering::Relaxed),
            duplicates_rejected: self.duplicates_rejected.load(Ordering::Relaxed),
            capacity_rejected: self.capacity_rejected.load(Ordering::Relaxed),
            bytes_transferred: self.bytes_transferred.load(Ordering::Relaxed),
            active_workers: self.active_workers.load(Ordering::Relaxed),
            completed_cycles: self.completed_cycles.load(Ordering::Relaxed),
        }
    }
}

impl Default for HarvestStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders a snapshot as the operator-facing statistics block
pub fn render_statistics(snapshot: &StatsSnapshot) -> String {
    let hours = snapshot.uptime_secs / 3600;
    let minutes = (snapshot.uptime_secs % 3600) / 60;
    let seconds = snapshot.uptime_secs % 60;
    let mb_transferred = snapshot.bytes_transferred as f64 / (1024.0 * 1024.0);

    let mut out = String::new();
    out.push_str("=== Harvest Statistics ===\n");
    out.push_str(&format!("Uptime: {:02}:{:02}:{:02}\n", hours, minutes, seconds));
    out.push_str(&format!("Unique records: {}\n", snapshot.unique_records));
    out.push_str(&format!(
        "Candidates processed: {}\n",
        snapshot.candidates_processed
    ));
    out.push_str(&format!(
        "Duplicates rejected: {}\n",
        snapshot.duplicates_rejected
    ));
    if snapshot.capacity_rejected > 0 {
        out.push_str(&format!(
            "Rejected at capacity: {}\n",
            snapshot.capacity_rejected
        ));
    }
    out.push_str(&format!("Sources fetched: {}\n", snapshot.sources_fetched));
    out.push_str(&format!("Data transferred: {:.2} MB\n", mb_transferred));
    out.push_str(&format!("Network errors: {}\n", snapshot.network_errors));
    out.push_str(&format!("Active workers: {}\n", snapshot.active_workers));
    out.push_str(&format!("Completed cycles: {}\n", snapshot.completed_cycles));
    out.push_str("==========================");
    out
}

/// Prints the statistics block to stdout
pub fn print_statistics(snapshot: &StatsSnapshot) {
    println!("\n{}\n", render_statistics(snapshot));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = HarvestStats::new();

        stats.record_source_fetched();
        stats.record_source_fetched();
        stats.record_candidates(5);
        stats.record_unique(3);
        stats.record_duplicates(2);
        stats.record_bytes(1024);
        stats.record_network_error();
        stats.record_cycle_completed();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.sources_fetched, 2);
        assert_eq!(snapshot.candidates_processed, 5);
        assert_eq!(snapshot.unique_records, 3);
        assert_eq!(snapshot.duplicates_rejected, 2);
        assert_eq!(snapshot.bytes_transferred, 1024);
        assert_eq!(snapshot.network_errors, 1);
        assert_eq!(snapshot.completed_cycles, 1);
    }

    #[test]
    fn test_worker_gauge_goes_both_ways() {
        let stats = HarvestStats::new();

        stats.worker_started();
        stats.worker_started();
        assert_eq!(stats.snapshot().active_workers, 2);

        stats.worker_finished();
        stats.worker_finished();
        assert_eq!(stats.snapshot().active_workers, 0);
    }

    #[test]
    fn test_concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(HarvestStats::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let stats = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    stats.record_unique(1);
                    stats.record_bytes(10);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.unique_records, 8000);
        assert_eq!(snapshot.bytes_transferred, 80000);
    }

    #[test]
    fn test_render_statistics_contains_totals() {
        let stats = HarvestStats::new();
        stats.record_unique(7);
        stats.record_network_error();

        let rendered = render_statistics(&stats.snapshot());
        assert!(rendered.contains("Unique records: 7"));
        assert!(rendered.contains("Network errors: 1"));
        assert!(rendered.contains("Uptime:"));
    }
}
