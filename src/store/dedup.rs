//! Capacity-bounded, hash-indexed record store
//!
//! The store guarantees at-most-one entry per content hash and never grows
//! past its configured capacity. It is intentionally not thread-safe by
//! itself; the coordinator wraps it in a single coarse mutex and all
//! writers go through that lock.

use crate::store::Record;
use std::collections::HashSet;

/// Outcome of a single insert attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The record was appended
    Inserted,
    /// A record with the same content hash already exists; nothing changed
    Duplicate,
    /// The store is at capacity; nothing changed
    Full,
}

/// Bounded ordered collection of unique records.
///
/// Uniqueness is keyed on the 64-bit content hash, looked up through a hash
/// index for O(1) inserts instead of a linear scan over the record list.
pub struct DedupStore {
    records: Vec<Record>,
    index: HashSet<u64>,
    capacity: usize,
}

impl DedupStore {
    /// Creates an empty store holding at most `capacity` records
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Vec::new(),
            index: HashSet::new(),
            capacity,
        }
    }

    /// Attempts to insert a record.
    ///
    /// The duplicate check precedes the capacity check, so re-inserting an
    /// existing record into a full store reports `Duplicate`, not `Full`.
    pub fn insert(&mut self, record: Record) -> InsertOutcome {
        if self.index.contains(&record.hash) {
            return InsertOutcome::Duplicate;
        }
        if self.records.len() >= self.capacity {
            return InsertOutcome::Full;
        }

        self.index.insert(record.hash);
        self.records.push(record);
        InsertOutcome::Inserted
    }

    /// Whether a record with this content hash is present
    pub fn contains_hash(&self, hash: u64) -> bool {
        self.index.contains(&hash)
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copies out the current records, in insertion order.
    ///
    /// Checkpointing snapshots under the store lock and serializes the copy
    /// after releasing it, so a writer never observes a partial insert.
    pub fn snapshot(&self) -> Vec<Record> {
        self.records.clone()
    }
}
