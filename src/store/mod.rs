//! Record storage: the dedup store and the record type it holds

mod dedup;
mod record;

pub use dedup::{DedupStore, InsertOutcome};
pub use record::{content_hash, Record};
