//! Harvester module: fetch workers, batch scheduling and orchestration
//!
//! This module contains the concurrent core of the system:
//! - HTTP fetch workers with identity rotation and capped buffering
//! - The batch scheduler with its full join barrier per batch
//! - The coordinator that owns shared state and periodic tasks
//! - Cooperative cancellation plumbing

mod context;
mod coordinator;
mod fetcher;
mod scheduler;

pub use context::{cancellable_sleep, CancelFlag, HarvestContext};
pub use coordinator::{run_harvest, Coordinator};
pub use fetcher::{build_http_client, fetch_source, FetchOutcome, DEFAULT_USER_AGENTS};
pub use scheduler::Scheduler;
