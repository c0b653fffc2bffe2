//! Harvest coordinator - top-level orchestration
//!
//! The coordinator constructs the shared context, compiles the extraction
//! engine, builds the HTTP client, and then drives three concerns: the
//! scheduler's sweep loop, a periodic checkpoint task, and a periodic
//! statistics rendering. Initialization failures here are the only fatal
//! errors in the system; once running, nothing short of cancellation stops
//! a harvest.

use crate::config::Config;
use crate::extract::ExtractionEngine;
use crate::harvester::context::{cancellable_sleep, CancelFlag, HarvestContext};
use crate::harvester::fetcher::{build_http_client, DEFAULT_USER_AGENTS};
use crate::harvester::scheduler::Scheduler;
use crate::output::{print_statistics, CheckpointWriter};
use crate::{HarvestError, Result};
use std::sync::Arc;
use std::time::Duration;

/// Main harvest coordinator
pub struct Coordinator {
    ctx: Arc<HarvestContext>,
    scheduler: Scheduler,
    writer: Arc<CheckpointWriter>,
    checkpoint_interval: Duration,
    stats_interval: Duration,
}

impl Coordinator {
    /// Creates a coordinator from a validated configuration.
    ///
    /// Everything that can fail fatally fails here, before any worker
    /// starts: pattern compilation, HTTP client construction, store
    /// allocation.
    pub fn new(config: Config) -> Result<Self> {
        let engine = Arc::new(ExtractionEngine::new(
            &config.extra_patterns,
            config.harvester.candidate_budget,
        )?);

        let client = build_http_client(&config.fetch).map_err(HarvestError::Reqwest)?;

        let ctx = Arc::new(HarvestContext::new(config.harvester.store_capacity));

        let user_agents: Vec<String> = if config.user_agents.is_empty() {
            DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect()
        } else {
            config.user_agents.clone()
        };

        let writer = Arc::new(CheckpointWriter::new(&config.checkpoint));

        tracing::info!(
            "Initialized: {} sources, {} patterns, capacity {}, concurrency {}",
            config.sources.len(),
            engine.pattern_count(),
            config.harvester.store_capacity,
            config.harvester.concurrency_limit
        );

        let scheduler = Scheduler::new(
            config.harvester.clone(),
            Arc::new(config.fetch.clone()),
            Arc::new(config.sources.clone()),
            Arc::new(user_agents),
            client,
            Arc::clone(&engine),
            Arc::clone(&ctx),
        );

        Ok(Self {
            ctx,
            scheduler,
            writer,
            checkpoint_interval: Duration::from_secs(config.checkpoint.interval_secs),
            stats_interval: Duration::from_secs(config.checkpoint.stats_interval_secs),
        })
    }

    /// Handle for external cancellation (signal wiring lives in the binary)
    pub fn cancel_flag(&self) -> CancelFlag {
        self.ctx.cancel_flag()
    }

    /// Runs the harvest until cancellation, then shuts down cleanly:
    /// in-flight fetches finish, a final checkpoint is written, and final
    /// statistics are printed.
    pub async fn run(&self) -> Result<()> {
        // Artifacts exist from the first moment, even before any record
        self.write_checkpoint()?;

        let checkpoint_task = {
            let ctx = Arc::clone(&self.ctx);
            let writer = Arc::clone(&self.writer);
            let interval = self.checkpoint_interval;
            tokio::spawn(async move {
                let cancel = ctx.cancel_flag();
                loop {
                    if cancellable_sleep(interval, &cancel).await {
                        break;
                    }
                    let records = ctx.snapshot_store();
                    let stats = ctx.stats.snapshot();
                    if let Err(e) = writer.write(&records, &stats) {
                        tracing::error!("Periodic checkpoint failed: {}", e);
                    }
                }
            })
        };

        let stats_task = {
            let ctx = Arc::clone(&self.ctx);
            let interval = self.stats_interval;
            tokio::spawn(async move {
                let cancel = ctx.cancel_flag();
                loop {
                    if cancellable_sleep(interval, &cancel).await {
                        break;
                    }
                    print_statistics(&ctx.stats.snapshot());
                }
            })
        };

        // The sweep loop only returns once cancellation is observed and
        // every in-flight batch has joined.
        self.scheduler.run().await;

        if let Err(e) = checkpoint_task.await {
            tracing::error!("Checkpoint task failed to join: {}", e);
        }
        if let Err(e) = stats_task.await {
            tracing::error!("Stats task failed to join: {}", e);
        }

        tracing::info!("Writing final checkpoint");
        self.write_checkpoint()?;

        let final_stats = self.ctx.stats.snapshot();
        print_statistics(&final_stats);
        tracing::info!(
            "Harvest finished: {} unique records across {} cycles",
            final_stats.unique_records,
            final_stats.completed_cycles
        );

        Ok(())
    }

    fn write_checkpoint(&self) -> Result<()> {
        let records = self.ctx.snapshot_store();
        let stats = self.ctx.stats.snapshot();
        self.writer.write(&records, &stats)
    }
}

/// Runs a complete harvest with the given configuration.
///
/// This is the main library entry point; it blocks until the coordinator's
/// cancellation flag is raised (the binary wires it to SIGINT/SIGTERM).
pub async fn run_harvest(config: Config) -> Result<()> {
    let coordinator = Coordinator::new(config)?;
    coordinator.run().await
}
