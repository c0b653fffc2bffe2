//! Batch scheduler: drives repeated sweeps over the source list
//!
//! Sources are processed in consecutive batches of at most the configured
//! concurrency limit. One task is spawned per source with a small staggered
//! launch delay, then the whole batch is joined before the next one starts.
//! The full barrier between batches caps instantaneous concurrency exactly
//! at the limit and doubles as the primary traffic-pacing mechanism, so it
//! is kept deliberately. Cancellation is checked between batches and
//! between cycles; a failed fetch never aborts its batch or the cycle.

use crate::config::{FetchConfig, HarvesterConfig};
use crate::extract::ExtractionEngine;
use crate::harvester::context::{cancellable_sleep, HarvestContext};
use crate::harvester::fetcher::{fetch_source, FetchOutcome};
use rand::Rng;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

pub struct Scheduler {
    config: HarvesterConfig,
    fetch_config: Arc<FetchConfig>,
    sources: Arc<Vec<String>>,
    user_agents: Arc<Vec<String>>,
    client: Client,
    engine: Arc<ExtractionEngine>,
    ctx: Arc<HarvestContext>,
}

impl Scheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: HarvesterConfig,
        fetch_config: Arc<FetchConfig>,
        sources: Arc<Vec<String>>,
        user_agents: Arc<Vec<String>>,
        client: Client,
        engine: Arc<ExtractionEngine>,
        ctx: Arc<HarvestContext>,
    ) -> Self {
        Self {
            config,
            fetch_config,
            sources,
            user_agents,
            client,
            engine,
            ctx,
        }
    }

    /// Runs sweep cycles until cancellation is observed.
    ///
    /// Each cycle visits every configured source once, then sleeps the
    /// inter-cycle delay before starting over.
    pub async fn run(&self) {
        let cancel = self.ctx.cancel_flag();
        let mut cycle = 0u64;

        while !self.ctx.is_cancelled() {
            cycle += 1;
            tracing::info!("Starting cycle #{} ({} sources)", cycle, self.sources.len());

            let before = self.ctx.store_len();
            self.run_cycle().await;
            self.ctx.stats.record_cycle_completed();

            let gained = self.ctx.store_len().saturating_sub(before);
            if gained > 0 {
                tracing::info!("Cycle #{}: +{} new records", cycle, gained);
            } else {
                tracing::info!("Cycle #{}: no new records", cycle);
            }

            if self.ctx.is_cancelled() {
                break;
            }

            let delay = Duration::from_secs(self.config.cycle_delay_secs);
            tracing::debug!("Pausing {:?} before next cycle", delay);
            if cancellable_sleep(delay, &cancel).await {
                break;
            }
        }

        tracing::info!("Scheduler stopped after {} cycles", cycle);
    }

    /// Performs one full sweep over the source list in joined batches
    async fn run_cycle(&self) {
        let batch_size = self.config.concurrency_limit as usize;

        for batch in self.sources.chunks(batch_size) {
            if self.ctx.is_cancelled() {
                break;
            }
            self.run_batch(batch).await;
        }
    }

    /// Launches one task per source in the batch and joins them all.
    ///
    /// Launches are staggered by a small random delay so a batch never
    /// opens every connection in the same instant.
    async fn run_batch(&self, batch: &[String]) {
        let mut tasks: JoinSet<()> = JoinSet::new();

        for source in batch {
            let client = self.client.clone();
            let fetch_config = Arc::clone(&self.fetch_config);
            let engine = Arc::clone(&self.engine);
            let ctx = Arc::clone(&self.ctx);
            let user_agents = Arc::clone(&self.user_agents);
            let source = source.clone();

            ctx.stats.worker_started();
            tasks.spawn(async move {
                let outcome = fetch_source(
                    &client,
                    &fetch_config,
                    &engine,
                    &ctx,
                    &user_agents,
                    &source,
                )
                .await;

                if let FetchOutcome::Transport(error) = &outcome {
                    tracing::debug!("{}: transport failure: {}", source, error);
                }

                ctx.stats.worker_finished();
            });

            let stagger = {
                let mut rng = rand::thread_rng();
                Duration::from_millis(rng.gen_range(10..25))
            };
            tokio::time::sleep(stagger).await;
        }

        // Full barrier: the next batch never starts before this one joins
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                tracing::error!("Fetch task panicked: {}", e);
            }
        }
    }
}
