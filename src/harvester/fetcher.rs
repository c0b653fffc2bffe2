//! HTTP fetch worker
//!
//! One call performs one bounded retrieval: randomized client identity,
//! connect/stall/total timeouts, bounded redirects, compressed transfer,
//! and a response buffer capped at a hard ceiling with silent truncation.
//! On success the complete buffer is handed synchronously to the extraction
//! engine and the resulting batch is committed to the store.

use crate::config::FetchConfig;
use crate::extract::ExtractionEngine;
use crate::harvester::context::{cancellable_sleep, HarvestContext};
use rand::Rng;
use reqwest::{header::USER_AGENT, redirect::Policy, Client, StatusCode};
use std::time::Duration;

/// Built-in client-identity pool, used when the configuration supplies none
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:123.0) Gecko/20100101 Firefox/123.0",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:123.0) Gecko/20100101 Firefox/123.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:123.0) Gecko/20100101 Firefox/123.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 14; SM-S928B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
];

/// Result of a single fetch-and-extract pass over one source
#[derive(Debug)]
pub enum FetchOutcome {
    /// Document fetched and processed
    Success {
        /// Bytes retained after any truncation
        bytes: usize,
        /// Records newly inserted into the store
        new_records: usize,
    },

    /// Non-200 response
    HttpStatus(u16),

    /// Connection, timeout, stall or body-read failure
    Transport(String),

    /// Cancellation observed before the request was issued
    Cancelled,
}

/// Builds the shared HTTP client.
///
/// The client carries no default User-Agent; workers attach a randomly
/// chosen identity per request. Connections are pooled and reused across
/// batches.
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::limited(config.max_redirects))
        .gzip(true)
        .brotli(true)
        .tcp_keepalive(Duration::from_secs(60))
        .build()
}

/// Picks a client identity uniformly at random, falling back to the
/// built-in pool when the configured one is empty
pub fn pick_user_agent(pool: &[String]) -> &str {
    let mut rng = rand::thread_rng();
    if pool.is_empty() {
        return DEFAULT_USER_AGENTS[rng.gen_range(0..DEFAULT_USER_AGENTS.len())];
    }
    &pool[rng.gen_range(0..pool.len())]
}

/// Fetches one source endpoint and feeds the document through extraction.
///
/// Transport failures are retried up to `max_retries` times with a linear
/// backoff; a non-200 status is not retried. No failure here ever
/// propagates an error to the caller; everything lands in the outcome and
/// the stats counters.
pub async fn fetch_source(
    client: &Client,
    config: &FetchConfig,
    engine: &ExtractionEngine,
    ctx: &HarvestContext,
    user_agents: &[String],
    source: &str,
) -> FetchOutcome {
    let cancel = ctx.cancel_flag();

    // Small random delay so requests never leave in lockstep
    let jitter = {
        let mut rng = rand::thread_rng();
        Duration::from_millis(rng.gen_range(50..150))
    };
    if cancellable_sleep(jitter, &cancel).await {
        return FetchOutcome::Cancelled;
    }

    let mut attempt = 0u32;
    let response = loop {
        if cancel.is_cancelled() {
            return FetchOutcome::Cancelled;
        }

        let user_agent = pick_user_agent(user_agents).to_string();
        match client
            .get(source)
            .header(USER_AGENT, user_agent)
            .send()
            .await
        {
            Ok(response) => break response,
            Err(e) => {
                if attempt >= config.max_retries {
                    tracing::warn!("Fetch failed for {}: {}", source, e);
                    ctx.stats.record_network_error();
                    return FetchOutcome::Transport(e.to_string());
                }
                attempt += 1;
                let backoff =
                    Duration::from_millis(config.retry_backoff_ms * u64::from(attempt));
                tracing::debug!(
                    "Retrying {} in {:?} (attempt {}/{}): {}",
                    source,
                    backoff,
                    attempt,
                    config.max_retries,
                    e
                );
                if cancellable_sleep(backoff, &cancel).await {
                    return FetchOutcome::Cancelled;
                }
            }
        }
    };

    let status = response.status();
    if status != StatusCode::OK {
        tracing::debug!("HTTP {} from {}", status.as_u16(), source);
        ctx.stats.record_network_error();
        return FetchOutcome::HttpStatus(status.as_u16());
    }

    let body = match read_body_capped(response, config).await {
        Ok(body) => body,
        Err(error) => {
            tracing::warn!("Body read failed for {}: {}", source, error);
            ctx.stats.record_network_error();
            return FetchOutcome::Transport(error);
        }
    };

    ctx.stats.record_bytes(body.len() as u64);
    ctx.stats.record_source_fetched();

    let records = engine.extract(&body, source, &cancel);
    let new_records = ctx.commit_batch(records);

    if new_records > 0 {
        tracing::info!("{}: +{} new records ({} bytes)", source, new_records, body.len());
    } else {
        tracing::debug!("{}: no new records ({} bytes)", source, body.len());
    }

    FetchOutcome::Success {
        bytes: body.len(),
        new_records,
    }
}

/// Streams a response body into a buffer capped at `max_body_bytes`.
///
/// Hitting the cap truncates silently rather than failing; a chunk that
/// takes longer than the stall timeout aborts the read.
async fn read_body_capped(
    mut response: reqwest::Response,
    config: &FetchConfig,
) -> Result<Vec<u8>, String> {
    let stall = Duration::from_secs(config.stall_timeout_secs);
    let mut body: Vec<u8> = Vec::with_capacity(64 * 1024);

    loop {
        let chunk = match tokio::time::timeout(stall, response.chunk()).await {
            Err(_) => return Err("body transfer stalled".to_string()),
            Ok(Err(e)) => return Err(e.to_string()),
            Ok(Ok(None)) => break,
            Ok(Ok(Some(chunk))) => chunk,
        };

        let remaining = config.max_body_bytes.saturating_sub(body.len());
        if chunk.len() >= remaining {
            body.extend_from_slice(&chunk[..remaining]);
            break;
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}
