use serde::Deserialize;

/// Main configuration structure for mtharvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub harvester: HarvesterConfig,
    pub fetch: FetchConfig,
    pub checkpoint: CheckpointConfig,
    /// Ordered list of source endpoints to sweep each cycle
    pub sources: Vec<String>,
    /// Pool of client-identity strings; the built-in pool is used when empty
    #[serde(rename = "user-agents", default)]
    pub user_agents: Vec<String>,
    /// Extra extraction patterns appended after the built-in bank
    #[serde(rename = "extra-patterns", default)]
    pub extra_patterns: Vec<String>,
}

/// Harvester behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HarvesterConfig {
    /// Maximum number of concurrent fetches per batch
    #[serde(rename = "concurrency-limit")]
    pub concurrency_limit: u32,

    /// Maximum number of unique records held in the store
    #[serde(rename = "store-capacity")]
    pub store_capacity: usize,

    /// Pause between full sweeps over the source list (seconds)
    #[serde(rename = "cycle-delay-secs")]
    pub cycle_delay_secs: u64,

    /// Maximum candidates extracted from a single document
    #[serde(rename = "candidate-budget")]
    pub candidate_budget: usize,
}

/// HTTP fetch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Total request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Connect timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Maximum wait for a single body chunk (seconds)
    #[serde(rename = "stall-timeout-secs")]
    pub stall_timeout_secs: u64,

    /// Maximum redirect hops to follow
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,

    /// Hard ceiling on the response buffer; excess is truncated
    #[serde(rename = "max-body-bytes")]
    pub max_body_bytes: usize,

    /// Retry attempts after a transport failure
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Base backoff between retries (milliseconds, scales linearly)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,
}

/// Checkpoint and statistics output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CheckpointConfig {
    /// Path to the structured JSON artifact
    #[serde(rename = "json-path")]
    pub json_path: String,

    /// Path to the plain connection-URL list artifact
    #[serde(rename = "list-path")]
    pub list_path: String,

    /// Seconds between periodic checkpoints
    #[serde(rename = "interval-secs")]
    pub interval_secs: u64,

    /// Seconds between statistics renderings
    #[serde(rename = "stats-interval-secs")]
    pub stats_interval_secs: u64,
}
