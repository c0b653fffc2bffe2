//! mtharvest: an autonomous MTProto proxy harvester
//!
//! This crate continuously sweeps a configured list of public sources,
//! extracts proxy connection records (server, port, secret) from wildly
//! inconsistent text formats, deduplicates them by content hash, and
//! periodically checkpoints the accumulated set to flat-file artifacts.

pub mod config;
pub mod extract;
pub mod harvester;
pub mod output;
pub mod store;

use thiserror::Error;

/// Main error type for mtharvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Pattern compile error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Checkpoint serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid source URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid extraction pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias for mtharvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use harvester::{run_harvest, CancelFlag, Coordinator};
pub use store::{DedupStore, InsertOutcome, Record};
