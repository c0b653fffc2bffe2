//! Configuration module for mtharvest
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files describing the source endpoints, fetch behavior, concurrency and
//! checkpoint output of a harvest run.

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CheckpointConfig, Config, FetchConfig, HarvesterConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
