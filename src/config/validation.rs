use crate::config::types::{CheckpointConfig, Config, FetchConfig, HarvesterConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_harvester_config(&config.harvester)?;
    validate_fetch_config(&config.fetch)?;
    validate_checkpoint_config(&config.checkpoint)?;
    validate_sources(&config.sources)?;
    validate_user_agents(&config.user_agents)?;
    validate_extra_patterns(&config.extra_patterns)?;
    Ok(())
}

/// Validates harvester configuration
fn validate_harvester_config(config: &HarvesterConfig) -> Result<(), ConfigError> {
    if config.concurrency_limit < 1 || config.concurrency_limit > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency_limit must be between 1 and 100, got {}",
            config.concurrency_limit
        )));
    }

    if config.store_capacity < 1 {
        return Err(ConfigError::Validation(
            "store_capacity must be >= 1".to_string(),
        ));
    }

    if config.candidate_budget < 1 {
        return Err(ConfigError::Validation(
            "candidate_budget must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.stall_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "stall_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.max_body_bytes < 1024 {
        return Err(ConfigError::Validation(format!(
            "max_body_bytes must be >= 1024, got {}",
            config.max_body_bytes
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

/// Validates checkpoint configuration
fn validate_checkpoint_config(config: &CheckpointConfig) -> Result<(), ConfigError> {
    if config.json_path.is_empty() {
        return Err(ConfigError::Validation(
            "json_path cannot be empty".to_string(),
        ));
    }

    if config.list_path.is_empty() {
        return Err(ConfigError::Validation(
            "list_path cannot be empty".to_string(),
        ));
    }

    if config.interval_secs < 1 {
        return Err(ConfigError::Validation(
            "interval_secs must be >= 1".to_string(),
        ));
    }

    if config.stats_interval_secs < 1 {
        return Err(ConfigError::Validation(
            "stats_interval_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the source endpoint list
fn validate_sources(sources: &[String]) -> Result<(), ConfigError> {
    if sources.is_empty() {
        return Err(ConfigError::Validation(
            "at least one source endpoint is required".to_string(),
        ));
    }

    for source in sources {
        let url = Url::parse(source)
            .map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", source, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "'{}': scheme must be http or https",
                source
            )));
        }
    }

    Ok(())
}

/// Validates the client-identity pool
fn validate_user_agents(user_agents: &[String]) -> Result<(), ConfigError> {
    for ua in user_agents {
        if ua.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user-agents entries cannot be empty".to_string(),
            ));
        }
    }
    Ok(())
}

/// Validates extra extraction patterns
///
/// Each pattern must compile and expose exactly three capture groups
/// (host, port, secret in that order).
fn validate_extra_patterns(patterns: &[String]) -> Result<(), ConfigError> {
    for pattern in patterns {
        let compiled = crate::extract::compile_pattern(pattern)
            .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))?;

        // captures_len includes the implicit whole-match group
        if compiled.captures_len() != 4 {
            return Err(ConfigError::InvalidPattern(format!(
                "'{}': expected 3 capture groups, got {}",
                pattern,
                compiled.captures_len() - 1
            )));
        }
    }
    Ok(())
}
