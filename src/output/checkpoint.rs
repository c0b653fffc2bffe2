//! Checkpoint writer: durable flat-file snapshots of the store
//!
//! Two artifacts are produced on every checkpoint:
//! - a structured JSON file carrying schema version, aggregate counters and
//!   every active record with all fields plus a hex-encoded hash
//! - a plain list of the composite connection URLs with a small header of
//!   summary counters
//!
//! Callers snapshot the store under its lock and hand the copy here, so
//! serialization never observes a partial insert and never holds the store
//! lock. The artifact files themselves are guarded by their own mutex.

use crate::config::CheckpointConfig;
use crate::output::stats::StatsSnapshot;
use crate::store::Record;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Schema version stamped into the structured artifact
pub const CHECKPOINT_VERSION: &str = "2.0";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The structured checkpoint artifact
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckpointFile {
    pub version: String,
    pub updated: String,
    pub total_proxies: usize,
    pub unique_proxies: u64,
    pub sources_processed: u64,
    pub proxies: Vec<CheckpointEntry>,
}

/// One active record as serialized into the structured artifact
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckpointEntry {
    pub server: String,
    pub port: String,
    pub secret: String,
    pub url: String,
    pub source: String,
    #[serde(rename = "type")]
    pub server_type: String,
    pub country: String,
    pub speed_score: u8,
    pub discovered: String,
    pub last_verified: String,
    pub hash: String,
}

impl CheckpointEntry {
    fn from_record(record: &Record) -> Self {
        Self {
            server: record.server.clone(),
            port: record.port.clone(),
            secret: record.secret.clone(),
            url: record.connection_url.clone(),
            source: record.source.clone(),
            server_type: record.server_type.as_str().to_string(),
            country: record.country.to_string(),
            speed_score: record.speed_score,
            discovered: format_timestamp(record.discovered),
            last_verified: format_timestamp(record.last_verified),
            hash: format!("{:016x}", record.hash),
        }
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Writes checkpoint artifacts to a fixed pair of paths
pub struct CheckpointWriter {
    json_path: PathBuf,
    list_path: PathBuf,
    // Serializes writers against each other; the store lock is separate
    file_guard: Mutex<()>,
}

impl CheckpointWriter {
    pub fn new(config: &CheckpointConfig) -> Self {
        Self {
            json_path: PathBuf::from(&config.json_path),
            list_path: PathBuf::from(&config.list_path),
            file_guard: Mutex::new(()),
        }
    }

    /// Writes both artifacts from a store snapshot and a stats snapshot
    pub fn write(&self, records: &[Record], stats: &StatsSnapshot) -> Result<()> {
        let active: Vec<&Record> = records.iter().filter(|r| r.active).collect();
        let updated = format_timestamp(Utc::now());

        let checkpoint = CheckpointFile {
            version: CHECKPOINT_VERSION.to_string(),
            updated: updated.clone(),
            total_proxies: records.len(),
            unique_proxies: stats.unique_records,
            sources_processed: stats.sources_fetched,
            proxies: active.iter().map(|r| CheckpointEntry::from_record(r)).collect(),
        };
        let json = serde_json::to_string_pretty(&checkpoint)?;

        let mut list = String::new();
        list.push_str("# MTPROTO PROXY LIST\n");
        list.push_str(&format!("# Updated: {}\n", updated));
        list.push_str(&format!("# Total proxies: {}\n", records.len()));
        list.push_str(&format!("# Sources: {} URLs processed\n", stats.sources_fetched));
        list.push_str(&format!("# Unique proxies: {}\n\n", stats.unique_records));
        for record in &active {
            list.push_str(&record.connection_url);
            list.push('\n');
        }

        let _guard = self.file_guard.lock().unwrap();
        std::fs::write(&self.json_path, json)?;
        std::fs::write(&self.list_path, list)?;

        tracing::info!(
            "Checkpoint written: {} records to {} and {}",
            active.len(),
            self.json_path.display(),
            self.list_path.display()
        );

        Ok(())
    }
}

/// Reads the structured artifact back
pub fn load_checkpoint(path: &Path) -> Result<CheckpointFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Reads the connection URLs back from the plain-list artifact, skipping
/// the header comments and blank lines
pub fn load_plain_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
