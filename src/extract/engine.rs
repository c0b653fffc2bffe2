//! Extraction engine: runs the pattern bank over fetched documents
//!
//! One engine is built at startup (patterns compile once) and shared by all
//! fetch workers. Extraction is purely CPU-bound and runs to completion on
//! a document apart from cancellation checks between patterns.

use crate::extract::patterns::{compile_pattern, BUILTIN_PATTERNS};
use crate::extract::sanitize::{
    sanitize, strip_label, PORT_LABELS, SECRET_LABELS, SERVER_LABELS,
};
use crate::extract::validate::validate;
use crate::harvester::CancelFlag;
use crate::store::Record;
use crate::HarvestError;
use regex::bytes::Regex;
use std::collections::HashSet;

/// Raw span bounds applied before any sanitization.
///
/// These bound per-match copy cost; the real contracts are enforced by
/// validation after cleanup.
const MAX_HOST_SPAN: usize = 255;
const MAX_PORT_SPAN: usize = 15;
const MIN_SECRET_SPAN: usize = 16;
const MAX_SECRET_SPAN: usize = 511;

/// An unvalidated (server, port, secret) triple produced by one pattern.
///
/// Candidates only exist between extraction and validation; a validated
/// candidate is immediately promoted to a [`Record`].
#[derive(Debug, Clone)]
pub struct Candidate {
    pub server: String,
    pub port: String,
    pub secret: String,
    /// Index of the pattern that produced this candidate
    pub pattern: usize,
    /// Source endpoint the document was fetched from
    pub source: String,
}

/// The extraction engine with its compiled, fixed-priority pattern bank
pub struct ExtractionEngine {
    patterns: Vec<Regex>,
    candidate_budget: usize,
}

impl ExtractionEngine {
    /// Builds the engine from the built-in bank plus any extra patterns.
    ///
    /// Extra patterns run after the built-in bank in the order given.
    pub fn new(extra_patterns: &[String], candidate_budget: usize) -> Result<Self, HarvestError> {
        let mut patterns = Vec::with_capacity(BUILTIN_PATTERNS.len() + extra_patterns.len());
        for pattern in BUILTIN_PATTERNS {
            patterns.push(compile_pattern(pattern)?);
        }
        for pattern in extra_patterns {
            patterns.push(compile_pattern(pattern)?);
        }

        Ok(Self {
            patterns,
            candidate_budget,
        })
    }

    /// Number of patterns in the bank
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Extracts all valid records from one document.
    ///
    /// Every pattern scans the whole document left-to-right for
    /// non-overlapping matches; a per-document candidate budget bounds the
    /// worst case on adversarial input. The returned batch is already
    /// deduplicated by content hash within this document, purely so callers
    /// hold the store lock for fewer inserts; the store performs its own
    /// duplicate check regardless.
    pub fn extract(&self, content: &[u8], source: &str, cancel: &CancelFlag) -> Vec<Record> {
        let mut records: Vec<Record> = Vec::new();
        let mut seen_hashes: HashSet<u64> = HashSet::new();
        let mut budget = self.candidate_budget;

        for (pattern_index, pattern) in self.patterns.iter().enumerate() {
            if cancel.is_cancelled() || budget == 0 {
                break;
            }

            let mut pattern_matches = 0usize;
            let mut pos = 0usize;

            while pos < content.len() && budget > 0 {
                let caps = match pattern.captures_at(content, pos) {
                    Some(caps) => caps,
                    None => break,
                };

                // Advance past the whole match; patterns never match empty
                let match_end = caps.get(0).map(|m| m.end()).unwrap_or(content.len());
                pos = match_end.max(pos + 1);
                budget -= 1;

                let candidate = match candidate_from_captures(&caps, pattern_index, source) {
                    Some(c) => c,
                    None => continue,
                };

                if !validate(&candidate.server, &candidate.port, &candidate.secret) {
                    continue;
                }

                let record = Record::new(
                    candidate.server,
                    candidate.port,
                    candidate.secret,
                    &candidate.source,
                );

                if seen_hashes.insert(record.hash) {
                    tracing::debug!(
                        "Found record {}:{} from pattern {}",
                        record.server,
                        record.port,
                        pattern_index
                    );
                    records.push(record);
                    pattern_matches += 1;
                }
            }

            if pattern_matches > 0 {
                tracing::debug!(
                    "Pattern {}: {} new records in document from {}",
                    pattern_index,
                    pattern_matches,
                    source
                );
            }
        }

        records
    }
}

/// Turns one regex match into a sanitized candidate, or None when a capture
/// is missing or a raw span falls outside the field bounds.
fn candidate_from_captures(
    caps: &regex::bytes::Captures<'_>,
    pattern_index: usize,
    source: &str,
) -> Option<Candidate> {
    let raw_server = caps.get(1)?.as_bytes();
    let raw_port = caps.get(2)?.as_bytes();
    let raw_secret = caps.get(3)?.as_bytes();

    if raw_server.is_empty() || raw_server.len() > MAX_HOST_SPAN {
        return None;
    }
    if raw_port.is_empty() || raw_port.len() > MAX_PORT_SPAN {
        return None;
    }
    if raw_secret.len() < MIN_SECRET_SPAN || raw_secret.len() > MAX_SECRET_SPAN {
        return None;
    }

    let server = strip_label(&sanitize(&String::from_utf8_lossy(raw_server)), SERVER_LABELS);
    let port = strip_label(&sanitize(&String::from_utf8_lossy(raw_port)), PORT_LABELS);
    let secret = strip_label(&sanitize(&String::from_utf8_lossy(raw_secret)), SECRET_LABELS);

    Some(Candidate {
        server,
        port,
        secret,
        pattern: pattern_index,
        source: source.to_string(),
    })
}
