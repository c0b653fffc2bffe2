//! Extraction module: pattern bank, sanitization and validation
//!
//! This module turns raw fetched documents into validated proxy records:
//! - An ordered bank of heuristic patterns, each yielding (host, port, secret)
//! - Sanitization of greedy captures (whitespace, control bytes, labels)
//! - Syntactic validation and server-type classification

mod engine;
mod patterns;
mod sanitize;
mod validate;

pub use engine::{Candidate, ExtractionEngine};
pub use patterns::{compile_pattern, BUILTIN_PATTERNS};
pub use sanitize::{sanitize, strip_label, PORT_LABELS, SECRET_LABELS, SERVER_LABELS};
pub use validate::{classify_server, connection_url, validate, ServerType};
