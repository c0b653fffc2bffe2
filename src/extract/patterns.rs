//! The built-in heuristic pattern bank
//!
//! Publishers post proxy credentials in wildly inconsistent formats, so the
//! engine runs many independent patterns instead of one general grammar.
//! Every pattern yields exactly three capture groups in fixed order: host,
//! port, secret. Precision is not a goal here; bad captures are discarded
//! by validation downstream.

use regex::bytes::{Regex, RegexBuilder};

/// Ordered bank of built-in extraction rules.
///
/// Order is a fixed priority: earlier patterns target the most structured
/// formats, later ones the loosest. Patterns never suppress one another;
/// duplicates are collapsed later by content hash.
pub const BUILTIN_PATTERNS: &[&str] = &[
    // Labeled key:value text
    r"Server:[\s]*([^\r\n]+?)[\s]*Port:[\s]*([0-9]{1,5})[\s]*Secret:[\s]*([0-9a-f=]{16,512})",
    r"Host:[\s]*([^\r\n]+?)[\s]*Port:[\s]*([0-9]{1,5})[\s]*Key:[\s]*([0-9a-f=]{16,512})",
    // Labeled values on consecutive lines
    r"Server\s*[=:]\s*([^\r\n]+?)[\r\n]+\s*Port\s*[=:]\s*([0-9]{1,5})[\r\n]+\s*Secret\s*[=:]\s*([0-9a-f=]{16,512})",
    // JSON object shapes
    r#""server"\s*:\s*"([^"]+?)"\s*,\s*"port"\s*:\s*"?([0-9]{1,5})"?\s*,\s*"secret"\s*:\s*"([^"]+?)""#,
    r#""host"\s*:\s*"([^"]+?)"\s*,\s*"port"\s*:\s*"?([0-9]{1,5})"?\s*,\s*"secret"\s*:\s*"([^"]+?)""#,
    // Telegram deep links and bare URI query parameters
    r"tg://proxy\?server=([^&\s]+?)&port=([0-9]{1,5})&secret=([0-9a-zA-Z%=_-]+)",
    r"tg://socks\?server=([^&\s]+?)&port=([0-9]{1,5})&secret=([0-9a-zA-Z%=_-]+)",
    r"server=([^&\s]+?)&port=([0-9]{1,5})&secret=([0-9a-zA-Z%=_-]+)",
    r"host=([^&\s]+?)&port=([0-9]{1,5})&key=([0-9a-zA-Z%=_-]+)",
    // mtproxy scheme
    r"mtproxy://([^:/\s]+):([0-9]{1,5})\?secret=([0-9a-f=]+)",
    // INI-style assignments
    r"address\s*=\s*([^\r\n]+?)\s+port\s*=\s*([0-9]{1,5})\s+secret\s*=\s*([0-9a-f=]+)",
    // Colon-delimited rows
    r"([0-9a-z._-]+):([0-9]{1,5}):([0-9a-f=]{16,512})",
    r"([a-z0-9.-]+\.[a-z]{2,}):([0-9]{1,5}):([0-9a-f]{32,512})",
    // Pipe-delimited tables
    r"\|\s*([0-9a-z._-]+)\s*\|\s*([0-9]{1,5})\s*\|\s*([0-9a-f=\s]{16,512}?)\s*\|",
    // Compact JSON and array forms
    r#"\{\s*"s"\s*:\s*"([^"]+)"\s*,\s*"p"\s*:\s*([0-9]{1,5})\s*,\s*"k"\s*:\s*"([^"]+)"\s*\}"#,
    r#"\[\s*"([^"]+)"\s*,\s*([0-9]{1,5})\s*,\s*"([0-9a-f=]+)"\s*\]"#,
    // Loose positional triple anchored on an IPv4 address
    r"([0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3})[^0-9a-z]+([0-9]{1,5})[^0-9a-z]+([0-9a-f=]{16,512})",
];

/// Compiles a single extraction pattern with the matching options every
/// pattern in the bank runs under: case-insensitive, multiline, and `.`
/// matching newlines.
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .dot_matches_new_line(true)
        .build()
}
