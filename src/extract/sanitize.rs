//! Field sanitization for extracted candidate text
//!
//! Pattern captures are deliberately greedy, so raw fields routinely carry
//! control characters, stray whitespace and leftover labels ("Server:",
//! "Key:") from the surrounding document. Everything here normalizes a
//! captured field before validation sees it.

/// Strips non-printable bytes, collapses whitespace runs into a single
/// space, and trims leading/trailing whitespace.
pub fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;

    for c in input.chars() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                // Leading whitespace never flushes
                if !out.is_empty() {
                    pending_space = true;
                }
            }
            '!'..='~' => {
                if pending_space {
                    out.push(' ');
                    pending_space = false;
                }
                out.push(c);
            }
            // Control bytes and non-ASCII are dropped outright
            _ => {}
        }
    }

    out
}

/// Case-insensitively removes one leading label token left over from greedy
/// pattern capture, then re-sanitizes the remainder.
///
/// Labels are matched as literal prefixes, e.g. `strip_label("Server: 1.2.3.4",
/// SERVER_LABELS)` yields `"1.2.3.4"`.
pub fn strip_label(field: &str, labels: &[&str]) -> String {
    for label in labels {
        if field.len() >= label.len() && field[..label.len()].eq_ignore_ascii_case(label) {
            return sanitize(&field[label.len()..]);
        }
    }
    sanitize(field)
}

/// Labels commonly glued to the server field
pub const SERVER_LABELS: &[&str] = &["server:", "host:"];

/// Labels commonly glued to the port field
pub const PORT_LABELS: &[&str] = &["port:"];

/// Labels commonly glued to the secret field
pub const SECRET_LABELS: &[&str] = &["secret:", "key:"];
