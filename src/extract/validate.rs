//! Syntactic validation of sanitized candidates
//!
//! The pattern bank favors recall, so precision is enforced here: a
//! candidate only becomes a record when server, port and secret all satisfy
//! the contracts below. Rejection is silent and has no effect on the rest
//! of a document's batch.

/// Classification of a record's server field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerType {
    Ipv4,
    Domain,
}

impl ServerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerType::Ipv4 => "IPv4",
            ServerType::Domain => "Domain",
        }
    }
}

/// Validates a sanitized (server, port, secret) triple.
///
/// Accepts only when all of the following hold:
/// - server length in [4, 253]
/// - port is all ASCII digits, length in [1, 15], value in [1, 65535]
/// - secret length in [16, 511]; every byte is a hex digit, `=`, or
///   whitespace; at least 16 accepted characters and at least 8 hex digits
///
/// The secret rules accommodate historically padded or space-separated
/// secret encodings while rejecting arbitrary text.
pub fn validate(server: &str, port: &str, secret: &str) -> bool {
    if server.len() < 4 || server.len() > 253 {
        return false;
    }

    if port.is_empty() || port.len() > 15 {
        return false;
    }
    if !port.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    match port.parse::<u32>() {
        Ok(value) if (1..=65535).contains(&value) => {}
        _ => return false,
    }

    if secret.len() < 16 || secret.len() > 511 {
        return false;
    }

    let mut accepted = 0usize;
    let mut hex_digits = 0usize;
    for b in secret.bytes() {
        if b.is_ascii_hexdigit() {
            accepted += 1;
            hex_digits += 1;
        } else if b == b'=' {
            accepted += 1;
        } else if b != b' ' && b != b'\t' && b != b'\n' && b != b'\r' {
            return false;
        }
    }

    accepted >= 16 && hex_digits >= 8
}

/// Classifies a validated server as IPv4-shaped or domain-shaped.
///
/// IPv4-shaped means every character is a digit or a dot; anything else is
/// treated as a domain name.
pub fn classify_server(server: &str) -> ServerType {
    if server.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        ServerType::Ipv4
    } else {
        ServerType::Domain
    }
}

/// Builds the composite connection string for a validated triple
pub fn connection_url(server: &str, port: &str, secret: &str) -> String {
    format!("tg://proxy?server={}&port={}&secret={}", server, port, secret)
}
