//! Validated proxy records and their content hash

use crate::extract::{classify_server, connection_url, ServerType};
use chrono::{DateTime, Utc};

/// Default speed rating assigned until active probing exists
const DEFAULT_SPEED_SCORE: u8 = 50;

/// Country marker used while no geolocation is performed
const DEFAULT_COUNTRY: &str = "UN";

/// A validated proxy connection descriptor plus provenance metadata.
///
/// Records are created only by the validated-candidate path and are
/// immutable once stored, apart from the fields reserved for a future
/// verification pass (`last_verified`, `active`).
#[derive(Debug, Clone)]
pub struct Record {
    /// Proxy hostname or IP address
    pub server: String,
    /// Port number kept as the string it was published as
    pub port: String,
    /// MTProto secret key (hex, possibly padded)
    pub secret: String,
    /// Ready-to-use tg:// deep link
    pub connection_url: String,
    /// Source endpoint this record was extracted from
    pub source: String,
    /// ISO country code; always "UN" until geolocation exists
    pub country: &'static str,
    /// IPv4-shaped or domain-shaped server
    pub server_type: ServerType,
    /// 64-bit FNV-1a content hash, the dedup key
    pub hash: u64,
    /// When this record was first extracted
    pub discovered: DateTime<Utc>,
    /// Reserved for a future verification pass
    pub last_verified: DateTime<Utc>,
    /// Whether the record is exported by checkpoints
    pub active: bool,
    /// Performance rating, default until probing exists
    pub speed_score: u8,
}

impl Record {
    /// Builds a record from a validated (server, port, secret) triple.
    ///
    /// Computes the content hash, classifies the server, and fills in the
    /// composite connection URL plus default metadata.
    pub fn new(server: String, port: String, secret: String, source: &str) -> Self {
        let now = Utc::now();
        let hash = content_hash(&server, &port, &secret);
        let server_type = classify_server(&server);
        let connection_url = connection_url(&server, &port, &secret);

        Self {
            server,
            port,
            secret,
            connection_url,
            source: source.to_string(),
            country: DEFAULT_COUNTRY,
            server_type,
            hash,
            discovered: now,
            last_verified: now,
            active: true,
            speed_score: DEFAULT_SPEED_SCORE,
        }
    }
}

/// Computes the 64-bit FNV-1a content hash of a logical record.
///
/// Hashes the server bytes, a separator, the port bytes, a separator, and
/// at most the first 64 bytes of the secret. The prefix cap bounds hashing
/// cost for long secrets while staying practically collision-free at the
/// cardinalities this store sees.
pub fn content_hash(server: &str, port: &str, secret: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let mut hash = FNV_OFFSET;
    let mut step = |byte: u8| {
        hash = (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME);
    };

    for &b in server.as_bytes() {
        step(b);
    }
    step(b':');
    for &b in port.as_bytes() {
        step(b);
    }
    step(b':');
    for &b in secret.as_bytes().iter().take(64) {
        step(b);
    }

    hash
}
