//! Cache Entry Module
//!
//! Defines a single cached origin response.

use chrono::{DateTime, Utc};

// == Cache Entry ==
/// A complete origin response captured for replay.
///
/// Immutable once inserted; only its position in the store's ordering moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Request key (host followed by path)
    pub key: String,
    /// Status line and headers, including the terminating blank line
    pub headers: Vec<u8>,
    /// Response body
    pub body: Vec<u8>,
    /// When the response was captured
    pub inserted_at: DateTime<Utc>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry stamped with the current time.
    pub fn new(key: impl Into<String>, headers: Vec<u8>, body: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            headers,
            body,
            inserted_at: Utc::now(),
        }
    }

    // == Size ==
    /// Bytes this entry counts against the cache capacity.
    ///
    /// Only the body is accounted; the header block rides along for free.
    pub fn size(&self) -> usize {
        self.body.len()
    }
}
