//! L0 Entry Module
//!
//! A cached record together with its in-process expiration.

use crate::record::CacheRecord;

// == L0 Entry ==
/// Single in-process cache entry.
#[derive(Debug, Clone)]
pub struct L0Entry {
    /// The cached record
    pub value: CacheRecord,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at_millis: u64,
}

impl L0Entry {
    // == Constructor ==
    pub fn new(value: CacheRecord, expires_at_millis: u64) -> Self {
        Self {
            value,
            expires_at_millis,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_millis`.
    ///
    /// An entry is expired once the current time reaches its expiration.
    pub fn is_expired_at(&self, now_millis: u64) -> bool {
        now_millis >= self.expires_at_millis
    }
}
