//! L0 Cache Store Module
//!
//! Process-wide in-memory tier: LRU eviction on write, lazy expiration on read.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::cache::{CacheStats, CapacityPolicy, CapacitySource, L0Entry, LruList};
use crate::clock::current_timestamp_ms;
use crate::record::CacheRecord;

/// L0 cache shared by every orchestrator in the process.
///
/// Locks are held only for a single get/set/clear and never across `.await`.
pub type SharedL0Cache = Arc<Mutex<L0Cache>>;

// == Lookup Result ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum L0Status {
    Hit,
    Miss,
    Expired,
}

/// Outcome of an L0 lookup.
///
/// `data` is present for `Hit` and for `Expired`, where it is the last
/// value held before the entry was dropped.
#[derive(Debug, Clone)]
pub struct L0Lookup {
    pub status: L0Status,
    pub data: Option<CacheRecord>,
}

impl L0Lookup {
    fn miss() -> Self {
        Self {
            status: L0Status::Miss,
            data: None,
        }
    }
}

/// Diagnostic snapshot of the L0 cache.
#[derive(Debug, Clone, Serialize)]
pub struct L0Info {
    pub size: usize,
    pub max_entries: usize,
    pub memory_mb: Option<u64>,
    pub capacity_source: CapacitySource,
    pub stats: CacheStats,
}

// == L0 Cache ==
/// Bounded, recency-ordered cache of records keyed by `id_hash`.
///
/// There is no background sweep; expired entries are removed when read or
/// pushed out by eviction.
#[derive(Debug)]
pub struct L0Cache {
    entries: LruList<String, L0Entry>,
    policy: CapacityPolicy,
    stats: CacheStats,
}

impl L0Cache {
    // == Constructor ==
    pub fn new(policy: CapacityPolicy) -> Self {
        Self {
            entries: LruList::new(),
            policy,
            stats: CacheStats::new(),
        }
    }

    /// Creates a cache with a fixed entry limit.
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self::new(CapacityPolicy::fixed(max_entries))
    }

    /// Wraps the cache for process-wide sharing.
    pub fn into_shared(self) -> SharedL0Cache {
        Arc::new(Mutex::new(self))
    }

    // == Get ==
    /// Looks up `key` against the system clock.
    pub fn get(&mut self, key: &str) -> L0Lookup {
        self.get_at(key, current_timestamp_ms())
    }

    /// Looks up `key` at `now_millis`.
    ///
    /// A hit refreshes recency. An expired entry is removed and its data
    /// returned once; the next lookup for the key is a miss.
    pub fn get_at(&mut self, key: &str, now_millis: u64) -> L0Lookup {
        let expired = match self.entries.peek(key) {
            Some(entry) => entry.is_expired_at(now_millis),
            None => {
                self.stats.record_miss();
                return L0Lookup::miss();
            }
        };

        if expired {
            let data = self.entries.remove(key).map(|entry| entry.value);
            self.stats.record_expired();
            debug!(key, "L0 entry expired");
            return L0Lookup {
                status: L0Status::Expired,
                data,
            };
        }

        self.stats.record_hit();
        L0Lookup {
            status: L0Status::Hit,
            data: self.entries.get(key).map(|entry| entry.value.clone()),
        }
    }

    // == Set ==
    /// Stores `value` under `key` as the most recently used entry.
    ///
    /// An existing key is replaced in place of its old position. A new key
    /// at capacity first evicts the single least recently used entry.
    pub fn set(&mut self, key: impl Into<String>, value: CacheRecord, expires_at_millis: u64) {
        let key = key.into();

        if !self.entries.contains(key.as_str()) && self.entries.len() >= self.policy.max_entries {
            if let Some((evicted, _)) = self.entries.pop_lru() {
                self.stats.record_eviction();
                debug!(key = %evicted, "L0 entry evicted");
            }
        }

        self.entries
            .insert(key, L0Entry::new(value, expires_at_millis));
    }

    // == Info ==
    pub fn info(&self) -> L0Info {
        L0Info {
            size: self.entries.len(),
            max_entries: self.policy.max_entries,
            memory_mb: self.policy.memory_mb,
            capacity_source: self.policy.source,
            stats: self.stats.clone(),
        }
    }

    // == Clear ==
    /// Removes all entries. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// True if `key` is held, expired or not. Does not refresh recency.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.policy.max_entries
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}
