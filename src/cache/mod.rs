//! Cache Module
//!
//! Bounded in-process (L0) cache with lazy expiration and LRU eviction.

mod capacity;
mod entry;
mod lru;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use capacity::{CapacityPolicy, CapacitySource};
pub use entry::L0Entry;
pub use lru::LruList;
pub use stats::CacheStats;
pub use store::{L0Cache, L0Info, L0Lookup, L0Status, SharedL0Cache};
