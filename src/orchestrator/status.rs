//! Cache Status Module

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a read's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheStatus {
    /// Backend answered but held no live record
    NoCache,
    /// Live record fetched from a remote tier
    Cache,
    /// Live record served from the in-process tier
    CacheInMem,
    /// Backend failed; data is stale or empty
    CacheError,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::NoCache => "NO_CACHE",
            CacheStatus::Cache => "CACHE",
            CacheStatus::CacheInMem => "CACHE_IN_MEM",
            CacheStatus::CacheError => "CACHE_ERROR",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        for status in [
            CacheStatus::NoCache,
            CacheStatus::Cache,
            CacheStatus::CacheInMem,
            CacheStatus::CacheError,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status));
        }
    }
}
