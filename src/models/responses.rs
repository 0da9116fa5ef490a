//! Response DTOs for the cache service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::orchestrator::{CacheInfo, CacheResult, CacheStatus};
use crate::record::CacheRecord;

/// Response body for reads (GET /cache/:key)
#[derive(Debug, Clone, Serialize)]
pub struct ReadResponse {
    /// The requested key
    pub key: String,
    /// Where the data came from
    pub status: CacheStatus,
    /// Served record; empty when nothing usable was available
    pub record: CacheRecord,
}

impl ReadResponse {
    pub fn new(key: impl Into<String>, result: CacheResult) -> Self {
        Self {
            key: key.into(),
            status: result.status,
            record: result.record,
        }
    }
}

/// Response body for writes (PUT /cache/:key)
#[derive(Debug, Clone, Serialize)]
pub struct WriteResponse {
    /// Success message
    pub message: String,
    pub key: String,
    pub id_hash: String,
    /// Epoch seconds
    pub expires_at: u64,
}

impl WriteResponse {
    pub fn new(key: impl Into<String>, record: &CacheRecord) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' written successfully", key),
            key,
            id_hash: record.id_hash.clone(),
            expires_at: record.expires_at,
        }
    }
}

/// Response body for the diagnostics endpoint (GET /info)
#[derive(Debug, Clone, Serialize)]
pub struct InfoResponse {
    pub size: usize,
    pub max_entries: usize,
    pub memory_mb: Option<u64>,
    pub timezone: String,
    pub in_memory_enabled: bool,
    pub tier_threshold_kb: u64,
    pub stats: Option<CacheStats>,
    /// L0 hit rate, 0.0 when L0 is disabled or unused
    pub hit_rate: f64,
}

impl From<CacheInfo> for InfoResponse {
    fn from(info: CacheInfo) -> Self {
        let hit_rate = info.stats.as_ref().map_or(0.0, CacheStats::hit_rate);
        Self {
            size: info.size,
            max_entries: info.max_entries,
            memory_mb: info.memory_mb,
            timezone: info.timezone,
            in_memory_enabled: info.in_memory_enabled,
            tier_threshold_kb: info.tier_threshold_kb,
            stats: info.stats,
            hit_rate,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
