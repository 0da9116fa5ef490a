//! Tiercache - a tiered caching layer
//!
//! Serves records from a bounded in-process LRU (L0) in front of two remote
//! tiers split by record size, with clock-aligned expiration and stale
//! fallback when the remote tiers are unreachable.

pub mod api;
pub mod backend;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod record;

pub use api::{create_router, AppState};
pub use backend::{BackendError, BackendStore, InMemoryBackend};
pub use cache::{L0Cache, L0Status};
pub use clock::{IntervalClock, IntervalSpec, IntervalUnit};
pub use config::Config;
pub use error::{CacheError, Result};
pub use orchestrator::{
    CacheContext, CacheOrchestrator, CacheResult, CacheStatus, CacheableDataAccess,
    OriginResponse,
};
pub use record::{CacheProfile, CacheRecord, CacheRequest, Connection, Expiration, RecordCodec, Tier};
