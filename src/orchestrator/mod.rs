//! Orchestrator Module
//!
//! Sequences the in-process tier, the remote tiers and stale fallback for a
//! single logical request, plus the get-or-populate helper built on it.

mod access;
mod context;
#[allow(clippy::module_inception)]
mod orchestrator;
mod status;

pub use access::{CacheableDataAccess, OriginResponse};
pub use context::{CacheContext, CacheContextBuilder, CacheInfo};
pub use orchestrator::{CacheOrchestrator, CacheResult};
pub use status::CacheStatus;
