//! Backend Module
//!
//! Contract for the remote tiers and an in-memory implementation.

mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::CacheError;
use crate::record::CacheRecord;

pub use memory::InMemoryBackend;

// == Backend Error ==
/// Failure reported by a backend store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Network or service failure
    #[error("{store}: {message}")]
    Transport { store: String, message: String },

    /// Store refused the item
    #[error("{store}: item of {size} bytes exceeds limit of {limit} bytes")]
    ItemTooLarge {
        store: String,
        size: usize,
        limit: usize,
    },
}

impl From<BackendError> for CacheError {
    fn from(err: BackendError) -> Self {
        CacheError::Transport(err.to_string())
    }
}

/// Result of a backend call.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

// == Backend Store Trait ==
/// Remote key-value tier holding records by `id_hash`.
///
/// Implementations make a single attempt per call; there is no retry.
#[async_trait]
pub trait BackendStore: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &str;

    /// Fetches a record; `Ok(None)` when nothing is stored.
    async fn get(&self, id_hash: &str) -> BackendResult<Option<CacheRecord>>;

    /// Stores a record under its `id_hash`, replacing any previous one.
    async fn put(&self, record: &CacheRecord) -> BackendResult<()>;
}
