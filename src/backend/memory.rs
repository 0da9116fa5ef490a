//! In-Memory Backend
//!
//! `BackendStore` held in process memory, with an optional per-item size
//! limit and a switch that simulates an outage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BackendError, BackendResult, BackendStore};
use crate::record::CacheRecord;

/// In-memory tier.
#[derive(Debug)]
pub struct InMemoryBackend {
    name: String,
    records: RwLock<HashMap<String, CacheRecord>>,
    max_item_bytes: Option<usize>,
    unavailable: AtomicBool,
    gets: AtomicU64,
    puts: AtomicU64,
}

impl InMemoryBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: RwLock::new(HashMap::new()),
            max_item_bytes: None,
            unavailable: AtomicBool::new(false),
            gets: AtomicU64::new(0),
            puts: AtomicU64::new(0),
        }
    }

    /// Rejects puts whose body is larger than `limit` bytes.
    pub fn with_max_item_bytes(mut self, limit: usize) -> Self {
        self.max_item_bytes = Some(limit);
        self
    }

    /// Makes every subsequent call fail with a transport error (or recover).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `get` calls attempted, failed ones included.
    pub fn get_count(&self) -> u64 {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of `put` calls attempted, failed ones included.
    pub fn put_count(&self) -> u64 {
        self.puts.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Direct access for seeding, bypassing the outage switch and counters.
    pub async fn insert(&self, record: CacheRecord) {
        self.records
            .write()
            .await
            .insert(record.id_hash.clone(), record);
    }

    fn check_available(&self) -> BackendResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BackendError::Transport {
                store: self.name.clone(),
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BackendStore for InMemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, id_hash: &str) -> BackendResult<Option<CacheRecord>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.records.read().await.get(id_hash).cloned())
    }

    async fn put(&self, record: &CacheRecord) -> BackendResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        if let Some(limit) = self.max_item_bytes {
            let size = record.size_bytes();
            if size > limit {
                return Err(BackendError::ItemTooLarge {
                    store: self.name.clone(),
                    size,
                    limit,
                });
            }
        }

        self.records
            .write()
            .await
            .insert(record.id_hash.clone(), record.clone());
        Ok(())
    }
}
