//! Cache Context Module
//!
//! Process-wide state shared by every orchestrator: the L0 cache, backend
//! references, the record codec, the interval clock and the time source.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::backend::BackendStore;
use crate::cache::{CacheStats, CapacityPolicy, L0Cache, SharedL0Cache};
use crate::clock::{millis_to_seconds, system_time_source, IntervalClock, TimeSource};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::orchestrator::CacheOrchestrator;
use crate::record::{CacheRequest, Cipher, DataKey, RecordCodec, Tier};

/// Diagnostic snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    pub size: usize,
    pub max_entries: usize,
    pub memory_mb: Option<u64>,
    pub timezone: String,
    pub in_memory_enabled: bool,
    pub tier_threshold_kb: u64,
    pub stats: Option<CacheStats>,
}

// == Cache Context ==
/// Built once at startup and shared behind an `Arc`.
pub struct CacheContext {
    l0: Option<SharedL0Cache>,
    primary: Arc<dyn BackendStore>,
    secondary: Arc<dyn BackendStore>,
    codec: Arc<RecordCodec>,
    clock: Arc<IntervalClock>,
    expiration_extension_seconds: u64,
    time_source: TimeSource,
}

impl fmt::Debug for CacheContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheContext")
            .field("in_memory", &self.l0.is_some())
            .field("primary", &self.primary.name())
            .field("secondary", &self.secondary.name())
            .field("codec", &self.codec)
            .field(
                "expiration_extension_seconds",
                &self.expiration_extension_seconds,
            )
            .finish()
    }
}

impl CacheContext {
    pub fn builder(config: Config) -> CacheContextBuilder {
        CacheContextBuilder {
            config,
            timezone: None,
            primary: None,
            secondary: None,
            cipher: None,
            time_source: None,
        }
    }

    /// Creates an orchestrator for one logical request.
    pub fn orchestrator(self: &Arc<Self>, request: CacheRequest) -> CacheOrchestrator {
        CacheOrchestrator::new(Arc::clone(self), request)
    }

    /// In-process cache, when enabled.
    pub fn l0(&self) -> Option<&SharedL0Cache> {
        self.l0.as_ref()
    }

    pub fn backend(&self, tier: Tier) -> &Arc<dyn BackendStore> {
        match tier {
            Tier::Primary => &self.primary,
            Tier::Secondary => &self.secondary,
        }
    }

    pub fn codec(&self) -> &RecordCodec {
        &self.codec
    }

    pub fn clock(&self) -> &IntervalClock {
        &self.clock
    }

    pub fn expiration_extension_seconds(&self) -> u64 {
        self.expiration_extension_seconds
    }

    pub fn now_millis(&self) -> u64 {
        (self.time_source)()
    }

    pub fn now_seconds(&self) -> u64 {
        millis_to_seconds(self.now_millis())
    }

    // == Info ==
    pub fn info(&self) -> CacheInfo {
        let l0 = self.l0.as_ref().map(|l0| l0.lock().info());
        CacheInfo {
            size: l0.as_ref().map_or(0, |i| i.size),
            max_entries: l0.as_ref().map_or(0, |i| i.max_entries),
            memory_mb: l0.as_ref().and_then(|i| i.memory_mb),
            timezone: self.clock.timezone_name().to_string(),
            in_memory_enabled: self.l0.is_some(),
            tier_threshold_kb: self.codec.tier_threshold_kb(),
            stats: l0.map(|i| i.stats),
        }
    }
}

// == Builder ==
pub struct CacheContextBuilder {
    config: Config,
    timezone: Option<String>,
    primary: Option<Arc<dyn BackendStore>>,
    secondary: Option<Arc<dyn BackendStore>>,
    cipher: Option<(Arc<dyn Cipher>, DataKey)>,
    time_source: Option<TimeSource>,
}

impl CacheContextBuilder {
    /// Timezone that takes precedence over the configured one.
    pub fn timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn primary(mut self, store: Arc<dyn BackendStore>) -> Self {
        self.primary = Some(store);
        self
    }

    pub fn secondary(mut self, store: Arc<dyn BackendStore>) -> Self {
        self.secondary = Some(store);
        self
    }

    pub fn cipher(mut self, cipher: Arc<dyn Cipher>, key: DataKey) -> Self {
        self.cipher = Some((cipher, key));
        self
    }

    pub fn time_source(mut self, source: TimeSource) -> Self {
        self.time_source = Some(source);
        self
    }

    /// Validates configuration and assembles the context.
    ///
    /// Any error here is fatal: the cache must not serve traffic.
    pub fn build(self) -> Result<CacheContext> {
        let config = self.config;
        config.validate()?;

        let primary = self
            .primary
            .ok_or_else(|| CacheError::Configuration("primary backend is required".into()))?;
        let secondary = self
            .secondary
            .ok_or_else(|| CacheError::Configuration("secondary backend is required".into()))?;

        let clock = Arc::new(IntervalClock::init(
            self.timezone.as_deref(),
            config.timezone.as_deref(),
        )?);

        let mut codec = RecordCodec::new(Arc::clone(&clock), config.tier_threshold_kb)?;
        if let Some((cipher, key)) = self.cipher {
            codec = codec.with_cipher(cipher, key);
        }

        let l0 = if config.in_memory.enabled {
            let policy = CapacityPolicy::derive(
                config.in_memory.max_entries,
                config.in_memory.memory_hint_mb.as_deref(),
                config.in_memory.entries_per_gb,
                config.in_memory.default_max_entries,
            );
            info!(
                max_entries = policy.max_entries,
                source = ?policy.source,
                "In-memory cache enabled"
            );
            Some(L0Cache::new(policy).into_shared())
        } else {
            info!("In-memory cache disabled");
            None
        };

        info!(
            timezone = clock.timezone_name(),
            tier_threshold_kb = config.tier_threshold_kb,
            primary = primary.name(),
            secondary = secondary.name(),
            "Cache context initialized"
        );

        Ok(CacheContext {
            l0,
            primary,
            secondary,
            codec: Arc::new(codec),
            clock,
            expiration_extension_seconds: config.default_expiration_extension_seconds,
            time_source: self.time_source.unwrap_or_else(system_time_source),
        })
    }
}
