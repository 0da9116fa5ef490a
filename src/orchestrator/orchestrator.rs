//! Cache Orchestrator Module
//!
//! Per-request read/write sequencing across L0, the remote tiers and stale
//! fallback. One orchestrator is created per logical request and never
//! shared between requests.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::backend::BackendError;
use crate::cache::L0Status;
use crate::clock::seconds_to_millis;
use crate::error::{CacheError, Result};
use crate::orchestrator::{CacheContext, CacheInfo, CacheStatus};
use crate::record::{Body, CacheRecord, CacheRequest, Headers, RecordCodec, Tier};

/// A resolved read: status plus the record served (possibly empty).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheResult {
    pub status: CacheStatus,
    pub record: CacheRecord,
}

/// Outcome of one backend fetch.
#[derive(Debug)]
enum FetchOutcome {
    Found(CacheRecord),
    NotFound,
    Transport(BackendError),
    Decryption(CacheError),
}

// == Cache Orchestrator ==
#[derive(Debug)]
pub struct CacheOrchestrator {
    context: Arc<CacheContext>,
    request: CacheRequest,
    resolved: Option<CacheResult>,
    stale: Option<CacheRecord>,
    failure: Option<CacheError>,
}

impl CacheOrchestrator {
    pub fn new(context: Arc<CacheContext>, request: CacheRequest) -> Self {
        Self {
            context,
            request,
            resolved: None,
            stale: None,
            failure: None,
        }
    }

    pub fn id_hash(&self) -> &str {
        self.request.id_hash()
    }

    pub fn request(&self) -> &CacheRequest {
        &self.request
    }

    /// Status of the last resolved read, if any.
    pub fn get_status(&self) -> Option<CacheStatus> {
        self.resolved.as_ref().map(|result| result.status)
    }

    pub fn info(&self) -> CacheInfo {
        self.context.info()
    }

    // == Read ==
    /// Resolves the request's record.
    ///
    /// At most one backend fetch happens per orchestrator; later calls return
    /// the memoized result. Transport failures never escape: they resolve to
    /// `CACHE_ERROR` with stale data when available, else an empty record.
    /// Decryption failures always propagate.
    pub async fn read(&mut self) -> Result<CacheResult> {
        if let Some(result) = &self.resolved {
            return Ok(result.clone());
        }
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }

        let id_hash = self.request.id_hash().to_string();

        let now_millis = self.context.now_millis();
        let lookup = self
            .context
            .l0()
            .map(|l0| l0.lock().get_at(&id_hash, now_millis));
        if let Some(lookup) = lookup {
            match (lookup.status, lookup.data) {
                (L0Status::Hit, Some(record)) => {
                    debug!(id_hash = %id_hash, "L0 hit");
                    return Ok(self.resolve(CacheStatus::CacheInMem, record));
                }
                (L0Status::Expired, data) => {
                    debug!(id_hash = %id_hash, "L0 entry expired, keeping as stale");
                    self.stale = data;
                }
                _ => {}
            }
        }

        match self.fetch(&id_hash).await {
            FetchOutcome::Found(record) => {
                if record.is_expired_at(self.context.now_seconds()) {
                    debug!(id_hash = %id_hash, "Backend record expired, keeping as stale");
                    self.stale = Some(record);
                    return Ok(self.resolve(CacheStatus::NoCache, CacheRecord::empty(id_hash)));
                }
                if let Some(l0) = self.context.l0() {
                    l0.lock()
                        .set(id_hash, record.clone(), seconds_to_millis(record.expires_at));
                }
                Ok(self.resolve(CacheStatus::Cache, record))
            }
            FetchOutcome::NotFound => {
                debug!(id_hash = %id_hash, "No cached record");
                Ok(self.resolve(CacheStatus::NoCache, CacheRecord::empty(id_hash)))
            }
            FetchOutcome::Transport(err) => {
                warn!(id_hash = %id_hash, error = %err, "Backend fetch failed");
                Ok(self.fall_back_to_stale())
            }
            FetchOutcome::Decryption(err) => {
                self.failure = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Tier by last-known size, then the other tier on a miss.
    async fn fetch(&self, id_hash: &str) -> FetchOutcome {
        let codec = self.context.codec();
        let first = self
            .stale
            .as_ref()
            .map(|stale| codec.tier_for(stale.size_bytes()))
            .unwrap_or(Tier::Primary);

        for tier in [first, first.other()] {
            let backend = self.context.backend(tier);
            match backend.get(id_hash).await {
                Ok(Some(record)) => {
                    debug!(id_hash, tier = %tier, "Backend hit");
                    return match codec.open(record) {
                        Ok(record) => FetchOutcome::Found(record),
                        Err(err) => FetchOutcome::Decryption(err),
                    };
                }
                Ok(None) => debug!(id_hash, tier = %tier, "Backend miss"),
                Err(err) => return FetchOutcome::Transport(err),
            }
        }
        FetchOutcome::NotFound
    }

    // == Stale Fallback ==
    /// Resolves to `CACHE_ERROR`, serving the stale candidate if there is one.
    ///
    /// The stale record's expiration is pushed to now plus the configured
    /// extension and written back to L0.
    pub fn fall_back_to_stale(&mut self) -> CacheResult {
        let id_hash = self.request.id_hash().to_string();
        let Some(stale) = self.stale.take() else {
            warn!(id_hash = %id_hash, "No stale data to fall back on");
            return self.resolve(CacheStatus::CacheError, CacheRecord::empty(id_hash));
        };

        let expires_at =
            self.context.now_seconds() + self.context.expiration_extension_seconds();
        let record = self.context.codec().with_expiration(stale, expires_at);
        if let Some(l0) = self.context.l0() {
            l0.lock()
                .set(id_hash.clone(), record.clone(), seconds_to_millis(expires_at));
        }
        warn!(id_hash = %id_hash, expires_at, "Serving stale record");
        self.resolve(CacheStatus::CacheError, record)
    }

    pub(super) fn resolve(&mut self, status: CacheStatus, record: CacheRecord) -> CacheResult {
        let result = CacheResult { status, record };
        self.resolved = Some(result.clone());
        result
    }

    // == Write ==
    /// Formats origin data into this request's canonical record.
    ///
    /// Expiration comes from the profile (or the origin headers), only the
    /// profile's retained headers are kept, and the record is private when
    /// the profile asks for encryption.
    pub fn prepare(
        &self,
        body: Body,
        headers: &Headers,
        status_code: impl Into<String>,
    ) -> Result<CacheRecord> {
        let codec = self.context.codec();
        let profile = &self.request.profile;
        let expires_at = codec.expires_at_for(profile, headers, self.context.now_seconds())?;
        let retained = RecordCodec::retain_headers(headers, &profile.headers_to_retain);

        Ok(codec.format(
            self.request.id_hash(),
            body,
            &retained,
            status_code,
            expires_at,
            profile.encrypt,
        ))
    }

    /// Seals `record` and puts it in the tier its stored size selects.
    ///
    /// A single attempt; transport failures are returned to the caller.
    pub async fn store(&self, record: &CacheRecord) -> Result<Tier> {
        let codec = self.context.codec();
        let sealed = codec.seal(record)?;
        let tier = codec.tier_for(sealed.size_bytes());

        self.context
            .backend(tier)
            .put(&sealed)
            .await
            .inspect_err(|err| {
                warn!(id_hash = %record.id_hash, tier = %tier, error = %err, "Backend write failed");
            })?;

        debug!(id_hash = %record.id_hash, tier = %tier, bytes = sealed.size_bytes(), "Record stored");
        Ok(tier)
    }

    /// Writes origin data through to the remote tier.
    ///
    /// Does not touch L0. A memoized read result picks up the new record
    /// but keeps its status.
    pub async fn write(
        &mut self,
        body: impl Into<Body>,
        headers: &Headers,
        status_code: impl Into<String>,
    ) -> Result<CacheRecord> {
        let record = self.prepare(body.into(), headers, status_code)?;
        self.store(&record).await?;

        if let Some(result) = self.resolved.as_mut() {
            result.record = record.clone();
        }
        Ok(record)
    }
}
