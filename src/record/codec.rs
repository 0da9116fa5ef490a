//! Record Codec Module
//!
//! Builds canonical records from raw response data, picks the remote tier
//! by size, and seals/opens private bodies through the cipher collaborator.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, error};

use crate::clock::{self, IntervalClock};
use crate::error::{CacheError, Result};
use crate::record::{Body, CacheProfile, CacheRecord, Cipher, DataKey, Expiration, Headers};

const BYTES_PER_KB: u64 = 1024;

// == Tier ==
/// Remote tier a record is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Low-latency, size-limited store
    Primary,
    /// High-capacity, higher-latency store
    Secondary,
}

impl Tier {
    pub fn other(self) -> Tier {
        match self {
            Tier::Primary => Tier::Secondary,
            Tier::Secondary => Tier::Primary,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Primary => write!(f, "primary"),
            Tier::Secondary => write!(f, "secondary"),
        }
    }
}

// == Record Codec ==
pub struct RecordCodec {
    clock: Arc<IntervalClock>,
    tier_threshold_kb: u64,
    cipher: Option<(Arc<dyn Cipher>, DataKey)>,
}

impl fmt::Debug for RecordCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordCodec")
            .field("timezone", &self.clock.timezone_name())
            .field("tier_threshold_kb", &self.tier_threshold_kb)
            .field("cipher", &self.cipher.is_some())
            .finish()
    }
}

impl RecordCodec {
    // == Constructor ==
    /// Creates a codec. A zero threshold is a configuration error.
    pub fn new(clock: Arc<IntervalClock>, tier_threshold_kb: u64) -> Result<Self> {
        if tier_threshold_kb == 0 {
            return Err(CacheError::Configuration(
                "tier threshold must be a positive number of KB".to_string(),
            ));
        }
        Ok(Self {
            clock,
            tier_threshold_kb,
            cipher: None,
        })
    }

    /// Enables sealing of private records.
    pub fn with_cipher(mut self, cipher: Arc<dyn Cipher>, key: DataKey) -> Self {
        self.cipher = Some((cipher, key));
        self
    }

    /// True when a cipher is configured.
    pub fn seals_private_records(&self) -> bool {
        self.cipher.is_some()
    }

    pub fn tier_threshold_kb(&self) -> u64 {
        self.tier_threshold_kb
    }

    pub fn clock(&self) -> &IntervalClock {
        &self.clock
    }

    // == Format ==
    /// Builds the canonical record.
    ///
    /// Header names are lower-cased; `etag` and `last-modified` are filled
    /// in when the origin did not send them, and `expires` always mirrors
    /// `expires_at_seconds`. No encryption happens here.
    pub fn format(
        &self,
        id_hash: &str,
        body: Body,
        raw_headers: &Headers,
        status_code: impl Into<String>,
        expires_at_seconds: u64,
        is_private: bool,
    ) -> CacheRecord {
        let mut headers: Headers = raw_headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
            .collect();

        headers
            .entry("etag".to_string())
            .or_insert_with(|| etag_for(&body));
        if !headers.contains_key("last-modified") {
            headers.insert("last-modified".to_string(), Utc::now().to_rfc2822());
        }
        if let Some(expires) = http_date(expires_at_seconds) {
            headers.insert("expires".to_string(), expires);
        }

        CacheRecord {
            body,
            headers,
            status_code: status_code.into(),
            expires_at: expires_at_seconds,
            is_private,
            id_hash: id_hash.to_string(),
        }
    }

    /// Moves a record's expiration, keeping the `expires` header in step.
    pub fn with_expiration(&self, record: CacheRecord, expires_at_seconds: u64) -> CacheRecord {
        let mut headers = record.headers;
        if let Some(expires) = http_date(expires_at_seconds) {
            headers.insert("expires".to_string(), expires);
        }
        CacheRecord {
            headers,
            expires_at: expires_at_seconds,
            ..record
        }
    }

    /// Keeps only the listed headers (case-insensitive). An empty list keeps all.
    pub fn retain_headers(headers: &Headers, retain: &[String]) -> Headers {
        if retain.is_empty() {
            return headers.clone();
        }
        headers
            .iter()
            .filter(|(name, _)| retain.iter().any(|r| r.eq_ignore_ascii_case(name)))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    // == Tier Selection ==
    /// Records at or below `threshold_kb` go to the primary tier.
    pub fn select_tier(size_bytes: usize, threshold_kb: u64) -> Tier {
        if (size_bytes as u64) <= threshold_kb.saturating_mul(BYTES_PER_KB) {
            Tier::Primary
        } else {
            Tier::Secondary
        }
    }

    /// Tier for a body of the given size under this codec's threshold.
    pub fn tier_for(&self, size_bytes: usize) -> Tier {
        Self::select_tier(size_bytes, self.tier_threshold_kb)
    }

    // == Expiration ==
    /// Computes a record's expiration for `profile` at `now_seconds`.
    ///
    /// Origin `cache-control: max-age` (or a future `expires` date) wins
    /// unless the profile overrides origin expiration. Always in the future.
    pub fn expires_at_for(
        &self,
        profile: &CacheProfile,
        origin_headers: &Headers,
        now_seconds: u64,
    ) -> Result<u64> {
        if !profile.override_origin_header_expiration {
            if let Some(origin) = origin_expiration(origin_headers, now_seconds) {
                return Ok(origin);
            }
        }

        match profile.expiration {
            Expiration::Ttl(seconds) => Ok(now_seconds + seconds.max(1)),
            Expiration::Interval(unit) => {
                let spec = self.clock.spec(unit)?;
                Ok(self.clock.next_interval_in_seconds(now_seconds, &spec))
            }
        }
    }

    // == Seal ==
    /// Returns the record as it should be stored remotely.
    ///
    /// Private records have their body replaced by ciphertext of the body's
    /// JSON form, so text and binary bodies both survive the round trip.
    pub fn seal(&self, record: &CacheRecord) -> Result<CacheRecord> {
        if !record.is_private {
            return Ok(record.clone());
        }
        let (cipher, key) = self.cipher.as_ref().ok_or_else(|| {
            CacheError::Configuration("private record written without a cipher".to_string())
        })?;

        let plaintext = serde_json::to_vec(&record.body)?;
        let ciphertext = cipher.encrypt(&plaintext, key)?;
        debug!(id_hash = %record.id_hash, bytes = ciphertext.len(), "Sealed private record");

        Ok(CacheRecord {
            body: Body::Binary(ciphertext),
            ..record.clone()
        })
    }

    // == Open ==
    /// Reverses `seal`. Integrity failures surface as `CacheError::Decryption`.
    pub fn open(&self, record: CacheRecord) -> Result<CacheRecord> {
        if !record.is_private {
            return Ok(record);
        }
        let (cipher, key) = self.cipher.as_ref().ok_or_else(|| {
            CacheError::Decryption(format!(
                "record {} is private but no cipher is configured",
                record.id_hash
            ))
        })?;

        let ciphertext = match &record.body {
            Body::Binary(bytes) => bytes.as_slice(),
            Body::Text(_) => {
                return Err(CacheError::Decryption(format!(
                    "record {} is private but its body is not ciphertext",
                    record.id_hash
                )))
            }
        };

        let plaintext = cipher.decrypt(ciphertext, key).inspect_err(|e| {
            error!(id_hash = %record.id_hash, error = %e, "Failed to open private record");
        })?;
        let body: Body = serde_json::from_slice(&plaintext).map_err(|e| {
            CacheError::Decryption(format!("decrypted body is malformed: {}", e))
        })?;

        Ok(CacheRecord { body, ..record })
    }

    // == Conversions ==
    pub fn seconds_to_millis(seconds: u64) -> u64 {
        clock::seconds_to_millis(seconds)
    }

    pub fn millis_to_seconds(millis: u64) -> u64 {
        clock::millis_to_seconds(millis)
    }
}

fn etag_for(body: &Body) -> String {
    let digest = Sha256::digest(body.as_bytes());
    format!("\"{}\"", &hex::encode(digest)[..16])
}

fn http_date(epoch_seconds: u64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(i64::try_from(epoch_seconds).ok()?, 0)
        .map(|dt| dt.to_rfc2822())
}

fn origin_expiration(headers: &Headers, now_seconds: u64) -> Option<u64> {
    let header = |name: &str| {
        headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    };

    if let Some(cache_control) = header("cache-control") {
        let max_age = cache_control
            .split(',')
            .filter_map(|directive| directive.trim().strip_prefix("max-age="))
            .find_map(|value| value.trim().parse::<u64>().ok());
        if let Some(seconds) = max_age.filter(|s| *s > 0) {
            return Some(now_seconds + seconds);
        }
    }

    let expires = header("expires")?;
    let at = DateTime::parse_from_rfc2822(expires.trim()).ok()?.timestamp();
    u64::try_from(at).ok().filter(|at| *at > now_seconds)
}
