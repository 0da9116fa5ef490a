//! Record Model Module
//!
//! Defines the canonical record stored in every tier.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Response headers, keyed by lower-cased name.
pub type Headers = BTreeMap<String, String>;

// == Body ==
/// Record payload, either text or raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "encoding", content = "data", rename_all = "snake_case")]
pub enum Body {
    Text(String),
    Binary(Vec<u8>),
}

impl Body {
    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        match self {
            Body::Text(text) => text.len(),
            Body::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Body::Text(text) => text.as_bytes(),
            Body::Binary(bytes) => bytes,
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::Text(String::new())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Binary(bytes)
    }
}

// == Cache Record ==
/// A cached response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    /// Response body (ciphertext while stored remotely for private records)
    pub body: Body,
    /// Response headers
    pub headers: Headers,
    /// Origin status code, kept as text
    pub status_code: String,
    /// Expiration (Unix seconds)
    pub expires_at: u64,
    /// Whether the body is encrypted at rest in remote tiers
    pub is_private: bool,
    /// Fingerprint of the logical request
    pub id_hash: String,
}

impl CacheRecord {
    // == Empty ==
    /// Record carrying no data, returned when nothing usable is available.
    pub fn empty(id_hash: impl Into<String>) -> Self {
        Self {
            id_hash: id_hash.into(),
            ..Self::default()
        }
    }

    /// True when the record carries no response at all.
    pub fn is_empty(&self) -> bool {
        self.status_code.is_empty() && self.body.is_empty() && self.headers.is_empty()
    }

    /// True once `now_seconds` has reached the expiration.
    pub fn is_expired_at(&self, now_seconds: u64) -> bool {
        now_seconds >= self.expires_at
    }

    /// Body size in bytes, used for tier selection.
    pub fn size_bytes(&self) -> usize {
        self.body.len()
    }
}
