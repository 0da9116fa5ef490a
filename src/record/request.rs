//! Cache Request Module
//!
//! Describes a logical cacheable request (origin connection plus cache
//! profile) and derives its stable `id_hash` fingerprint.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::clock::IntervalUnit;

// == Connection ==
/// Origin endpoint the cached data comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub method: String,
    pub host: String,
    pub path: String,
    /// Query parameters, sorted so ordering never changes the fingerprint
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl Connection {
    /// Creates a GET connection with no parameters.
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            host: host.into(),
            path: path.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

// == Expiration ==
/// How a profile computes record expiration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expiration {
    /// Fixed number of seconds from now
    Ttl(u64),
    /// Next aligned clock boundary
    Interval(IntervalUnit),
}

// == Cache Profile ==
/// Caching policy applied to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheProfile {
    pub profile: String,
    pub expiration: Expiration,
    /// Encrypt the body before it reaches a remote tier
    #[serde(default)]
    pub encrypt: bool,
    /// Ignore origin `cache-control`/`expires` headers
    #[serde(default)]
    pub override_origin_header_expiration: bool,
    /// When non-empty, only these headers are stored
    #[serde(default)]
    pub headers_to_retain: Vec<String>,
    #[serde(default)]
    pub host_id: String,
    #[serde(default)]
    pub path_id: String,
}

impl CacheProfile {
    pub fn new(profile: impl Into<String>, expiration: Expiration) -> Self {
        Self {
            profile: profile.into(),
            expiration,
            encrypt: false,
            override_origin_header_expiration: false,
            headers_to_retain: Vec::new(),
            host_id: String::new(),
            path_id: String::new(),
        }
    }

    pub fn encrypted(mut self, encrypt: bool) -> Self {
        self.encrypt = encrypt;
        self
    }

    pub fn override_origin_expiration(mut self, override_origin: bool) -> Self {
        self.override_origin_header_expiration = override_origin;
        self
    }

    pub fn retain_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers_to_retain = headers
            .into_iter()
            .map(|h| h.into().to_ascii_lowercase())
            .collect();
        self
    }
}

// == Cache Request ==
/// A connection bound to a profile, identified by its fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRequest {
    pub connection: Connection,
    pub profile: CacheProfile,
    id_hash: String,
}

impl CacheRequest {
    pub fn new(connection: Connection, profile: CacheProfile) -> Self {
        let id_hash = fingerprint(&connection, &profile);
        Self {
            connection,
            profile,
            id_hash,
        }
    }

    /// Hex SHA-256 fingerprint of the request.
    pub fn id_hash(&self) -> &str {
        &self.id_hash
    }
}

/// Length-prefixed fields keep `("ab","c")` and `("a","bc")` distinct.
fn fingerprint(connection: &Connection, profile: &CacheProfile) -> String {
    let mut hasher = Sha256::new();
    let mut field = |value: &[u8]| {
        hasher.update((value.len() as u64).to_be_bytes());
        hasher.update(value);
    };

    field(connection.method.to_ascii_uppercase().as_bytes());
    field(connection.host.to_ascii_lowercase().as_bytes());
    field(connection.path.as_bytes());
    for (name, value) in &connection.parameters {
        field(name.as_bytes());
        field(value.as_bytes());
    }

    field(profile.profile.as_bytes());
    field(profile.host_id.as_bytes());
    field(profile.path_id.as_bytes());
    field(&[u8::from(profile.encrypt)]);

    hex::encode(hasher.finalize())
}
