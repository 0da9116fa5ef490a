//! Request DTOs for the cache service API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

use crate::record::Headers;

/// Longest key accepted in a `/cache/:key` path.
pub const MAX_KEY_LENGTH: usize = 256;

/// Checks a cache key taken from the request path.
///
/// Returns an error message if validation fails, None if valid.
pub fn validate_key(key: &str) -> Option<String> {
    if key.trim().is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} characters",
            MAX_KEY_LENGTH
        ));
    }
    None
}

/// Request body for the write-through operation (PUT /cache/:key)
///
/// # Fields
/// - `body`: Response body to cache
/// - `headers`: Origin response headers
/// - `status_code`: Origin status code, 200 when omitted
/// - `private`: Seal the body before it reaches a remote tier
#[derive(Debug, Clone, Deserialize)]
pub struct WriteRequest {
    pub body: String,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default = "default_status_code")]
    pub status_code: u16,
    #[serde(default)]
    pub private: bool,
}

fn default_status_code() -> u16 {
    200
}

impl WriteRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if !(100..=599).contains(&self.status_code) {
            return Some(format!("Invalid status code {}", self.status_code));
        }
        if self.headers.keys().any(|name| name.trim().is_empty()) {
            return Some("Header names cannot be empty".to_string());
        }
        None
    }
}

/// Query string for reads (GET /cache/:key?private=true)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadQuery {
    #[serde(default)]
    pub private: bool,
}
