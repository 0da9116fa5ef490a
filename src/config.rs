//! Configuration Module
//!
//! Handles loading and validating cache configuration from environment variables.

use std::env;

use chrono_tz::Tz;

use crate::clock::normalize_zone_name;
use crate::error::{CacheError, Result};

/// Timezone used when neither the caller nor the environment names one.
pub const DEFAULT_TIMEZONE: &str = "Etc/UTC";

/// In-process (L0) cache settings.
#[derive(Debug, Clone)]
pub struct InMemoryConfig {
    /// Whether the in-process tier is consulted at all
    pub enabled: bool,
    /// Explicit capacity override
    pub max_entries: Option<usize>,
    /// Capacity heuristic used when a memory hint is available
    pub entries_per_gb: usize,
    /// Capacity used when neither override nor memory hint is usable
    pub default_max_entries: usize,
    /// Raw memory hint in MB, as reported by the hosting environment
    pub memory_hint_mb: Option<String>,
}

impl Default for InMemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: None,
            entries_per_gb: 5000,
            default_max_entries: 1000,
            memory_hint_mb: None,
        }
    }
}

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Timezone for interval-aligned expirations (None = UTC)
    pub timezone: Option<String>,
    /// Seconds added to a stale record's expiration when a backend is down
    pub default_expiration_extension_seconds: u64,
    /// Records larger than this many KB go to the secondary tier
    pub tier_threshold_kb: u64,
    /// In-process cache settings
    pub in_memory: InMemoryConfig,
    /// Default TTL in seconds for the HTTP service's cache profile
    pub default_expiration_seconds: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TIMEZONE` - IANA zone name (falls back to a resolvable `TZ`, then UTC)
    /// - `CACHE_EXPIRATION_EXTENSION_SECONDS` - Stale extension (default: 300)
    /// - `CACHE_TIER_THRESHOLD_KB` - Primary/secondary split (default: 10)
    /// - `CACHE_IN_MEMORY_ENABLED` - Enable the L0 tier (default: true)
    /// - `CACHE_IN_MEMORY_MAX_ENTRIES` - Explicit L0 capacity (optional)
    /// - `CACHE_IN_MEMORY_ENTRIES_PER_GB` - L0 capacity heuristic (default: 5000)
    /// - `CACHE_IN_MEMORY_DEFAULT_MAX_ENTRIES` - L0 fallback capacity (default: 1000)
    /// - `AWS_LAMBDA_FUNCTION_MEMORY_SIZE` - Memory hint in MB (optional)
    /// - `DEFAULT_EXPIRATION_SECONDS` - Service profile TTL (default: 300)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let in_memory_defaults = InMemoryConfig::default();

        Self {
            timezone: env::var("CACHE_TIMEZONE")
                .ok()
                .filter(|tz| !tz.trim().is_empty())
                .or_else(|| env::var("TZ").ok().and_then(|tz| posix_zone(&tz))),
            default_expiration_extension_seconds: parse_var(
                "CACHE_EXPIRATION_EXTENSION_SECONDS",
            )
            .unwrap_or(defaults.default_expiration_extension_seconds),
            tier_threshold_kb: parse_var("CACHE_TIER_THRESHOLD_KB")
                .unwrap_or(defaults.tier_threshold_kb),
            in_memory: InMemoryConfig {
                enabled: parse_var("CACHE_IN_MEMORY_ENABLED")
                    .unwrap_or(in_memory_defaults.enabled),
                max_entries: parse_var("CACHE_IN_MEMORY_MAX_ENTRIES"),
                entries_per_gb: parse_var("CACHE_IN_MEMORY_ENTRIES_PER_GB")
                    .unwrap_or(in_memory_defaults.entries_per_gb),
                default_max_entries: parse_var("CACHE_IN_MEMORY_DEFAULT_MAX_ENTRIES")
                    .unwrap_or(in_memory_defaults.default_max_entries),
                memory_hint_mb: env::var("AWS_LAMBDA_FUNCTION_MEMORY_SIZE").ok(),
            },
            default_expiration_seconds: parse_var("DEFAULT_EXPIRATION_SECONDS")
                .unwrap_or(defaults.default_expiration_seconds),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
        }
    }

    /// Rejects settings that would leave the cache unable to serve traffic.
    pub fn validate(&self) -> Result<()> {
        if self.tier_threshold_kb == 0 {
            return Err(CacheError::Configuration(
                "tier threshold must be a positive number of KB".to_string(),
            ));
        }
        if self.default_expiration_extension_seconds == 0 {
            return Err(CacheError::Configuration(
                "expiration extension must be a positive number of seconds".to_string(),
            ));
        }
        if self.default_expiration_seconds == 0 {
            return Err(CacheError::Configuration(
                "default expiration must be a positive number of seconds".to_string(),
            ));
        }
        Ok(())
    }

    /// Timezone name to resolve, after applying the UTC fallback.
    pub fn timezone_name(&self) -> &str {
        self.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: None,
            default_expiration_extension_seconds: 300,
            tier_threshold_kb: 10,
            in_memory: InMemoryConfig::default(),
            default_expiration_seconds: 300,
            server_port: 3000,
        }
    }
}

/// Zone name from a POSIX `TZ` value, if it names an IANA zone.
///
/// `TZ` is set by the host and may hold a leading `:` or a file path, so
/// values that do not resolve are ignored instead of failing startup.
fn posix_zone(raw: &str) -> Option<String> {
    let name = normalize_zone_name(raw);
    name.parse::<Tz>().ok().map(|_| name.to_string())
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.timezone.is_none());
        assert_eq!(config.timezone_name(), "Etc/UTC");
        assert_eq!(config.default_expiration_extension_seconds, 300);
        assert_eq!(config.tier_threshold_kb, 10);
        assert!(config.in_memory.enabled);
        assert_eq!(config.in_memory.entries_per_gb, 5000);
        assert_eq!(config.in_memory.default_max_entries, 1000);
        assert_eq!(config.server_port, 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_TIMEZONE");
        env::remove_var("TZ");
        env::remove_var("CACHE_EXPIRATION_EXTENSION_SECONDS");
        env::remove_var("CACHE_TIER_THRESHOLD_KB");
        env::remove_var("CACHE_IN_MEMORY_MAX_ENTRIES");
        env::remove_var("SERVER_PORT");

        let config = Config::from_env();
        assert!(config.timezone.is_none());
        assert_eq!(config.default_expiration_extension_seconds, 300);
        assert_eq!(config.tier_threshold_kb, 10);
        assert!(config.in_memory.max_entries.is_none());
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_posix_tz_values() {
        assert_eq!(posix_zone(":UTC").as_deref(), Some("UTC"));
        assert_eq!(posix_zone("America/Chicago").as_deref(), Some("America/Chicago"));
        assert_eq!(posix_zone(":/etc/localtime"), None);
        assert_eq!(posix_zone(""), None);
    }

    #[test]
    fn test_zero_threshold_is_rejected() {
        let config = Config {
            tier_threshold_kb: 0,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_zero_extension_is_rejected() {
        let config = Config {
            default_expiration_extension_seconds: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CacheError::Configuration(_))
        ));
    }
}
