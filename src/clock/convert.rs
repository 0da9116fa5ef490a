//! Time Conversion Utilities
//!
//! The single seconds/milliseconds conversion shared by the interval clock,
//! the record codec, and the L0 cache.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of "now" in Unix milliseconds.
pub type TimeSource = Arc<dyn Fn() -> u64 + Send + Sync>;

/// Converts whole seconds to milliseconds.
///
/// Saturates at `u64::MAX` for inputs that have no millisecond representation.
pub fn seconds_to_millis(seconds: u64) -> u64 {
    seconds.saturating_mul(1000)
}

/// Converts milliseconds to whole seconds, truncating any remainder.
pub fn millis_to_seconds(millis: u64) -> u64 {
    millis / 1000
}

/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Time source backed by the system clock.
pub fn system_time_source() -> TimeSource {
    Arc::new(current_timestamp_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_exact_scaling() {
        assert_eq!(seconds_to_millis(0), 0);
        assert_eq!(seconds_to_millis(1), 1000);
        assert_eq!(seconds_to_millis(1_704_175_200), 1_704_175_200_000);
        assert_eq!(millis_to_seconds(1999), 1);
        assert_eq!(millis_to_seconds(2000), 2);
    }

    #[test]
    fn test_overflow_saturates() {
        assert_eq!(seconds_to_millis(u64::MAX), u64::MAX);
    }

    #[test]
    fn test_system_time_source_is_current() {
        let source = system_time_source();
        let before = current_timestamp_ms();
        let now = source();
        assert!(now >= before);
    }

    proptest! {
        #[test]
        fn prop_seconds_round_trip(s in 0u64..=(u64::MAX / 1000)) {
            prop_assert_eq!(millis_to_seconds(seconds_to_millis(s)), s);
        }
    }
}
