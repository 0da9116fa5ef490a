//! Clock Module
//!
//! Time unit conversions, an injectable wall-clock source, and the
//! timezone-aware interval clock used for aligned expirations.

mod convert;
mod interval;

pub use convert::{
    current_timestamp_ms, millis_to_seconds, seconds_to_millis, system_time_source, TimeSource,
};
pub use interval::{normalize_zone_name, IntervalClock, IntervalSpec, IntervalUnit};
