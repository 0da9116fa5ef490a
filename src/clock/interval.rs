//! Interval Clock Module
//!
//! Computes interval-aligned expiration boundaries ("next hour", "midnight",
//! "every 4 hours") in a configured timezone.

use chrono::{DateTime, LocalResult, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DEFAULT_TIMEZONE;
use crate::error::{CacheError, Result};

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 3600;
const SECONDS_PER_DAY: i64 = 86_400;

// == Interval Unit ==
/// Boundary an aligned expiration rounds forward to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalUnit {
    /// Next whole local minute
    Minute,
    /// Next whole local hour
    Hour,
    /// Next local hour that is a multiple of N, restarting at midnight
    EveryNHours(u32),
    /// Next local midnight
    Midnight,
}

impl IntervalUnit {
    fn validate(self) -> Result<Self> {
        match self {
            IntervalUnit::EveryNHours(n) if n == 0 || n > 24 => Err(CacheError::Configuration(
                format!("every_n_hours must be between 1 and 24, got {}", n),
            )),
            unit => Ok(unit),
        }
    }

    /// Rounds a local wall-clock instant (seconds) strictly forward to the next boundary.
    fn round_up(self, local: i64) -> i64 {
        let day_start = local.div_euclid(SECONDS_PER_DAY) * SECONDS_PER_DAY;
        match self {
            IntervalUnit::Minute => {
                (local.div_euclid(SECONDS_PER_MINUTE) + 1) * SECONDS_PER_MINUTE
            }
            IntervalUnit::Hour => (local.div_euclid(SECONDS_PER_HOUR) + 1) * SECONDS_PER_HOUR,
            IntervalUnit::EveryNHours(n) => {
                let step = i64::from(n) * SECONDS_PER_HOUR;
                let next = day_start + ((local - day_start) / step + 1) * step;
                next.min(day_start + SECONDS_PER_DAY)
            }
            IntervalUnit::Midnight => day_start + SECONDS_PER_DAY,
        }
    }
}

// == Interval Spec ==
/// An interval unit bound to a resolved timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalSpec {
    pub unit: IntervalUnit,
    pub timezone: Tz,
}

// == Interval Clock ==
/// Timezone-aware clock for aligned expirations.
///
/// Built once at startup and shared by reference; independent clocks with
/// different zones can coexist in one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalClock {
    timezone: Tz,
}

impl IntervalClock {
    // == Constructor ==
    /// Resolves the timezone from the explicit argument, else the configured
    /// value, else `Etc/UTC`, and validates it with a calendar computation.
    pub fn init(explicit: Option<&str>, configured: Option<&str>) -> Result<Self> {
        let name = explicit
            .or(configured)
            .map(normalize_zone_name)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_TIMEZONE);

        let timezone: Tz = name
            .parse()
            .map_err(|_| CacheError::InvalidTimeZone(name.to_string()))?;

        let probe = Utc::now();
        let offset = timezone
            .offset_from_utc_datetime(&probe.naive_utc())
            .fix()
            .local_minus_utc();
        debug!(timezone = %timezone, offset_seconds = offset, "Interval clock initialized");

        Ok(Self { timezone })
    }

    /// Resolved timezone.
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// IANA name of the resolved timezone.
    pub fn timezone_name(&self) -> &'static str {
        self.timezone.name()
    }

    /// Binds an interval unit to this clock's timezone.
    pub fn spec(&self, unit: IntervalUnit) -> Result<IntervalSpec> {
        Ok(IntervalSpec {
            unit: unit.validate()?,
            timezone: self.timezone,
        })
    }

    // == Next Interval ==
    /// Returns the next aligned boundary strictly after `now_epoch_seconds`.
    ///
    /// The boundary is rounded once from `now`'s local wall time and then
    /// converted back to UTC in the zone. A boundary that falls inside a DST
    /// gap resolves to the end of the gap. After a fall back the wall clock
    /// repeats, so a boundary on the repeated hour is taken when it comes first.
    pub fn next_interval_in_seconds(&self, now_epoch_seconds: u64, spec: &IntervalSpec) -> u64 {
        let now = now_epoch_seconds.min(i64::MAX as u64) as i64;
        let tz = spec.timezone;

        let now_offset = offset_seconds(tz, now);
        let boundary = local_to_utc(tz, spec.unit.round_up(now + now_offset), now);

        let later_offset = offset_seconds(tz, boundary);
        let next = if later_offset < now_offset {
            let repeated = spec.unit.round_up(now + later_offset) - later_offset;
            if repeated > now && offset_seconds(tz, repeated) == later_offset {
                repeated.min(boundary)
            } else {
                boundary
            }
        } else {
            boundary
        };

        next.max(now + 1) as u64
    }

    /// Signed UTC offset in minutes (east positive) at the given instant.
    pub fn get_offset_in_minutes(&self, epoch_seconds: u64) -> i32 {
        let epoch = epoch_seconds.min(i64::MAX as u64) as i64;
        (offset_seconds(self.timezone, epoch) / SECONDS_PER_MINUTE) as i32
    }

    /// Local wall-clock time for an instant, if representable.
    pub fn local_datetime(&self, epoch_seconds: u64) -> Option<DateTime<Tz>> {
        DateTime::<Utc>::from_timestamp(epoch_seconds as i64, 0)
            .map(|utc| utc.with_timezone(&self.timezone))
    }
}

/// Strips whitespace and the POSIX `:` prefix (`TZ=:UTC`) from a zone name.
pub fn normalize_zone_name(name: &str) -> &str {
    name.trim().trim_start_matches(':').trim()
}

fn offset_seconds(tz: Tz, epoch: i64) -> i64 {
    match DateTime::<Utc>::from_timestamp(epoch, 0) {
        Some(utc) => i64::from(
            tz.offset_from_utc_datetime(&utc.naive_utc())
                .fix()
                .local_minus_utc(),
        ),
        None => 0,
    }
}

/// Converts a local wall-clock instant to UTC seconds.
///
/// Ambiguous times take the earliest instant after `now`.
fn local_to_utc(tz: Tz, local: i64, now: i64) -> i64 {
    let Some(naive) = DateTime::<Utc>::from_timestamp(local, 0).map(|utc| utc.naive_utc()) else {
        return local - offset_seconds(tz, now);
    };
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.timestamp(),
        LocalResult::Ambiguous(earliest, _) if earliest.timestamp() > now => earliest.timestamp(),
        LocalResult::Ambiguous(_, latest) => latest.timestamp(),
        LocalResult::None => gap_end(tz, local),
    }
}

/// First instant whose offset differs from the one a day before `local`.
///
/// For a local time inside a gap this is the transition that skipped it.
fn gap_end(tz: Tz, local: i64) -> i64 {
    let mut lo = local - SECONDS_PER_DAY;
    let mut hi = local + SECONDS_PER_DAY;
    let before = offset_seconds(tz, lo);
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if offset_seconds(tz, mid) == before {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    hi
}
