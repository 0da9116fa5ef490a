//! Capacity Policy Module
//!
//! Derives the L0 entry limit from an explicit override, a memory hint, or
//! a fixed fallback.

use serde::Serialize;

const MB_PER_GB: f64 = 1024.0;

/// Where the capacity limit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacitySource {
    Explicit,
    MemoryHeuristic,
    Fallback,
}

// == Capacity Policy ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacityPolicy {
    /// Maximum number of entries, always at least 1
    pub max_entries: usize,
    /// Parsed memory hint, when one was supplied and valid
    pub memory_mb: Option<u64>,
    pub source: CapacitySource,
}

impl CapacityPolicy {
    // == Derive ==
    /// Resolves the limit in priority order:
    /// 1. `max_entries_override`
    /// 2. `round(memory_mb / 1024 * entries_per_gb)` when the hint is a positive number
    /// 3. `default_max_entries`
    ///
    /// The result is floored to 1.
    pub fn derive(
        max_entries_override: Option<usize>,
        memory_hint_mb: Option<&str>,
        entries_per_gb: usize,
        default_max_entries: usize,
    ) -> Self {
        let memory_mb = memory_hint_mb
            .and_then(|hint| hint.trim().parse::<f64>().ok())
            .filter(|mb| mb.is_finite() && *mb > 0.0);

        let (max_entries, source) = match (max_entries_override, memory_mb) {
            (Some(explicit), _) => (explicit, CapacitySource::Explicit),
            (None, Some(mb)) => (
                ((mb / MB_PER_GB) * entries_per_gb as f64).round() as usize,
                CapacitySource::MemoryHeuristic,
            ),
            (None, None) => (default_max_entries, CapacitySource::Fallback),
        };

        Self {
            max_entries: max_entries.max(1),
            memory_mb: memory_mb.map(|mb| mb.round() as u64),
            source,
        }
    }

    /// Fixed limit with no memory hint.
    pub fn fixed(max_entries: usize) -> Self {
        Self::derive(Some(max_entries), None, 0, 0)
    }
}
