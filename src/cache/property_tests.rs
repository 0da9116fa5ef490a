//! Property-Based Tests for the L0 Cache
//!
//! Uses proptest to check the L0 cache against a simple recency model.

use proptest::prelude::*;
use std::collections::VecDeque;

use crate::cache::{L0Cache, L0Status};
use crate::record::{Body, CacheRecord};

const NOW: u64 = 1_700_000_000_000;
const FUTURE: u64 = NOW + 3_600_000;

// == Strategies ==
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-f]{1,2}".prop_map(|s| s)
}

fn record_strategy() -> impl Strategy<Value = CacheRecord> {
    ("[a-zA-Z0-9 ]{0,64}", "[1-5][0-9]{2}").prop_map(|(body, status)| CacheRecord {
        body: Body::Text(body),
        status_code: status,
        expires_at: FUTURE / 1000,
        ..CacheRecord::default()
    })
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: CacheRecord },
    Get { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), record_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
    ]
}

/// Recency model: front = least recently used.
fn touch(model: &mut VecDeque<String>, key: &str) {
    model.retain(|k| k != key);
    model.push_back(key.to_string());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // A value set with a future expiration reads back unchanged.
    #[test]
    fn prop_set_then_get_returns_value(key in key_strategy(), value in record_strategy()) {
        let mut cache = L0Cache::with_max_entries(8);
        cache.set(key.clone(), value.clone(), FUTURE);

        let lookup = cache.get_at(&key, NOW);
        prop_assert_eq!(lookup.status, L0Status::Hit);
        prop_assert_eq!(lookup.data, Some(value));
    }

    // Size never exceeds capacity and the evicted key is always the least
    // recently touched one.
    #[test]
    fn prop_eviction_follows_recency(
        max_entries in 1usize..6,
        ops in prop::collection::vec(cache_op_strategy(), 1..80),
    ) {
        let mut cache = L0Cache::with_max_entries(max_entries);
        let mut model: VecDeque<String> = VecDeque::new();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    let victim = if !model.contains(&key) && model.len() >= max_entries {
                        model.pop_front()
                    } else {
                        None
                    };
                    cache.set(key.clone(), value, FUTURE);
                    touch(&mut model, &key);

                    if let Some(victim) = victim {
                        prop_assert!(!cache.contains(&victim), "evicted {} should be gone", victim);
                    }
                    for k in &model {
                        prop_assert!(cache.contains(k), "{} should still be cached", k);
                    }
                }
                CacheOp::Get { key } => {
                    let lookup = cache.get_at(&key, NOW);
                    if model.contains(&key) {
                        prop_assert_eq!(lookup.status, L0Status::Hit);
                        touch(&mut model, &key);
                    } else {
                        prop_assert_eq!(lookup.status, L0Status::Miss);
                    }
                }
            }
            prop_assert!(cache.len() <= max_entries);
            prop_assert_eq!(cache.len(), model.len());
        }
    }

    // An expired key reports Expired exactly once, then Miss.
    #[test]
    fn prop_expired_reported_once(key in key_strategy(), value in record_strategy(), age in 0u64..10_000) {
        let mut cache = L0Cache::with_max_entries(4);
        cache.set(key.clone(), value.clone(), NOW);

        let first = cache.get_at(&key, NOW + age);
        prop_assert_eq!(first.status, L0Status::Expired);
        prop_assert_eq!(first.data, Some(value));

        let second = cache.get_at(&key, NOW + age);
        prop_assert_eq!(second.status, L0Status::Miss);
    }

    // Capacity of one always holds exactly the last key written.
    #[test]
    fn prop_capacity_one_keeps_last(keys in prop::collection::vec(key_strategy(), 1..20)) {
        let mut cache = L0Cache::with_max_entries(1);
        for key in &keys {
            cache.set(key.clone(), CacheRecord::empty(key.clone()), FUTURE);
        }
        let last = keys.last().unwrap();
        prop_assert_eq!(cache.len(), 1);
        prop_assert_eq!(cache.get_at(last, NOW).status, L0Status::Hit);
    }
}
