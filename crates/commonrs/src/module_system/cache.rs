// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Memoization caches

use dashmap::DashMap;
use parking_lot::Mutex;
use std::hash::Hash;
use std::sync::Arc;

type Slot = Arc<Mutex<()>>;

/// Thread-safe map whose values are computed at most once per key.
///
/// Each key owns a slot; the first caller to reach a key runs the initializer
/// while holding the slot lock, so concurrent first requests wait for that
/// result instead of computing their own. Completed values live in a separate
/// map that readers consult without touching any slot. A failed initializer
/// removes its slot and leaves no entry behind.
///
/// Initializers must not re-enter the map for the same key on the same thread.
pub struct OnceMap<K, V> {
    slots: DashMap<K, Slot>,
    values: DashMap<K, V>,
}

impl<K, V> OnceMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a new empty map
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
            values: DashMap::new(),
        }
    }

    /// Get a computed value, never waits on an in-flight initializer
    pub fn get(&self, key: &K) -> Option<V> {
        self.values.get(key).map(|entry| entry.value().clone())
    }

    /// Check if a value has been computed for `key`
    pub fn contains(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    /// Return the value for `key`, computing it with `init` if absent
    pub fn get_or_try_init<E, F>(&self, key: K, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        loop {
            // Never hold a shard guard while waiting on a slot
            let slot = Arc::clone(self.slots.entry(key.clone()).or_default().value());
            let _guard = slot.lock();

            if let Some(value) = self.get(&key) {
                return Ok(value);
            }

            // The slot was dropped by a failed initializer while we waited
            if !self.is_current(&key, &slot) {
                continue;
            }

            return match init() {
                Ok(computed) => {
                    self.values.insert(key, computed.clone());
                    Ok(computed)
                }
                Err(err) => {
                    self.slots
                        .remove_if(&key, |_, current| Arc::ptr_eq(current, &slot));
                    Err(err)
                }
            };
        }
    }

    /// Drop every entry whose key fails `keep`
    pub fn retain(&self, keep: impl Fn(&K) -> bool) {
        self.values.retain(|key, _| keep(key));
        self.slots.retain(|key, _| keep(key));
    }

    /// Snapshot of all computed values
    pub fn values(&self) -> Vec<V> {
        self.values
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of computed values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no value has been computed
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn is_current(&self, key: &K, slot: &Slot) -> bool {
        self.slots
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current.value(), slot))
    }
}

impl<K, V> Default for OnceMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_init_runs_once() {
        let map: OnceMap<&str, u32> = OnceMap::new();
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let value = map
                .get_or_try_init::<(), _>("a", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .unwrap();
            assert_eq!(value, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(map.get(&"a"), Some(7));
    }

    #[test]
    fn test_failure_leaves_no_entry() {
        let map: OnceMap<&str, u32> = OnceMap::new();
        assert_eq!(map.get_or_try_init("a", || Err("boom")), Err("boom"));
        assert!(!map.contains(&"a"));
        assert!(map.is_empty());
        assert_eq!(map.get_or_try_init::<&str, _>("a", || Ok(1)), Ok(1));
    }

    #[test]
    fn test_concurrent_first_requests_share_one_init() {
        let map: OnceMap<&str, u32> = OnceMap::new();
        let calls = AtomicUsize::new(0);
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    let value = map
                        .get_or_try_init::<(), _>("slow", || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(Duration::from_millis(30));
                            Ok(42)
                        })
                        .unwrap();
                    assert_eq!(value, 42);
                });
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(map.values(), vec![42]);
    }

    #[test]
    fn test_reads_ignore_held_slots() {
        let map: OnceMap<&str, u32> = OnceMap::new();
        map.get_or_try_init::<(), _>("a", || Ok(1)).unwrap();

        let slot = Arc::clone(map.slots.get(&"a").unwrap().value());
        let _held = slot.lock();
        assert_eq!(map.get(&"a"), Some(1));
        assert!(map.contains(&"a"));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get_or_try_init::<(), _>("a", || Ok(2)), Ok(1));
    }

    #[test]
    fn test_in_flight_value_is_not_visible() {
        let map: OnceMap<&str, u32> = OnceMap::new();
        let value = map
            .get_or_try_init::<(), _>("a", || {
                assert!(!map.contains(&"a"));
                assert!(map.is_empty());
                Ok(3)
            })
            .unwrap();
        assert_eq!(value, 3);
        assert!(map.contains(&"a"));
    }
}
