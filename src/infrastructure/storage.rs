//! Concurrent keyed storage for per-identity state.
//!
//! Backed by `DashMap`, which gives lock-free reads and fine-grained
//! per-shard locking for writes. The entry API holds one entry exclusively
//! for the duration of a mutation, which is exactly the per-key
//! serialization the rate tracker's consistency depends on.

use crate::application::ports::Storage;
use ahash::RandomState;
use dashmap::DashMap;
use std::hash::Hash;

/// Thread-safe sharded storage backed by `DashMap` with an ahash hasher.
#[derive(Debug)]
pub struct ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    map: DashMap<K, V, RandomState>,
}

impl<K, V> ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create a new storage instance.
    pub fn new() -> Self {
        Self {
            map: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Insert or replace a value.
    pub fn insert(&self, key: K, value: V) {
        self.map.insert(key, value);
    }

    /// Get a read guard for a key, if present.
    pub fn get(&self, key: &K) -> Option<impl std::ops::Deref<Target = V> + '_> {
        self.map.get(key)
    }

    /// Whether a key is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }
}

impl<K, V> Default for ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Storage<K, V> for ShardedStorage<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + std::fmt::Debug,
    V: Send + Sync + std::fmt::Debug,
{
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R,
    {
        let mut entry = self.map.entry(key).or_insert_with(factory);
        accessor(entry.value_mut())
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn remove(&self, key: &K) -> bool {
        self.map.remove(key).is_some()
    }

    fn clear(&self) {
        self.map.clear();
    }

    fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        for entry in self.map.iter() {
            f(entry.key(), entry.value());
        }
    }
}

// Allow Arc<ShardedStorage> wherever a Storage is expected.
impl<K, V> Storage<K, V> for std::sync::Arc<ShardedStorage<K, V>>
where
    K: Hash + Eq + Clone + Send + Sync + std::fmt::Debug,
    V: Send + Sync + std::fmt::Debug,
{
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R,
    {
        (**self).with_entry_mut(key, factory, accessor)
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn remove(&self, key: &K) -> bool {
        (**self).remove(key)
    }

    fn clear(&self) {
        (**self).clear()
    }

    fn for_each<F>(&self, f: F)
    where
        F: FnMut(&K, &V),
    {
        (**self).for_each(f)
    }
}
