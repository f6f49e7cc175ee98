//! Canonical instance table keyed by raw bytes.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::name::Name;
use crate::shard_index;

/// Append-only map from a byte key to the one canonical `V` for that key.
///
/// `V` is expected to be a cheap handle (an `Arc` or a wrapper around one);
/// [`CanonicalTable::intern`] hands out clones of the stored instance, so two
/// calls with equal keys return handles to the same allocation.
pub struct CanonicalTable<V> {
    shards: [RwLock<FxHashMap<Box<[u8]>, V>>; Name::SHARDS],
    len: AtomicUsize,
}

impl<V: Clone> CanonicalTable<V> {
    /// Create an empty table.
    pub fn new() -> Self {
        CanonicalTable {
            shards: std::array::from_fn(|_| RwLock::new(FxHashMap::default())),
            len: AtomicUsize::new(0),
        }
    }

    /// Return the canonical instance for `key`, creating it with `make` if absent.
    ///
    /// `make` runs under the shard's write lock and at most once per key
    /// across all threads.
    pub fn intern(&self, key: &[u8], make: impl FnOnce(&[u8]) -> V) -> V {
        let shard = &self.shards[shard_index(key)];

        if let Some(existing) = shard.read().get(key) {
            return existing.clone();
        }

        let mut guard = shard.write();
        if let Some(existing) = guard.get(key) {
            return existing.clone();
        }

        let value = make(key);
        guard.insert(key.into(), value.clone());
        self.len.fetch_add(1, Ordering::Relaxed);
        value
    }

    /// Canonical instance for `key`, if one was interned.
    pub fn get(&self, key: &[u8]) -> Option<V> {
        self.shards[shard_index(key)].read().get(key).cloned()
    }

    /// Number of canonical instances.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    /// True if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Default for CanonicalTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
