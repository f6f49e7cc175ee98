//! Process-wide map from payload fingerprint to cache entry.
//!
//! Entries are never reclaimed behind the caller's back: eviction is an
//! explicit policy. After every `store`, entries holding a canonical graph
//! beyond `max_entries` are evicted least-recently-used first, and
//! `evict_idle` evicts entries not used within `idle_ttl`.
//!
//! Evicting invalidates an entry and removes it from the map. Outstanding
//! checkouts only hold it weakly, so their releases are dropped.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use rill_value::{ExecContext, Value};
use rustc_hash::FxBuildHasher;
use tracing::debug;

use crate::config::CacheConfig;
use crate::entry::{CacheEntry, Checkout};
use crate::error::CacheError;
use crate::fingerprint::Fingerprint;

/// Shared cache of deserialized graphs.
pub struct SerializationCache {
    config: CacheConfig,
    entries: DashMap<Fingerprint, Arc<CacheEntry>, FxBuildHasher>,
}

impl SerializationCache {
    pub fn new(config: CacheConfig) -> Self {
        SerializationCache {
            config,
            entries: DashMap::with_hasher(FxBuildHasher),
        }
    }

    #[inline]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Number of entries, including empty ones made by [`Self::entry`].
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries currently holding a canonical graph.
    pub fn canonical_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().has_canonical())
            .count()
    }

    pub fn get(&self, fingerprint: Fingerprint) -> Option<Arc<CacheEntry>> {
        self.entries
            .get(&fingerprint)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// The entry for `fingerprint`, created empty if absent.
    pub fn entry(&self, fingerprint: Fingerprint) -> Arc<CacheEntry> {
        let entry = self
            .entries
            .entry(fingerprint)
            .or_insert_with(|| Arc::new(CacheEntry::new(fingerprint, self.config.pool_capacity)));
        Arc::clone(entry.value())
    }

    /// Store `graph` as the canonical graph for `fingerprint`, then enforce
    /// the entry limit.
    pub fn store(&self, fingerprint: Fingerprint, graph: &Value) -> Arc<CacheEntry> {
        let entry = self.entry(fingerprint);
        entry.store(graph);
        // A concurrent eviction may have removed the entry before the store.
        self.entries
            .entry(fingerprint)
            .or_insert_with(|| Arc::clone(&entry));
        self.enforce_capacity();
        entry
    }

    /// Check a working copy for `fingerprint` out into `ctx`.
    pub fn checkout(
        &self,
        fingerprint: Fingerprint,
        ctx: &mut ExecContext,
    ) -> Result<Checkout, CacheError> {
        match self.get(fingerprint) {
            Some(entry) => entry.checkout(ctx),
            None => Err(CacheError::Miss { fingerprint }),
        }
    }

    /// Invalidate the entry for `fingerprint` and drop it from the map.
    /// Returns whether one existed.
    pub fn invalidate(&self, fingerprint: Fingerprint) -> bool {
        match self.get(fingerprint) {
            Some(entry) => {
                self.evict(&entry);
                true
            }
            None => false,
        }
    }

    /// Invalidate `entry` and remove it unless a racing `store` refilled it.
    fn evict(&self, entry: &CacheEntry) {
        entry.invalidate();
        self.entries
            .remove_if(&entry.fingerprint(), |_, current| !current.has_canonical());
    }

    /// Evict every entry that has not been used since `idle_ttl` before
    /// `now`. Returns how many were evicted.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let Some(ttl) = self.config.idle_ttl else {
            return 0;
        };
        let idle: Vec<Arc<CacheEntry>> = self
            .entries
            .iter()
            .filter(|entry| {
                let entry = entry.value();
                entry.has_canonical() && now.saturating_duration_since(entry.last_used()) > ttl
            })
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for entry in &idle {
            self.evict(entry);
        }
        if !idle.is_empty() {
            debug!(evicted = idle.len(), ?ttl, "evicted idle entries");
        }
        idle.len()
    }

    fn enforce_capacity(&self) {
        // Collect first: invalidating while iterating would hold shard locks.
        let mut live: Vec<Arc<CacheEntry>> = self
            .entries
            .iter()
            .filter(|entry| entry.value().has_canonical())
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        if live.len() <= self.config.max_entries {
            return;
        }
        live.sort_by_key(|entry| entry.last_tick());
        let excess = live.len() - self.config.max_entries;
        for entry in &live[..excess] {
            debug!(fingerprint = %entry.fingerprint(), "evicting least recently used entry");
            self.evict(entry);
        }
    }
}

impl Default for SerializationCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl std::fmt::Debug for SerializationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializationCache")
            .field("config", &self.config)
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
