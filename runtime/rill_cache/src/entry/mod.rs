//! One cached payload: its canonical graph and pool of working copies.
//!
//! # States
//!
//! | State       | Canonical graph | Pool          |
//! |-------------|-----------------|---------------|
//! | `Empty`     | none            | empty         |
//! | `Canonical` | present         | empty         |
//! | `Pooled(n)` | present         | `n` copies    |
//!
//! `store` moves any state to `Canonical`; `invalidate` moves any state to
//! `Empty`. Every `store` and `invalidate` starts a new *generation*. A working
//! copy remembers the generation it was made from and is only ever pooled
//! (or handed out from the pool) while that generation is current.
//!
//! # Races
//!
//! A checkout that has already cloned the canonical graph's `Arc` completes
//! even if an invalidation runs concurrently; the copy it produced belongs to
//! the old generation and is discarded on release.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use crossbeam::queue::ArrayQueue;
use parking_lot::{Mutex, RwLock};
use rill_value::{CleanupHandle, CopyMap, DirtyFlag, ExecContext, RuntimeError, Value};
use tracing::{debug, error, trace};

use crate::error::CacheError;
use crate::fingerprint::Fingerprint;

/// Logical clock ordering entry use for LRU eviction.
static USE_CLOCK: AtomicU64 = AtomicU64::new(1);

/// Observable state of an entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntryState {
    Empty,
    Canonical,
    /// Canonical graph plus this many pooled copies.
    Pooled(usize),
}

/// What happened to a working copy handed back with [`CacheEntry::release`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Pooled,
    /// Written to; never handed out again.
    DiscardedDirty,
    /// Made from a graph that has since been replaced or invalidated.
    DiscardedStale,
    /// Clean, but the pool was already full.
    DiscardedFull,
}

/// Snapshot of an entry's counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryStats {
    pub stores: u64,
    /// Working copies made by deep-copying the canonical graph.
    pub copies: u64,
    /// Checkouts served from the pool.
    pub pool_hits: u64,
    pub misses: u64,
    pub pooled_releases: u64,
    /// Released copies dropped for being dirty, stale, or surplus.
    pub discarded: u64,
}

#[derive(Default)]
struct Counters {
    stores: AtomicU64,
    copies: AtomicU64,
    pool_hits: AtomicU64,
    misses: AtomicU64,
    pooled_releases: AtomicU64,
    discarded: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> EntryStats {
        EntryStats {
            stores: self.stores.load(Ordering::Relaxed),
            copies: self.copies.load(Ordering::Relaxed),
            pool_hits: self.pool_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            pooled_releases: self.pooled_releases.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

/// One checked-out working copy: the copied root, the flag every node of the
/// copy reports writes to, and the generation it was copied from.
pub struct CopyRoot {
    root: Value,
    dirty: DirtyFlag,
    generation: u64,
    from_pool: bool,
}

impl CopyRoot {
    #[inline]
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Record a write the copy's own nodes cannot observe.
    pub fn mark_dirty(&self) {
        self.dirty.mark();
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True if this copy was reused from the pool rather than freshly made.
    #[inline]
    pub fn from_pool(&self) -> bool {
        self.from_pool
    }
}

impl std::fmt::Debug for CopyRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CopyRoot")
            .field("generation", &self.generation)
            .field("dirty", &self.is_dirty())
            .field("from_pool", &self.from_pool)
            .finish_non_exhaustive()
    }
}

/// A working copy checked out into an [`ExecContext`]. The copy itself is
/// owned by the context's cleanup hook, which releases it at teardown.
#[derive(Debug)]
pub struct Checkout {
    value: Value,
    dirty: DirtyFlag,
    generation: u64,
    from_pool: bool,
    cleanup: CleanupHandle,
}

impl Checkout {
    /// Root of the working copy.
    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Record a write the copy's own nodes cannot observe, so the copy is
    /// not pooled on release.
    pub fn mark_dirty(&self) {
        self.dirty.mark();
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn from_pool(&self) -> bool {
        self.from_pool
    }

    /// The context hook that will release this copy.
    #[inline]
    pub fn cleanup_handle(&self) -> CleanupHandle {
        self.cleanup
    }
}

/// Canonical graph and copy pool for one payload.
pub struct CacheEntry {
    fingerprint: Fingerprint,
    canonical: RwLock<Option<Arc<Value>>>,
    /// Written only while `canonical` is write-locked.
    generation: AtomicU64,
    pool: ArrayQueue<CopyRoot>,
    last_tick: AtomicU64,
    last_used: Mutex<Instant>,
    counters: Counters,
}

impl CacheEntry {
    /// Empty entry pooling at most `pool_capacity` copies (at least one).
    pub fn new(fingerprint: Fingerprint, pool_capacity: usize) -> Self {
        CacheEntry {
            fingerprint,
            canonical: RwLock::new(None),
            generation: AtomicU64::new(0),
            pool: ArrayQueue::new(pool_capacity.max(1)),
            last_tick: AtomicU64::new(USE_CLOCK.fetch_add(1, Ordering::Relaxed)),
            last_used: Mutex::new(Instant::now()),
            counters: Counters::default(),
        }
    }

    #[inline]
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Current generation. Changes on every `store` and `invalidate`.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn state(&self) -> EntryState {
        if self.canonical.read().is_none() {
            return EntryState::Empty;
        }
        match self.pool.len() {
            0 => EntryState::Canonical,
            n => EntryState::Pooled(n),
        }
    }

    pub fn has_canonical(&self) -> bool {
        self.canonical.read().is_some()
    }

    pub fn pooled(&self) -> usize {
        self.pool.len()
    }

    pub fn stats(&self) -> EntryStats {
        self.counters.snapshot()
    }

    /// Logical time of the last store or checkout; larger is more recent.
    pub(crate) fn last_tick(&self) -> u64 {
        self.last_tick.load(Ordering::Relaxed)
    }

    /// Wall-clock time of the last store or checkout.
    pub fn last_used(&self) -> Instant {
        *self.last_used.lock()
    }

    fn touch(&self) {
        self.last_tick
            .store(USE_CLOCK.fetch_add(1, Ordering::Relaxed), Ordering::Relaxed);
        *self.last_used.lock() = Instant::now();
    }

    /// Replace the canonical graph with a private deep copy of `graph`.
    /// Handles the caller keeps cannot reach the stored graph. Pooled copies
    /// of the previous graph are dropped.
    #[tracing::instrument(level = "debug", skip_all, fields(fingerprint = %self.fingerprint))]
    pub fn store(&self, graph: &Value) {
        let canonical = Arc::new(graph.copy_tree(&mut CopyMap::new()));
        {
            let mut slot = self.canonical.write();
            *slot = Some(canonical);
            self.generation.fetch_add(1, Ordering::AcqRel);
        }
        let dropped = self.drain_pool();
        Counters::bump(&self.counters.stores);
        self.touch();
        debug!(generation = self.generation(), dropped, "stored canonical graph");
    }

    /// Drop the canonical graph and every pooled copy. Checkouts miss until
    /// the next `store`.
    #[tracing::instrument(level = "debug", skip_all, fields(fingerprint = %self.fingerprint))]
    pub fn invalidate(&self) {
        let had_graph = {
            let mut slot = self.canonical.write();
            self.generation.fetch_add(1, Ordering::AcqRel);
            slot.take().is_some()
        };
        let dropped = self.drain_pool();
        debug!(had_graph, dropped, "invalidated");
    }

    fn drain_pool(&self) -> usize {
        let mut dropped = 0;
        while self.pool.pop().is_some() {
            dropped += 1;
        }
        dropped
    }

    /// A working copy of the canonical graph not tied to any context. The
    /// caller hands it back with [`CacheEntry::release`].
    ///
    /// Reuses a pooled copy when one is available, otherwise deep-copies the
    /// canonical graph preserving its sharing and cycles.
    #[tracing::instrument(level = "trace", skip_all, fields(fingerprint = %self.fingerprint))]
    pub fn checkout_root(&self) -> Result<CopyRoot, CacheError> {
        let current = self.generation();
        while let Some(mut copy) = self.pool.pop() {
            if copy.generation != current {
                Counters::bump(&self.counters.discarded);
                continue;
            }
            if copy.is_dirty() {
                error!(
                    fingerprint = %self.fingerprint,
                    generation = copy.generation,
                    "dirty working copy in pool"
                );
                return Err(CacheError::PoolCorruption {
                    fingerprint: self.fingerprint,
                });
            }
            copy.from_pool = true;
            Counters::bump(&self.counters.pool_hits);
            self.touch();
            trace!("reused pooled copy");
            return Ok(copy);
        }

        let (canonical, generation) = {
            let slot = self.canonical.read();
            match slot.as_ref() {
                Some(graph) => (Arc::clone(graph), self.generation()),
                None => {
                    Counters::bump(&self.counters.misses);
                    trace!("miss");
                    return Err(CacheError::Miss {
                        fingerprint: self.fingerprint,
                    });
                }
            }
        };

        let dirty = DirtyFlag::new();
        let root = canonical.copy_tree(&mut CopyMap::tracking(dirty.clone()));
        Counters::bump(&self.counters.copies);
        self.touch();
        trace!(generation, "made working copy");
        Ok(CopyRoot {
            root,
            dirty,
            generation,
            from_pool: false,
        })
    }

    /// Check a working copy out into `ctx`. The copy is released back to
    /// this entry when `ctx` tears down.
    pub fn checkout(self: &Arc<Self>, ctx: &mut ExecContext) -> Result<Checkout, CacheError> {
        if !ctx.is_active() {
            return Err(RuntimeError::StaleAliasUse { context: ctx.id() }.into());
        }
        let copy = self.checkout_root()?;
        let value = copy.root.clone();
        let dirty = copy.dirty.clone();
        let generation = copy.generation;
        let from_pool = copy.from_pool;

        let entry: Weak<CacheEntry> = Arc::downgrade(self);
        let cleanup = ctx.add_cleanup("release working copy", move || {
            if let Some(entry) = entry.upgrade() {
                entry.release(copy);
            }
            Ok(())
        })?;
        Ok(Checkout {
            value,
            dirty,
            generation,
            from_pool,
            cleanup,
        })
    }

    /// Hand a working copy back. Clean copies of the current generation go
    /// to the pool while it has room; all others are dropped.
    pub fn release(&self, copy: CopyRoot) -> ReleaseOutcome {
        let outcome = if copy.is_dirty() {
            ReleaseOutcome::DiscardedDirty
        } else if copy.generation != self.generation() {
            ReleaseOutcome::DiscardedStale
        } else {
            match self.pool.push(CopyRoot {
                from_pool: false,
                ..copy
            }) {
                Ok(()) => ReleaseOutcome::Pooled,
                Err(_) => ReleaseOutcome::DiscardedFull,
            }
        };
        if outcome == ReleaseOutcome::Pooled {
            Counters::bump(&self.counters.pooled_releases);
        } else {
            Counters::bump(&self.counters.discarded);
        }
        trace!(fingerprint = %self.fingerprint, ?outcome, "released working copy");
        outcome
    }
}

impl std::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("fingerprint", &self.fingerprint)
            .field("state", &self.state())
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
