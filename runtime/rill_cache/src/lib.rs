//! Rill Cache - reuse of deserialized value graphs across executions.
//!
//! Deserializing the same payload in every execution is wasteful, but handing
//! one graph to many executions would let them see each other's writes. The
//! cache keeps one private *canonical* graph per payload and gives each
//! execution its own identity-preserving working copy:
//!
//! - [`CacheEntry`] owns the canonical graph and a bounded pool of clean
//!   working copies that can be handed out again
//! - [`SerializationCache`] maps payload [`Fingerprint`]s to entries and
//!   applies the eviction policy from [`CacheConfig`]
//! - [`SerializeMap`] assigns back-reference indices during a serialization
//!   pass
//!
//! A working copy is returned to the pool when its execution context tears
//! down, unless anything wrote to it.

mod config;
mod entry;
mod error;
mod fingerprint;
mod registry;
mod serialize_map;

pub use config::{CacheConfig, ENV_IDLE_SECS, ENV_MAX_ENTRIES, ENV_POOL_CAPACITY};
pub use entry::{CacheEntry, Checkout, CopyRoot, EntryState, EntryStats, ReleaseOutcome};
pub use error::CacheError;
pub use fingerprint::Fingerprint;
pub use registry::SerializationCache;
pub use serialize_map::SerializeMap;
