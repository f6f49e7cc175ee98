//! Rill - the value and serialization-cache core of a weakly-typed scripting
//! runtime.
//!
//! This crate re-exports the runtime's public surface:
//! - the value model, aliasing cells, and execution contexts from
//!   `rill_value`
//! - the serialization cache from `rill_cache`
//!
//! # Example
//!
//! ```
//! use rill::{ArrayKey, ExecContext, Fingerprint, SerializationCache, Value};
//!
//! let cache = SerializationCache::default();
//! let payload = Fingerprint::of("a:1:{s:1:\"k\";i:1;}");
//! cache.store(payload, &Value::map([(ArrayKey::from("k"), Value::Int(1))]));
//!
//! let mut ctx = ExecContext::new();
//! let copy = cache.checkout(payload, &mut ctx).unwrap();
//! assert_eq!(copy.value().to_string(), "Array");
//! ctx.teardown();
//! ```

use std::sync::Once;

pub use rill_cache::{
    CacheConfig, CacheEntry, CacheError, Checkout, CopyRoot, EntryState, EntryStats, Fingerprint,
    ReleaseOutcome, SerializationCache, SerializeMap,
};
pub use rill_value::{
    cmp, format_double, intern, interned_count, language_error, loose_eq, names, numeric_kind,
    parse_double, parse_long, ArrayIter, ArrayKey, ArrayValue, CleanupError, CleanupHandle,
    ConstArray, ContextId, CopyMap, DirtyFlag, EnvVar, ExecContext, GlobalLayout, GlobalSlotId,
    Heap, IntHandle, IntSlot, Name, Number, NumericKind, ObjectValue, ResourceValue, RuntimeError,
    StaticDecl, StaticId, StrValue, TeardownReport, Value, ValueId, ValueKind, Var, INT_CACHE_MAX,
    INT_CACHE_MIN,
};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=rill_cache=debug` or `RUST_LOG=rill_value=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
            tracing::debug!("tracing initialized");
        }
    });
}
