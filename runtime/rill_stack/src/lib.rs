//! Stack growth for deep value-graph walks.
//!
//! Deep copies, comparisons, and freezes recurse once per nesting level of
//! the value graph. A script can build arrays nested far deeper than a thread
//! stack can follow, so every recursive graph walk goes through
//! [`with_stack`], which grows the stack on demand on native targets.
//!
//! On `wasm32` the call is a passthrough.

/// Remaining stack below which a new segment is allocated.
const RED_ZONE: usize = 64 * 1024;

/// Size of each newly allocated stack segment.
const SEGMENT: usize = 1024 * 1024;

/// Run `f`, first growing the stack if less than the red zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn with_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT, f)
}

/// Run `f` directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn with_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
