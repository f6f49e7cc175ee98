//! Runtime error types.

use thiserror::Error;

use crate::context::ContextId;

/// Failure of an aliasing or context operation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// An alias slot was resolved against a context that was already torn
    /// down.
    #[error("alias slot used after {context} was torn down")]
    StaleAliasUse { context: ContextId },

    /// A global slot id outside the context's global layout.
    #[error("global slot {slot} is out of range for {context} ({len} slots)")]
    UnknownGlobalSlot {
        context: ContextId,
        slot: u32,
        len: usize,
    },
}

/// A cleanup hook that failed during context teardown.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("cleanup `{name}` failed: {reason}")]
pub struct CleanupError {
    pub name: &'static str,
    pub reason: String,
}
