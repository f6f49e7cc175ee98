//! Cache error types.

use rill_value::RuntimeError;
use thiserror::Error;

use crate::fingerprint::Fingerprint;

/// Failure of a cache operation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CacheError {
    /// No canonical graph is available. The caller rebuilds the value from
    /// its source and may `store` it again.
    #[error("no cached graph for {fingerprint}")]
    Miss { fingerprint: Fingerprint },

    /// A pooled working copy was written to after its release. Never
    /// expected; indicates a handle to a released copy outlived its context.
    #[error("dirty working copy found in the pool of {fingerprint}")]
    PoolCorruption { fingerprint: Fingerprint },

    /// The context a copy was checked out into cannot accept it.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl CacheError {
    /// True for failures the caller recovers from by rebuilding the value.
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::Miss { .. })
    }
}
