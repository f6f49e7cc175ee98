//! Interned name handle.

use std::fmt;

/// Handle to an interned function, method, or class name.
///
/// A name lives in one of [`Name::SHARDS`] shards of its interner. The low
/// [`Name::SHARD_BITS`] bits of the handle select the shard and the rest is
/// the slot within it, so equal handles mean byte-equal names and name
/// comparison is one integer compare.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    pub const SHARD_BITS: u32 = 4;
    pub const SHARDS: usize = 1 << Self::SHARD_BITS;
    /// Largest slot index a shard can hand out.
    pub const MAX_SLOT: u32 = u32::MAX >> Self::SHARD_BITS;
    const SHARD_MASK: u32 = (1 << Self::SHARD_BITS) - 1;

    /// The empty name; slot 0 of shard 0 in every interner.
    pub const EMPTY: Name = Name(0);

    #[inline]
    pub(crate) const fn from_parts(shard: usize, slot: u32) -> Self {
        debug_assert!(shard < Self::SHARDS);
        debug_assert!(slot <= Self::MAX_SLOT);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "shard is below SHARDS (16)"
        )]
        let shard = shard as u32;
        Name((slot << Self::SHARD_BITS) | shard)
    }

    #[inline]
    pub const fn shard(self) -> usize {
        (self.0 & Self::SHARD_MASK) as usize
    }

    #[inline]
    pub const fn slot(self) -> usize {
        (self.0 >> Self::SHARD_BITS) as usize
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({}/{})", self.shard(), self.slot())
    }
}
