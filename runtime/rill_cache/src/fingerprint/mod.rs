//! Content fingerprints identifying cached payloads.

use std::fmt;
use std::hash::Hasher;

use rustc_hash::FxHasher;

/// 128-bit content fingerprint of a serialized payload.
///
/// Two halves are hashed with independent seeds, so distinct payloads
/// colliding in one half still separate in the other.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u128);

const SEED_HI: u64 = 0x9e37_79b9_7f4a_7c15;
const SEED_LO: u64 = 0xc2b2_ae3d_27d4_eb4f;

impl Fingerprint {
    /// Fingerprint of a payload's bytes.
    pub fn of(bytes: impl AsRef<[u8]>) -> Self {
        let bytes = bytes.as_ref();
        let hi = half(SEED_HI, bytes);
        let lo = half(SEED_LO, bytes);
        Fingerprint((u128::from(hi) << 64) | u128::from(lo))
    }

    /// Fingerprint computed elsewhere, e.g. a checksum of the compiled
    /// definition that produced the payload.
    pub const fn from_raw(raw: u128) -> Self {
        Fingerprint(raw)
    }

    #[inline]
    pub const fn raw(self) -> u128 {
        self.0
    }
}

fn half(seed: u64, bytes: &[u8]) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write_u64(seed);
    hasher.write(bytes);
    hasher.write_usize(bytes.len());
    hasher.finish()
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}
