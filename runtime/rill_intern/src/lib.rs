//! Rill Intern - process-wide interning tables.
//!
//! Two tables live here:
//! - [`NameInterner`] maps method, function, and class names to compact
//!   [`Name`] handles, like a symbol table, and knows each name's
//!   case-folded form.
//! - [`CanonicalTable`] maps raw byte keys to one canonical instance of an
//!   arbitrary immutable value type. The value crate uses it for interned
//!   string values.
//!
//! Both are append-only for the life of the process and safe to share across
//! threads. Insertion is "insert if absent, else return the existing winner",
//! so two threads racing on first use never produce two canonical entries.

use std::hash::Hasher;

use rustc_hash::FxHasher;

mod interner;
mod name;
mod table;

pub use interner::{InternError, NameInterner};
pub use name::Name;
pub use table::CanonicalTable;

/// Shard holding `key` in either table.
pub(crate) fn shard_index(key: &[u8]) -> usize {
    let mut hasher = FxHasher::default();
    hasher.write(key);
    let shard = hasher.finish() % (Name::SHARDS as u64);
    usize::try_from(shard).unwrap_or(0)
}
