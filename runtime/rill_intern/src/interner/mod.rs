//! Sharded name interner with case folding.
//!
//! Function, method, and class names in the scripting language compare
//! case-insensitively but print as written. Every interned name therefore
//! records the handle of its ASCII-lowercased form, and [`NameInterner::fold`]
//! maps a name to that form without touching the text again.
//!
//! Interned text is leaked, so lookups return `&'static str` and never hold a
//! lock past the call.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::name::Name;
use crate::shard_index;

/// Magic method and well-known class names, interned up front.
const PRELUDE: &[&str] = &[
    "__construct",
    "__destruct",
    "__call",
    "__callstatic",
    "__get",
    "__set",
    "__isset",
    "__unset",
    "__sleep",
    "__wakeup",
    "__tostring",
    "__invoke",
    "__clone",
    "stdclass",
    "exception",
];

#[derive(Copy, Clone)]
struct Entry {
    text: &'static str,
    /// Handle of the lowercased text; the entry's own handle if already lower.
    folded: Name,
}

#[derive(Default)]
struct Shard {
    slots: FxHashMap<&'static str, u32>,
    entries: Vec<Entry>,
}

/// Failure to intern a name.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InternError {
    #[error("name shard {shard} is full ({count} names)")]
    ShardFull { shard: usize, count: usize },
}

/// Process-wide table of function, method, and class names.
pub struct NameInterner {
    shards: [RwLock<Shard>; Name::SHARDS],
    count: AtomicUsize,
}

impl NameInterner {
    /// Interner holding the empty name and the prelude.
    pub fn new() -> Self {
        let interner = NameInterner {
            shards: std::array::from_fn(|_| RwLock::new(Shard::default())),
            count: AtomicUsize::new(0),
        };
        {
            // The empty name must be slot 0 of shard 0 to match `Name::EMPTY`.
            let mut shard = interner.shards[0].write();
            shard.slots.insert("", 0);
            shard.entries.push(Entry {
                text: "",
                folded: Name::EMPTY,
            });
            interner.count.fetch_add(1, Ordering::Relaxed);
        }
        for name in PRELUDE {
            interner.intern(name);
        }
        interner
    }

    fn find(&self, text: &str) -> Option<Name> {
        if text.is_empty() {
            return Some(Name::EMPTY);
        }
        let shard = shard_index(text.as_bytes());
        let guard = self.shards[shard].read();
        guard
            .slots
            .get(text)
            .map(|&slot| Name::from_parts(shard, slot))
    }

    /// Intern `text` as written.
    pub fn try_intern(&self, text: &str) -> Result<Name, InternError> {
        if let Some(name) = self.find(text) {
            return Ok(name);
        }
        let folded = if text.bytes().any(|b| b.is_ascii_uppercase()) {
            Some(self.try_intern(&text.to_ascii_lowercase())?)
        } else {
            None
        };
        self.insert(text, folded)
    }

    fn insert(&self, text: &str, folded: Option<Name>) -> Result<Name, InternError> {
        let shard = shard_index(text.as_bytes());
        let mut guard = self.shards[shard].write();

        // Another thread may have inserted between `find` and the write lock.
        if let Some(&slot) = guard.slots.get(text) {
            return Ok(Name::from_parts(shard, slot));
        }

        let count = guard.entries.len();
        let slot = u32::try_from(count)
            .ok()
            .filter(|&slot| slot <= Name::MAX_SLOT)
            .ok_or(InternError::ShardFull { shard, count })?;
        let name = Name::from_parts(shard, slot);
        let text: &'static str = Box::leak(text.to_owned().into_boxed_str());
        guard.slots.insert(text, slot);
        guard.entries.push(Entry {
            text,
            folded: folded.unwrap_or(name),
        });
        self.count.fetch_add(1, Ordering::Relaxed);
        Ok(name)
    }

    /// Intern `text` as written.
    ///
    /// # Panics
    /// Panics if the name's shard is full.
    #[inline]
    pub fn intern(&self, text: &str) -> Name {
        self.try_intern(text).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Handle of the case-folded form of `text`.
    pub fn intern_folded(&self, text: &str) -> Name {
        self.fold(self.intern(text))
    }

    /// Handle of the case-folded form of an interned name.
    pub fn fold(&self, name: Name) -> Name {
        self.entry(name).map_or(name, |e| e.folded)
    }

    /// True if two names are equal ignoring ASCII case.
    pub fn eq_ignore_case(&self, a: Name, b: Name) -> bool {
        a == b || self.fold(a) == self.fold(b)
    }

    /// Text of a name. Handles from another interner read as empty.
    pub fn lookup(&self, name: Name) -> &'static str {
        self.entry(name).map_or("", |e| e.text)
    }

    fn entry(&self, name: Name) -> Option<Entry> {
        self.shards[name.shard()]
            .read()
            .entries
            .get(name.slot())
            .copied()
    }

    /// Number of interned names, the empty name included.
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// True if only the empty name is interned.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for NameInterner {
    fn default() -> Self {
        Self::new()
    }
}
