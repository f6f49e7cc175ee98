//! Insertion-ordered hash storage shared by array handles.

use rustc_hash::FxHashMap;

use crate::key::ArrayKey;
use crate::value::Value;

/// Tombstones tolerated before removal compacts the slot vector.
const COMPACT_MIN_TOMBSTONES: usize = 16;

/// Backing store of an array: ordered slots plus a key index.
///
/// Removal leaves a tombstone so positions held by live iterators over a
/// shared snapshot stay stable; compaction only happens on a uniquely owned
/// store (callers reach `&mut ArrayStorage` through `Arc::make_mut`).
#[derive(Clone)]
pub(crate) struct ArrayStorage {
    slots: Vec<Option<(ArrayKey, Value)>>,
    index: FxHashMap<ArrayKey, usize>,
    /// Next integer key for append; `None` once `i64::MAX` was used.
    next_index: Option<i64>,
}

impl ArrayStorage {
    pub(crate) fn new() -> Self {
        ArrayStorage {
            slots: Vec::new(),
            index: FxHashMap::default(),
            next_index: Some(0),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    pub(crate) fn get(&self, key: &ArrayKey) -> Option<&Value> {
        let pos = *self.index.get(key)?;
        self.slots[pos].as_ref().map(|(_, v)| v)
    }

    /// Insert or replace. Replacing keeps the key's original position.
    pub(crate) fn insert(&mut self, key: ArrayKey, value: Value) -> Option<Value> {
        if let Some(&pos) = self.index.get(&key) {
            if let Some((_, slot)) = self.slots[pos].as_mut() {
                return Some(std::mem::replace(slot, value));
            }
        }

        if let (ArrayKey::Int(n), Some(next)) = (&key, self.next_index) {
            if *n >= next {
                self.next_index = n.checked_add(1);
            }
        }
        self.index.insert(key.clone(), self.slots.len());
        self.slots.push(Some((key, value)));
        None
    }

    /// Append under the next integer key. `None` when the key space is spent.
    pub(crate) fn push(&mut self, value: Value) -> Option<ArrayKey> {
        let key = ArrayKey::Int(self.next_index?);
        self.insert(key.clone(), value);
        Some(key)
    }

    pub(crate) fn remove(&mut self, key: &ArrayKey) -> Option<Value> {
        let pos = self.index.remove(key)?;
        let (_, value) = self.slots[pos].take()?;
        if self.slots.len() - self.index.len() >= COMPACT_MIN_TOMBSTONES.max(self.index.len()) {
            self.compact();
        }
        Some(value)
    }

    fn compact(&mut self) {
        self.slots.retain(Option::is_some);
        for (pos, (key, _)) in self.slots.iter().flatten().enumerate() {
            self.index.insert(key.clone(), pos);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
        self.next_index = Some(0);
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&ArrayKey, &Value)> {
        self.slots.iter().flatten().map(|(k, v)| (k, v))
    }

    /// Entry at slot position `pos`: outer `None` past the end, inner `None`
    /// for a tombstone.
    #[inline]
    pub(crate) fn slot(&self, pos: usize) -> Option<Option<(&ArrayKey, &Value)>> {
        self.slots.get(pos).map(|s| s.as_ref().map(|(k, v)| (k, v)))
    }

    /// Empty store that continues this one's append counter.
    pub(crate) fn empty_like(&self) -> Self {
        ArrayStorage {
            slots: Vec::with_capacity(self.len()),
            index: FxHashMap::default(),
            next_index: self.next_index,
        }
    }
}

impl Default for ArrayStorage {
    fn default() -> Self {
        Self::new()
    }
}
