//! Ordered copy-on-write arrays.
//!
//! An array is a handle (`ArrayValue`) onto an `Arc<ArrayStorage>`. Cloning
//! the handle aliases the same array instance; [`ArrayValue::copy`] produces a
//! new instance that *shares* the storage until either side writes, at which
//! point the writer clones the storage (`Arc::make_mut`) and continues alone.
//!
//! `ConstArray` is the frozen variant: immutable storage plus memoized
//! key/value lists handed out as copy-on-write copies.
//!
//! # Nested arrays
//!
//! Storage clones are shallow: nested array handles are shared between the
//! two stores afterwards. Writes into a nested array go through
//! [`ArrayValue::get_array_mut`], which separates a nested handle that is
//! referenced from more than one place before returning it.

mod storage;

use std::cell::Cell;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

pub(crate) use storage::ArrayStorage;

use crate::copy::DirtyFlag;
use crate::heap::ValueId;
use crate::key::ArrayKey;
use crate::value::Value;

/// Handles expected on an unshared nested array while it is being inspected:
/// the slot holding it and the inspector's clone.
const UNSHARED_HANDLES: usize = 2;

struct ArrayBody {
    storage: Arc<ArrayStorage>,
    /// Set when this array belongs to a pooled working copy.
    dirty: Option<DirtyFlag>,
}

/// Mutable ordered array handle.
#[derive(Clone)]
pub struct ArrayValue(Arc<RwLock<ArrayBody>>);

impl ArrayValue {
    /// Empty array.
    pub fn new() -> Self {
        Self::from_storage(Arc::new(ArrayStorage::new()), None)
    }

    pub(crate) fn from_storage(storage: Arc<ArrayStorage>, dirty: Option<DirtyFlag>) -> Self {
        ArrayValue(Arc::new(RwLock::new(ArrayBody { storage, dirty })))
    }

    pub(crate) fn with_dirty(dirty: Option<DirtyFlag>) -> Self {
        Self::from_storage(Arc::new(ArrayStorage::new()), dirty)
    }

    /// List array `[0 => v0, 1 => v1, ...]`.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        let mut storage = ArrayStorage::new();
        for value in values {
            storage.push(value);
        }
        Self::from_storage(Arc::new(storage), None)
    }

    /// Array from key/value pairs in order. Later duplicates replace earlier
    /// values in place.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (ArrayKey, Value)>) -> Self {
        let mut storage = ArrayStorage::new();
        for (key, value) in pairs {
            storage.insert(key, value);
        }
        Self::from_storage(Arc::new(storage), None)
    }

    /// Current storage, shared.
    #[inline]
    pub(crate) fn snapshot(&self) -> Arc<ArrayStorage> {
        Arc::clone(&self.0.read().storage)
    }

    #[inline]
    pub(crate) fn handle_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// Install storage built by a deep copy. Does not mark the array dirty.
    pub(crate) fn fill(&self, storage: ArrayStorage) {
        self.0.write().storage = Arc::new(storage);
    }

    /// Run `f` on uniquely owned storage, cloning it first if shared.
    fn mutate<R>(&self, f: impl FnOnce(&mut ArrayStorage) -> R) -> R {
        let mut body = self.0.write();
        if let Some(flag) = &body.dirty {
            flag.mark();
        }
        f(Arc::make_mut(&mut body.storage))
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.0.read().storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element under `key`. Keys that cannot index an array find nothing.
    pub fn get(&self, key: &Value) -> Option<Value> {
        self.get_by_key(&key.to_key().ok()?)
    }

    /// Element under an already normalized key.
    pub fn get_by_key(&self, key: &ArrayKey) -> Option<Value> {
        self.0.read().storage.get(key).cloned()
    }

    /// True if `key` is present, even when it holds `null`.
    pub fn contains_key(&self, key: &Value) -> bool {
        key.to_key()
            .is_ok_and(|k| self.0.read().storage.get(&k).is_some())
    }

    /// Store `value` under `key` as given.
    ///
    /// Handles are stored as-is; value-copy assignment is the caller's
    /// `Value::copy`. Errors with the language exception when `key` cannot
    /// index an array.
    pub fn set(&self, key: &Value, value: Value) -> Result<(), Value> {
        let key = key.to_key()?;
        self.set_key(key, value);
        Ok(())
    }

    /// Store `value` under a normalized key, returning the previous value.
    pub fn set_key(&self, key: ArrayKey, value: Value) -> Option<Value> {
        self.mutate(|s| s.insert(key, value))
    }

    /// Append under the next integer key.
    ///
    /// Returns the key used, or `None` if the integer key space is spent.
    pub fn append(&self, value: Value) -> Option<ArrayKey> {
        self.mutate(|s| s.push(value))
    }

    /// Remove the element under `key`, returning it. The append counter is
    /// not rewound.
    pub fn remove(&self, key: &Value) -> Option<Value> {
        self.remove_key(&key.to_key().ok()?)
    }

    pub fn remove_key(&self, key: &ArrayKey) -> Option<Value> {
        // Skip the storage clone when there is nothing to remove.
        self.get_by_key(key)?;
        self.mutate(|s| s.remove(key))
    }

    /// Remove every element and restart appending at 0.
    pub fn clear(&self) {
        self.mutate(ArrayStorage::clear);
    }

    /// Writable nested array under `key`, creating or separating it.
    ///
    /// - missing, `null` or `false`: a new empty array is stored and returned
    /// - an array referenced from elsewhere: replaced by its own copy first
    /// - a frozen array: replaced by a mutable copy
    /// - a reference: the referenced cell's array (see [`Var::array_mut`])
    ///
    /// Returns `None` for any other scalar or an invalid key.
    ///
    /// [`Var::array_mut`]: crate::Var::array_mut
    pub fn get_array_mut(&self, key: &Value) -> Option<ArrayValue> {
        let key = key.to_key().ok()?;

        let (current, dirty) = {
            let mut body = self.0.write();
            if let Some(flag) = &body.dirty {
                flag.mark();
            }
            let dirty = body.dirty.clone();
            let current = Arc::make_mut(&mut body.storage).get(&key).cloned();
            (current, dirty)
        };

        if let Some(Value::Reference(var)) = &current {
            return var.array_mut();
        }

        let (array, replaced) = writable_array(current, dirty)?;
        if replaced {
            self.mutate(|s| s.insert(key, Value::Array(array.clone())));
        }
        Some(array)
    }

    /// Keys as a new list array.
    pub fn get_keys(&self) -> ArrayValue {
        let storage = self.snapshot();
        ArrayValue::from_values(storage.iter().map(|(k, _)| k.to_value()))
    }

    /// Values as a new list array.
    pub fn get_values(&self) -> ArrayValue {
        let storage = self.snapshot();
        ArrayValue::from_values(storage.iter().map(|(_, v)| v.clone()))
    }

    /// Owned key/value pairs in order.
    pub fn entries(&self) -> Vec<(ArrayKey, Value)> {
        let storage = self.snapshot();
        storage
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Iterate over a snapshot; later writes do not affect the iteration.
    pub fn iter(&self) -> ArrayIter {
        ArrayIter::new(self.snapshot())
    }

    /// Value copy: a new array sharing this one's storage until a write.
    pub fn copy(&self) -> ArrayValue {
        Self::from_storage(self.snapshot(), None)
    }

    pub(crate) fn copy_with_dirty(&self, dirty: Option<DirtyFlag>) -> ArrayValue {
        Self::from_storage(self.snapshot(), dirty)
    }

    /// Frozen snapshot. Nested arrays are frozen too and references are
    /// replaced by the values they hold; a nested array that refers back to
    /// one still being frozen becomes `null`.
    pub fn freeze(&self) -> ConstArray {
        let mut seen = FxHashMap::default();
        freeze_array(self, &mut seen)
    }

    /// True if both arrays currently read the same storage.
    pub fn shares_storage_with(&self, other: &ArrayValue) -> bool {
        Arc::ptr_eq(&self.0.read().storage, &other.0.read().storage)
    }

    /// Number of array instances (and snapshots) sharing this storage.
    pub fn storage_sharers(&self) -> usize {
        // Minus the temporary held by this call.
        Arc::strong_count(&self.snapshot()) - 1
    }

    /// True if both handles are the same array instance.
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    #[inline]
    pub fn id(&self) -> ValueId {
        ValueId::of(&self.0)
    }
}

impl Default for ArrayValue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_storage(&self.snapshot(), f)
    }
}

/// Writable array for a slot's current content, and whether the slot must be
/// updated to hold it. `None` if the content cannot become an array.
pub(crate) fn writable_array(
    current: Option<Value>,
    dirty: Option<DirtyFlag>,
) -> Option<(ArrayValue, bool)> {
    match current {
        None | Some(Value::Null | Value::Bool(false)) => Some((ArrayValue::with_dirty(dirty), true)),
        Some(Value::Array(a)) if a.handle_count() > UNSHARED_HANDLES => {
            Some((a.copy_with_dirty(dirty), true))
        }
        Some(Value::Array(a)) => Some((a, false)),
        Some(Value::ConstArray(c)) => Some((c.copy_with_dirty(dirty), true)),
        Some(_) => None,
    }
}

/// Frozen, immutable array.
///
/// Key and value lists are computed once and handed out as copy-on-write
/// copies, so callers may mutate what they receive without affecting later
/// callers.
#[derive(Clone)]
pub struct ConstArray(Arc<ConstBody>);

struct ConstBody {
    storage: Arc<ArrayStorage>,
    keys: OnceLock<ArrayValue>,
    values: OnceLock<ArrayValue>,
    /// No objects anywhere inside, so deep copies may share this instance.
    shareable: bool,
}

impl ConstArray {
    /// Frozen array from key/value pairs; mutable values are frozen.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (ArrayKey, Value)>) -> Self {
        ArrayValue::from_pairs(pairs).freeze()
    }

    /// Frozen list array; mutable values are frozen.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        ArrayValue::from_values(values).freeze()
    }

    /// Wrap storage whose values are already frozen.
    fn from_frozen(storage: Arc<ArrayStorage>) -> Self {
        let shareable = storage.iter().all(|(_, v)| match v {
            Value::Object(_) => false,
            Value::ConstArray(c) => c.is_shareable(),
            _ => true,
        });
        ConstArray(Arc::new(ConstBody {
            storage,
            keys: OnceLock::new(),
            values: OnceLock::new(),
            shareable,
        }))
    }

    #[inline]
    pub(crate) fn snapshot(&self) -> Arc<ArrayStorage> {
        Arc::clone(&self.0.storage)
    }

    #[inline]
    pub(crate) fn is_shareable(&self) -> bool {
        self.0.shareable
    }

    pub fn len(&self) -> usize {
        self.0.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element under `key`, normalized as on insert.
    pub fn get(&self, key: &Value) -> Option<Value> {
        self.get_by_key(&key.to_key().ok()?)
    }

    pub fn get_by_key(&self, key: &ArrayKey) -> Option<Value> {
        self.0.storage.get(key).cloned()
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        key.to_key().is_ok_and(|k| self.0.storage.get(&k).is_some())
    }

    /// Keys as a list array. Computed once; every call returns a fresh
    /// copy-on-write copy of the memoized list.
    pub fn get_keys(&self) -> ArrayValue {
        self.0
            .keys
            .get_or_init(|| {
                ArrayValue::from_values(self.0.storage.iter().map(|(k, _)| k.to_value()))
            })
            .copy()
    }

    /// Values as a list array, memoized like [`ConstArray::get_keys`].
    pub fn get_values(&self) -> ArrayValue {
        self.0
            .values
            .get_or_init(|| ArrayValue::from_values(self.0.storage.iter().map(|(_, v)| v.clone())))
            .copy()
    }

    pub fn entries(&self) -> Vec<(ArrayKey, Value)> {
        self.0
            .storage
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> ArrayIter {
        ArrayIter::new(self.snapshot())
    }

    /// Mutable copy sharing this array's storage until written.
    pub fn copy(&self) -> ArrayValue {
        ArrayValue::from_storage(self.snapshot(), None)
    }

    pub(crate) fn copy_with_dirty(&self, dirty: Option<DirtyFlag>) -> ArrayValue {
        ArrayValue::from_storage(self.snapshot(), dirty)
    }

    /// True if `other` is a copy of this array that has not been written.
    pub fn shares_storage_with(&self, other: &ArrayValue) -> bool {
        Arc::ptr_eq(&self.0.storage, &other.0.read().storage)
    }

    /// True if both handles are the same frozen instance.
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    #[inline]
    pub fn id(&self) -> ValueId {
        ValueId::of(&self.0)
    }
}

impl fmt::Debug for ConstArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("const ")?;
        debug_storage(&self.0.storage, f)
    }
}

/// Iterator over an array snapshot, yielding owned entries.
pub struct ArrayIter {
    storage: Arc<ArrayStorage>,
    pos: usize,
}

impl ArrayIter {
    fn new(storage: Arc<ArrayStorage>) -> Self {
        ArrayIter { storage, pos: 0 }
    }
}

impl Iterator for ArrayIter {
    type Item = (ArrayKey, Value);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let slot = self.storage.slot(self.pos)?;
            self.pos += 1;
            if let Some((k, v)) = slot {
                return Some((k.clone(), v.clone()));
            }
        }
    }
}

// Freezing

/// Arrays being frozen (`None`) or already frozen during one `freeze` call.
type FreezeMap = FxHashMap<ValueId, Option<ConstArray>>;

fn freeze_array(array: &ArrayValue, seen: &mut FreezeMap) -> ConstArray {
    rill_stack::with_stack(|| {
        let storage = array.snapshot();
        if !storage
            .iter()
            .any(|(_, v)| matches!(v, Value::Array(_) | Value::Reference(_)))
        {
            return ConstArray::from_frozen(storage);
        }

        seen.insert(array.id(), None);
        let mut frozen = storage.empty_like();
        for (key, value) in storage.iter() {
            frozen.insert(key.clone(), freeze_value(value, seen));
        }
        let frozen = ConstArray::from_frozen(Arc::new(frozen));
        seen.insert(array.id(), Some(frozen.clone()));
        frozen
    })
}

fn freeze_value(value: &Value, seen: &mut FreezeMap) -> Value {
    match value {
        Value::Array(inner) => match seen.get(&inner.id()) {
            Some(Some(done)) => Value::ConstArray(done.clone()),
            Some(None) => Value::Null,
            None => Value::ConstArray(freeze_array(inner, seen)),
        },
        Value::Reference(var) => freeze_value(&var.get(), seen),
        other => other.clone(),
    }
}

// Debug output

const DEBUG_MAX_DEPTH: u32 = 8;

thread_local! {
    static DEBUG_DEPTH: Cell<u32> = const { Cell::new(0) };
}

fn debug_storage(storage: &ArrayStorage, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let depth = DEBUG_DEPTH.with(Cell::get);
    if depth >= DEBUG_MAX_DEPTH {
        return f.write_str("[...]");
    }
    DEBUG_DEPTH.with(|d| d.set(depth + 1));
    let result = f.debug_map().entries(storage.iter()).finish();
    DEBUG_DEPTH.with(|d| d.set(depth));
    result
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
