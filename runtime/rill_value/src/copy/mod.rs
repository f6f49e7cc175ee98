//! Identity-preserving deep copy of value graphs.
//!
//! `Value::copy_tree` duplicates every mutable node reachable from a root
//! (arrays, objects, reference cells) while keeping the *shape* of the graph:
//! a node reached along two paths is copied once and both paths lead to the
//! same copy, and cycles map onto themselves. Immutable nodes (strings,
//! frozen arrays without objects inside, resources) are shared.
//!
//! A `CopyMap` built with [`CopyMap::tracking`] tags every node it creates
//! with a shared [`DirtyFlag`]; any later write to any of those nodes sets
//! the flag. This is how a pooled working copy learns it was modified.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::array::{ArrayStorage, ArrayValue};
use crate::heap::ValueId;
use crate::value::Value;
use crate::var::Var;

/// Shared "this graph was written to" marker.
#[derive(Clone, Debug, Default)]
pub struct DirtyFlag(Arc<AtomicBool>);

impl DirtyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn mark(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Clear the flag, returning whether it was set.
    pub fn reset(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

/// Source-node to copy-node map for one deep copy.
///
/// Keys are identities of source nodes. The map keeps each source node alive
/// next to its copy, so an identity can never be reused by a new allocation
/// while the map exists.
#[derive(Default)]
pub struct CopyMap {
    copies: FxHashMap<ValueId, (Value, Value)>,
    dirty: Option<DirtyFlag>,
}

impl CopyMap {
    /// Map for a plain deep copy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map whose copies all report writes to `flag`.
    pub fn tracking(flag: DirtyFlag) -> Self {
        CopyMap {
            copies: FxHashMap::default(),
            dirty: Some(flag),
        }
    }

    /// Number of mutable nodes copied so far.
    pub fn len(&self) -> usize {
        self.copies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.copies.is_empty()
    }

    fn lookup(&self, id: ValueId) -> Option<Value> {
        self.copies.get(&id).map(|(_, copy)| copy.clone())
    }

    fn record(&mut self, id: ValueId, source: Value, copy: Value) {
        self.copies.insert(id, (source, copy));
    }
}

impl Value {
    /// Deep copy of the graph rooted at `self`, sharing structure through
    /// `map`. Copying several roots with one map preserves sharing *between*
    /// them as well.
    pub fn copy_tree(&self, map: &mut CopyMap) -> Value {
        rill_stack::with_stack(|| copy_node(self, map))
    }
}

fn copy_node(value: &Value, map: &mut CopyMap) -> Value {
    match value {
        Value::Array(array) => copy_array(array, map),
        Value::ConstArray(c) if c.is_shareable() => value.clone(),
        Value::ConstArray(c) => {
            // Objects inside a frozen array are still mutable instances.
            if let Some(done) = map.lookup(c.id()) {
                return done;
            }
            let copy = ArrayValue::with_dirty(map.dirty.clone());
            map.record(c.id(), value.clone(), Value::Array(copy.clone()));
            copy.fill(copy_entries(&c.snapshot(), map));
            Value::Array(copy)
        }
        Value::Object(object) => {
            if let Some(done) = map.lookup(object.id()) {
                return done;
            }
            let props = ArrayValue::with_dirty(map.dirty.clone());
            let copy = Value::Object(object.sibling(props.clone()));
            map.record(object.id(), value.clone(), copy.clone());
            props.fill(copy_entries(&object.props().snapshot(), map));
            copy
        }
        Value::Reference(var) => {
            if let Some(done) = map.lookup(var.id()) {
                return done;
            }
            let cell = Var::with_dirty(Value::Null, map.dirty.clone());
            let copy = Value::Reference(cell.clone());
            map.record(var.id(), value.clone(), copy.clone());
            cell.fill(copy_node(&var.get(), map));
            copy
        }
        Value::Null
        | Value::Bool(_)
        | Value::Int(_)
        | Value::Double(_)
        | Value::Str(_)
        | Value::Resource(_)
        | Value::Break(_)
        | Value::Continue(_) => value.clone(),
    }
}

fn copy_array(array: &ArrayValue, map: &mut CopyMap) -> Value {
    if let Some(done) = map.lookup(array.id()) {
        return done;
    }
    // Record before descending so back-edges resolve to the copy.
    let copy = ArrayValue::with_dirty(map.dirty.clone());
    map.record(array.id(), Value::Array(array.clone()), Value::Array(copy.clone()));
    copy.fill(copy_entries(&array.snapshot(), map));
    Value::Array(copy)
}

fn copy_entries(source: &ArrayStorage, map: &mut CopyMap) -> ArrayStorage {
    let mut out = source.empty_like();
    for (key, value) in source.iter() {
        let value = rill_stack::with_stack(|| copy_node(value, map));
        out.insert(key.clone(), value);
    }
    out
}

#[cfg(test)]
mod tests;
