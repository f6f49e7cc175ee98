//! Mutable cells shared by aliasing names.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::array::{writable_array, ArrayValue};
use crate::copy::DirtyFlag;
use crate::heap::ValueId;
use crate::value::Value;

struct VarCell {
    value: RwLock<Value>,
    dirty: Option<DirtyFlag>,
}

/// A mutable cell. Every name bound by reference to the same `Var` observes
/// every write through any of them.
///
/// A `Var` never holds a `Value::Reference` directly: storing a reference
/// stores the value it points at.
#[derive(Clone)]
pub struct Var(Arc<VarCell>);

impl Var {
    pub fn new(value: Value) -> Self {
        Self::with_dirty(value.to_value(), None)
    }

    pub fn null() -> Self {
        Self::new(Value::Null)
    }

    pub(crate) fn with_dirty(value: Value, dirty: Option<DirtyFlag>) -> Self {
        Var(Arc::new(VarCell {
            value: RwLock::new(value),
            dirty,
        }))
    }

    /// Current content.
    pub fn get(&self) -> Value {
        self.0.value.read().clone()
    }

    /// Replace the content and return what was stored.
    pub fn set(&self, value: Value) -> Value {
        // Resolve before locking: `value` may be a reference to this cell.
        let value = value.to_value();
        if let Some(flag) = &self.0.dirty {
            flag.mark();
        }
        *self.0.value.write() = value.clone();
        value
    }

    /// Install content built by a deep copy, without marking dirty.
    pub(crate) fn fill(&self, value: Value) {
        *self.0.value.write() = value;
    }

    /// Writable array held by this cell, creating or separating it the same
    /// way [`ArrayValue::get_array_mut`] treats an array slot.
    pub fn array_mut(&self) -> Option<ArrayValue> {
        if let Some(flag) = &self.0.dirty {
            flag.mark();
        }
        let current = self.get();
        let (array, replaced) = writable_array(Some(current), self.0.dirty.clone())?;
        if replaced {
            *self.0.value.write() = Value::Array(array.clone());
        }
        Some(array)
    }

    /// A reference value bound to this cell.
    pub fn to_ref(&self) -> Value {
        Value::Reference(self.clone())
    }

    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    #[inline]
    pub fn id(&self) -> ValueId {
        ValueId::of(&self.0)
    }
}

impl Default for Var {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "&{:?}", self.0.value.read())
    }
}

#[cfg(test)]
mod tests;
