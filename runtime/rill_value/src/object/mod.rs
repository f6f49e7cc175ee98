//! Objects and resources.
//!
//! Both are handle types: copying a value that holds one copies the handle,
//! never the instance. Each instance gets a process-unique integer id, which
//! is also what the instance turns into when used as an array key.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use rill_intern::Name;

use crate::array::ArrayValue;
use crate::heap::ValueId;
use crate::intern::names;
use crate::key::ArrayKey;
use crate::value::Value;

static NEXT_OBJECT_ID: AtomicI64 = AtomicI64::new(1);
static NEXT_RESOURCE_ID: AtomicI64 = AtomicI64::new(1);

/// Class of the values produced by [`language_error`].
pub const EXCEPTION_CLASS: &str = "Exception";

struct ObjectBody {
    id: i64,
    /// Class name as written.
    class: Name,
    props: ArrayValue,
}

/// Object instance handle.
#[derive(Clone)]
pub struct ObjectValue(Arc<ObjectBody>);

impl ObjectValue {
    /// New instance of `class` with no properties.
    pub fn new(class: &str) -> Self {
        Self::with_props(class, ArrayValue::new())
    }

    /// New instance of `class` owning `props` as its property table.
    pub fn with_props(class: &str, props: ArrayValue) -> Self {
        Self::from_parts(names().intern(class), props)
    }

    /// New instance of the same class as `self` with the given properties.
    pub(crate) fn sibling(&self, props: ArrayValue) -> Self {
        Self::from_parts(self.0.class, props)
    }

    fn from_parts(class: Name, props: ArrayValue) -> Self {
        ObjectValue(Arc::new(ObjectBody {
            id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
            class,
            props,
        }))
    }

    /// Process-unique instance number.
    #[inline]
    pub fn object_id(&self) -> i64 {
        self.0.id
    }

    pub fn class_name(&self) -> &'static str {
        names().lookup(self.0.class)
    }

    /// True if this is an instance of exactly `class` (case-insensitive).
    pub fn is_instance_of(&self, class: &str) -> bool {
        self.class_name().eq_ignore_ascii_case(class)
    }

    pub(crate) fn same_class(&self, other: &ObjectValue) -> bool {
        names().eq_ignore_case(self.0.class, other.0.class)
    }

    pub fn get_prop(&self, name: &str) -> Option<Value> {
        self.0.props.get_by_key(&ArrayKey::from(name))
    }

    pub fn set_prop(&self, name: &str, value: Value) {
        self.0.props.set_key(ArrayKey::from(name), value);
    }

    /// The property table. Writes through it are writes to the object.
    pub fn props(&self) -> &ArrayValue {
        &self.0.props
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

impl fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{} {:?}", self.class_name(), self.0.id, self.0.props)
    }
}

struct ResourceBody {
    id: i64,
    kind: Name,
}

/// Handle to an external resource (stream, connection, ...).
#[derive(Clone)]
pub struct ResourceValue(Arc<ResourceBody>);

impl ResourceValue {
    pub fn new(kind: &str) -> Self {
        ResourceValue(Arc::new(ResourceBody {
            id: NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed),
            kind: names().intern(kind),
        }))
    }

    #[inline]
    pub fn resource_id(&self) -> i64 {
        self.0.id
    }

    pub fn kind(&self) -> &'static str {
        names().lookup(self.0.kind)
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

impl fmt::Display for ResourceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resource id #{}", self.0.id)
    }
}

impl fmt::Debug for ResourceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource({}) of type ({})", self.0.id, self.kind())
    }
}

/// The language-level exception value for a runtime error: an `Exception`
/// object whose `message` property holds `message`.
pub fn language_error(message: &str) -> Value {
    let exception = ObjectValue::new(EXCEPTION_CLASS);
    exception.set_prop("message", Value::string(message));
    tracing::debug!(message, "raising language error");
    Value::Object(exception)
}

#[cfg(test)]
mod tests;
