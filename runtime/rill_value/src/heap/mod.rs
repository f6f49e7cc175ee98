//! Shared immutable heap storage.
//!
//! `Heap<T>` is the one way value payloads reach the heap. Its constructor is
//! crate-private, so outside code builds values through the `Value` and
//! `StrValue` factories and cannot smuggle in an `Arc` that someone else
//! still mutates.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Opaque identity of a heap-backed value.
///
/// Two handles have the same `ValueId` iff they point at the same
/// allocation. Only meaningful while the allocation is alive, so maps keyed
/// by `ValueId` must keep the values themselves alive for their lifetime.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(usize);

impl ValueId {
    #[inline]
    pub(crate) fn of<T: ?Sized>(arc: &Arc<T>) -> Self {
        ValueId(Arc::as_ptr(arc).cast::<()>() as usize)
    }
}

/// Immutable, reference-counted payload.
#[repr(transparent)]
pub struct Heap<T: ?Sized>(Arc<T>);

#[cfg(test)]
impl<T> Heap<T> {
    #[inline]
    pub(crate) fn new(value: T) -> Self {
        Heap(Arc::new(value))
    }
}

impl<T: ?Sized> Heap<T> {
    #[inline]
    pub(crate) fn from_arc(arc: Arc<T>) -> Self {
        Heap(arc)
    }

    /// True if both handles share one allocation.
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Identity of the allocation.
    #[inline]
    pub fn id(&self) -> ValueId {
        ValueId::of(&self.0)
    }
}

impl<T: ?Sized> Clone for Heap<T> {
    #[inline]
    fn clone(&self) -> Self {
        Heap(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> Deref for Heap<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized + PartialEq> PartialEq for Heap<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl<T: ?Sized + Eq> Eq for Heap<T> {}

impl<T: ?Sized + Hash> Hash for Heap<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (*self.0).hash(state);
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (*self.0).fmt(f)
    }
}
