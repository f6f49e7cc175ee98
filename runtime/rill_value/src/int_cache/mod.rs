//! Pooled integer instances for a hot window of small values.
//!
//! Loop counters and array indices cluster near zero. The window below is
//! allocated once per process; an [`IntHandle`] inside it is a pointer to a
//! shared [`IntSlot`], and stepping it by one is a pointer move to the
//! neighbouring slot instead of a fresh allocation. Outside the window a
//! handle just carries its number.

use std::sync::LazyLock;

use crate::value::Value;

/// Smallest pooled integer.
pub const INT_CACHE_MIN: i64 = -256;
/// Largest pooled integer.
pub const INT_CACHE_MAX: i64 = 1024;

/// One pooled integer, linked to its neighbours by position in the window.
#[derive(Debug)]
pub struct IntSlot {
    value: Value,
    n: i64,
    pos: usize,
}

static WINDOW: LazyLock<Box<[IntSlot]>> = LazyLock::new(|| {
    (INT_CACHE_MIN..=INT_CACHE_MAX)
        .enumerate()
        .map(|(pos, n)| IntSlot {
            value: Value::Int(n),
            n,
            pos,
        })
        .collect()
});

impl IntSlot {
    #[inline]
    pub fn get(&self) -> i64 {
        self.n
    }

    /// The pooled value.
    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Slot for `get() + 1`, if still inside the window.
    #[inline]
    pub fn next(&self) -> Option<&'static IntSlot> {
        WINDOW.get(self.pos + 1)
    }

    /// Slot for `get() - 1`, if still inside the window.
    #[inline]
    pub fn prev(&self) -> Option<&'static IntSlot> {
        self.pos.checked_sub(1).and_then(|pos| WINDOW.get(pos))
    }
}

/// An integer that is a pooled slot inside the hot window and a plain
/// number outside it.
#[derive(Copy, Clone, Debug)]
pub enum IntHandle {
    Pooled(&'static IntSlot),
    Plain(i64),
}

impl IntHandle {
    /// Handle for `n`, pooled when `n` is inside the window.
    pub fn create(n: i64) -> Self {
        n.checked_sub(INT_CACHE_MIN)
            .and_then(|offset| usize::try_from(offset).ok())
            .and_then(|pos| WINDOW.get(pos))
            .map_or(IntHandle::Plain(n), IntHandle::Pooled)
    }

    #[inline]
    pub fn get(self) -> i64 {
        match self {
            IntHandle::Pooled(slot) => slot.get(),
            IntHandle::Plain(n) => n,
        }
    }

    #[inline]
    pub fn is_pooled(self) -> bool {
        matches!(self, IntHandle::Pooled(_))
    }

    /// True if both handles are the same pooled instance.
    pub fn same_instance(a: Self, b: Self) -> bool {
        match (a, b) {
            (IntHandle::Pooled(x), IntHandle::Pooled(y)) => std::ptr::eq(x, y),
            _ => false,
        }
    }

    /// Handle for `get() + 1`; `None` on `i64` overflow.
    pub fn add_one(self) -> Option<Self> {
        match self {
            IntHandle::Pooled(slot) => Some(
                slot.next()
                    .map_or(IntHandle::Plain(slot.get() + 1), IntHandle::Pooled),
            ),
            IntHandle::Plain(n) => n.checked_add(1).map(Self::create),
        }
    }

    /// Handle for `get() - 1`; `None` on `i64` overflow.
    pub fn sub_one(self) -> Option<Self> {
        match self {
            IntHandle::Pooled(slot) => Some(
                slot.prev()
                    .map_or(IntHandle::Plain(slot.get() - 1), IntHandle::Pooled),
            ),
            IntHandle::Plain(n) => n.checked_sub(1).map(Self::create),
        }
    }

    /// `++x`: step, store, and return the new handle.
    pub fn pre_incr(&mut self) -> Option<Self> {
        *self = self.add_one()?;
        Some(*self)
    }

    /// `x++`: step, store, and return the old handle.
    pub fn post_incr(&mut self) -> Option<Self> {
        let old = *self;
        *self = self.add_one()?;
        Some(old)
    }

    /// `--x`
    pub fn pre_decr(&mut self) -> Option<Self> {
        *self = self.sub_one()?;
        Some(*self)
    }

    /// `x--`
    pub fn post_decr(&mut self) -> Option<Self> {
        let old = *self;
        *self = self.sub_one()?;
        Some(old)
    }

    pub fn to_value(self) -> Value {
        match self {
            IntHandle::Pooled(slot) => slot.value().clone(),
            IntHandle::Plain(n) => Value::Int(n),
        }
    }
}

impl PartialEq for IntHandle {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl Eq for IntHandle {}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
