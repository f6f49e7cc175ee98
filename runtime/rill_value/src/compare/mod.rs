//! Loose comparison (`<`, `==`, `<=>`) between values of any types.
//!
//! The rules are ordered; the first that applies decides:
//!
//! 1. a string against `null` compares the string with `""`
//! 2. two strings compare byte-wise
//! 3. if either side is a bool, `null` or control signal, both sides compare
//!    as bools (`false < true`)
//! 4. two objects compare by their properties when of the same class
//! 5. two arrays compare by size, then value by value in the left array's
//!    order; a key missing on the right makes the left side greater
//! 6. two numeric-capable values compare as numbers
//! 7. an array is greater than anything else, then an object is
//!
//! `loose_eq` follows its own ladder; see its docs.

use std::cmp::Ordering;

use crate::array::ArrayStorage;
use crate::numeric::{Number, NumericKind};
use crate::value::Value;

/// Three-way loose comparison of `a` and `b`.
pub fn cmp(a: &Value, b: &Value) -> Ordering {
    rill_stack::with_stack(|| compare_values(&a.to_value(), &b.to_value()))
}

/// Loose (`==`) equality.
///
/// 1. a string against `null` is equal iff the string is empty
/// 2. if either side is a bool, `null` or signal, both compare as bools
/// 3. two arrays are equal when they hold loosely equal values under the
///    same keys, in any order; an array never equals a non-array
/// 4. two objects are equal when they are one instance, or of one class
///    with loosely equal properties; an object never equals a non-object
/// 5. two strings that are both numeric compare as numbers, otherwise
///    byte-wise
/// 6. two values convertible to integers compare as integers
/// 7. if either side is number-convertible both compare as doubles
/// 8. otherwise both compare as strings
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    rill_stack::with_stack(|| equal_values(&a.to_value(), &b.to_value()))
}

impl Value {
    /// Three-way loose comparison; see [`cmp`].
    #[inline]
    pub fn compare(&self, other: &Value) -> Ordering {
        cmp(self, other)
    }

    #[inline]
    pub fn loose_eq(&self, other: &Value) -> bool {
        loose_eq(self, other)
    }

    #[inline]
    pub fn lt(&self, other: &Value) -> bool {
        cmp(self, other) == Ordering::Less
    }

    #[inline]
    pub fn leq(&self, other: &Value) -> bool {
        cmp(self, other) != Ordering::Greater
    }

    #[inline]
    pub fn gt(&self, other: &Value) -> bool {
        cmp(self, other) == Ordering::Greater
    }

    #[inline]
    pub fn geq(&self, other: &Value) -> bool {
        cmp(self, other) != Ordering::Less
    }
}

#[inline]
fn is_boolish(v: &Value) -> bool {
    matches!(
        v,
        Value::Null | Value::Bool(_) | Value::Break(_) | Value::Continue(_)
    )
}

#[inline]
fn is_number_capable(v: &Value) -> bool {
    matches!(
        v,
        Value::Int(_) | Value::Double(_) | Value::Str(_) | Value::Resource(_)
    )
}

/// Compare two numbers, promoting to double unless both are integers.
/// NaN compares greater than everything.
fn compare_numbers(a: Number, b: Number) -> Ordering {
    match (a, b) {
        (Number::Long(x), Number::Long(y)) => x.cmp(&y),
        (x, y) => x
            .to_double()
            .partial_cmp(&y.to_double())
            .unwrap_or(Ordering::Greater),
    }
}

/// Operands are already dereferenced.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Str(s), Value::Null) => {
            if s.is_empty() {
                Ordering::Equal
            } else {
                Ordering::Greater
            }
        }
        (Value::Null, Value::Str(s)) => {
            if s.is_empty() {
                Ordering::Equal
            } else {
                Ordering::Less
            }
        }
        (Value::Str(x), Value::Str(y)) => x.as_bytes().cmp(y.as_bytes()),
        (x, y) if is_boolish(x) || is_boolish(y) => x.to_bool().cmp(&y.to_bool()),
        (Value::Object(x), Value::Object(y)) => {
            if x.same_class(y) {
                compare_arrays(&x.props().snapshot(), &y.props().snapshot())
            } else {
                Ordering::Greater
            }
        }
        (x, y) if x.is_array() && y.is_array() => match (x.array_snapshot(), y.array_snapshot()) {
            (Some(l), Some(r)) => compare_arrays(&l, &r),
            _ => Ordering::Equal,
        },
        (x, y) if is_number_capable(x) && is_number_capable(y) => {
            compare_numbers(x.to_number(), y.to_number())
        }
        (x, _) if x.is_array() => Ordering::Greater,
        (_, y) if y.is_array() => Ordering::Less,
        (Value::Object(_), _) => Ordering::Greater,
        (_, Value::Object(_)) => Ordering::Less,
        // Unreachable for dereferenced operands: every pair is covered above.
        _ => Ordering::Equal,
    }
}

fn compare_arrays(l: &ArrayStorage, r: &ArrayStorage) -> Ordering {
    let by_size = l.len().cmp(&r.len());
    if by_size != Ordering::Equal {
        return by_size;
    }
    for (key, lv) in l.iter() {
        let Some(rv) = r.get(key) else {
            return Ordering::Greater;
        };
        let order = rill_stack::with_stack(|| compare_values(&lv.to_value(), &rv.to_value()));
        if order != Ordering::Equal {
            return order;
        }
    }
    Ordering::Equal
}

/// Integer view for loose equality: integers, resources and strings that
/// are integer literals.
fn as_long(v: &Value) -> Option<i64> {
    match v {
        Value::Int(n) => Some(*n),
        Value::Resource(r) => Some(r.resource_id()),
        Value::Str(s) if s.numeric_kind() == NumericKind::Long => Some(s.to_long()),
        _ => None,
    }
}

#[inline]
fn is_number_convertible(v: &Value) -> bool {
    match v {
        Value::Int(_) | Value::Double(_) => true,
        Value::Str(s) => s.numeric_kind().is_numeric(),
        _ => false,
    }
}

/// Operands are already dereferenced.
fn equal_values(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Str(s), Value::Null) | (Value::Null, Value::Str(s)) => s.is_empty(),
        (x, y) if is_boolish(x) || is_boolish(y) => x.to_bool() == y.to_bool(),
        (x, y) if x.is_array() || y.is_array() => {
            match (x.array_snapshot(), y.array_snapshot()) {
                (Some(l), Some(r)) => equal_arrays(&l, &r),
                _ => false,
            }
        }
        (Value::Object(x), Value::Object(y)) => {
            crate::object::ObjectValue::ptr_eq(x, y)
                || (x.same_class(y)
                    && equal_arrays(&x.props().snapshot(), &y.props().snapshot()))
        }
        (Value::Object(_), _) | (_, Value::Object(_)) => false,
        (Value::Str(x), Value::Str(y)) => {
            if x.numeric_kind().is_numeric() && y.numeric_kind().is_numeric() {
                compare_numbers(x.to_number(), y.to_number()) == Ordering::Equal
            } else {
                x.as_bytes() == y.as_bytes()
            }
        }
        (x, y) => {
            if let (Some(l), Some(r)) = (as_long(x), as_long(y)) {
                l == r
            } else if is_number_convertible(x) || is_number_convertible(y) {
                doubles_equal(x.to_double(), y.to_double())
            } else {
                x.to_str() == y.to_str()
            }
        }
    }
}

#[allow(clippy::float_cmp, reason = "loose equality compares exact doubles")]
#[inline]
fn doubles_equal(a: f64, b: f64) -> bool {
    a == b
}

fn equal_arrays(l: &ArrayStorage, r: &ArrayStorage) -> bool {
    l.len() == r.len()
        && l.iter().all(|(key, lv)| {
            r.get(key).is_some_and(|rv| {
                rill_stack::with_stack(|| equal_values(&lv.to_value(), &rv.to_value()))
            })
        })
}
