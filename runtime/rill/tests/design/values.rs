//! Design Tests: Values
//!
//! Interning, the hot integer window, coercion, comparison, and
//! copy-on-write arrays.

use pretty_assertions::assert_eq;
use rayon::prelude::*;
use rill::{cmp, intern, ArrayKey, ArrayValue, IntHandle, StrValue, Value, INT_CACHE_MAX};
use std::cmp::Ordering;

// =============================================================================
// Interning
// =============================================================================

/// Design: interning one string twice yields one instance
#[test]
fn design_intern_is_identity_stable() {
    let a = intern("session_id");
    let b = intern("session_id");
    assert!(StrValue::ptr_eq(&a, &b));
    assert_eq!(Value::Str(a).identity(), Value::Str(b).identity());
}

/// Design: racing threads agree on the canonical instance
#[test]
fn design_intern_is_identity_stable_across_threads() {
    let first = intern("shared across threads");
    let all_same = (0..32)
        .into_par_iter()
        .map(|_| intern("shared across threads"))
        .all(|s| StrValue::ptr_eq(&s, &first));
    assert!(all_same);
}

// =============================================================================
// Integer window
// =============================================================================

/// Design: incrementing a pooled integer lands on the pooled successor
#[test]
fn design_increment_inside_window_shares_instance() {
    let next = IntHandle::create(41).add_one().unwrap();
    assert_eq!(next.get(), 42);
    assert!(IntHandle::same_instance(next, IntHandle::create(42)));
}

/// Design: outside the window results are numerically correct
#[test]
fn design_increment_outside_window_is_correct() {
    let next = IntHandle::create(INT_CACHE_MAX).add_one().unwrap();
    assert_eq!(next.get(), INT_CACHE_MAX + 1);
    assert!(!next.is_pooled());
    assert_eq!(IntHandle::create(i64::MAX).add_one(), None);
}

// =============================================================================
// Truthiness
// =============================================================================

/// Design: the falsy values are exactly 0, 0.0, "", "0", [], null
#[test]
fn design_truthiness_table() {
    let falsy = [
        Value::Int(0),
        Value::Double(0.0),
        Value::string(""),
        Value::string("0"),
        Value::array(),
        Value::Null,
        Value::Bool(false),
    ];
    for value in &falsy {
        assert!(!value.to_bool(), "{value:?} should be false");
    }

    let truthy = [
        Value::Int(-1),
        Value::Double(0.5),
        Value::string("0.0"),
        Value::string(" "),
        Value::string("false"),
        Value::list([Value::Null]),
        Value::object("Anything"),
        Value::Bool(true),
    ];
    for value in &truthy {
        assert!(value.to_bool(), "{value:?} should be true");
    }
}

// =============================================================================
// Weak comparison
// =============================================================================

/// Design: booleans against numbers compare as booleans
#[test]
fn design_weak_comparison() {
    assert_eq!(cmp(&Value::Int(5), &Value::Bool(true)), Ordering::Equal);
    assert_eq!(cmp(&Value::Bool(false), &Value::Int(0)), Ordering::Equal);
    assert_eq!(cmp(&Value::Int(-5), &Value::Bool(false)), Ordering::Greater);
}

// =============================================================================
// Copy-on-write
// =============================================================================

/// Design: a copy shares storage until its first write, then separates
#[test]
fn design_copy_on_write() {
    let a = ArrayValue::from_pairs([
        (ArrayKey::from("a"), Value::Int(1)),
        (ArrayKey::from("b"), Value::Int(2)),
    ]);
    let b = a.copy();
    assert!(a.shares_storage_with(&b));

    b.set(&Value::string("a"), Value::Int(99)).unwrap();
    assert_eq!(a.get(&Value::string("a")), Some(Value::Int(1)));
    assert_eq!(b.get(&Value::string("a")), Some(Value::Int(99)));
    assert!(!a.shares_storage_with(&b));
}

/// Design: copies keep insertion order
#[test]
fn design_copy_preserves_order() {
    let a = ArrayValue::new();
    a.set_key(ArrayKey::from("z"), Value::Int(1));
    a.set_key(ArrayKey::Int(3), Value::Int(2));
    a.set_key(ArrayKey::from("a"), Value::Int(3));
    let keys: Vec<ArrayKey> = a.copy().iter().map(|(k, _)| k).collect();
    assert_eq!(
        keys,
        vec![ArrayKey::from("z"), ArrayKey::Int(3), ArrayKey::from("a")]
    );
}
