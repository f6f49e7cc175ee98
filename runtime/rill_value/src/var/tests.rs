use super::*;
use crate::key::ArrayKey;
use pretty_assertions::assert_eq;

#[test]
fn test_set_returns_stored_value() {
    let v = Var::null();
    assert_eq!(v.set(Value::Int(3)), Value::Int(3));
    assert_eq!(v.get(), Value::Int(3));
}

#[test]
fn test_aliases_observe_writes() {
    let a = Var::new(Value::Int(1));
    let b = a.clone();
    b.set(Value::string("x"));
    assert_eq!(a.get(), Value::string("x"));
    assert!(Var::ptr_eq(&a, &b));
}

#[test]
fn test_never_holds_reference() {
    let target = Var::new(Value::Int(9));
    let v = Var::new(target.to_ref());
    assert!(matches!(v.get(), Value::Int(9)));

    v.set(target.to_ref());
    assert!(matches!(v.get(), Value::Int(9)));
}

#[test]
fn test_set_from_self_reference() {
    let v = Var::new(Value::Int(2));
    v.set(v.to_ref());
    assert_eq!(v.get(), Value::Int(2));
}

#[test]
fn test_array_mut_autovivifies_null() {
    let v = Var::null();
    let Some(array) = v.array_mut() else {
        panic!("null cell should autovivify an array");
    };
    array.append(Value::Int(1));
    assert_eq!(v.get(), Value::list([Value::Int(1)]));
}

#[test]
fn test_array_mut_rejects_scalars() {
    let v = Var::new(Value::Int(1));
    assert!(v.array_mut().is_none());
    assert_eq!(v.get(), Value::Int(1));
}

#[test]
fn test_array_mut_unfreezes_const_array() {
    let frozen = Value::list([Value::Int(1)]).freeze();
    let v = Var::new(frozen.clone());
    let Some(array) = v.array_mut() else {
        panic!("frozen array should become writable");
    };
    array.set_key(ArrayKey::Int(0), Value::Int(5));
    assert_eq!(v.get(), Value::list([Value::Int(5)]));
    assert_eq!(frozen, Value::list([Value::Int(1)]));
}

#[test]
fn test_array_mut_separates_shared_array() {
    let shared = ArrayValue::from_values([Value::Int(1)]);
    let v = Var::new(Value::Array(shared.clone()));
    let Some(array) = v.array_mut() else {
        panic!("array cell should be writable");
    };
    assert!(!ArrayValue::ptr_eq(&array, &shared));
    array.append(Value::Int(2));
    assert_eq!(shared.len(), 1);
}

#[test]
fn test_writes_mark_dirty_flag() {
    let flag = DirtyFlag::new();
    let v = Var::with_dirty(Value::Null, Some(flag.clone()));
    assert!(!flag.is_dirty());
    v.set(Value::Int(1));
    assert!(flag.is_dirty());
}
