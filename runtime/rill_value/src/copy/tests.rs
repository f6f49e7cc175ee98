use super::*;
use crate::key::ArrayKey;
use crate::object::ObjectValue;
use pretty_assertions::assert_eq;

fn array_at(array: &ArrayValue, key: &str) -> ArrayValue {
    match array.get_by_key(&ArrayKey::from(key)) {
        Some(Value::Array(a)) => a,
        other => panic!("expected array at {key:?}, got {other:?}"),
    }
}

fn as_array(value: &Value) -> ArrayValue {
    match value {
        Value::Array(a) => a.clone(),
        other => panic!("expected array, got {other:?}"),
    }
}

#[test]
fn test_copy_is_deep() {
    let inner = ArrayValue::from_values([Value::Int(1)]);
    let outer = ArrayValue::new();
    outer.set_key(ArrayKey::from("inner"), Value::Array(inner.clone()));

    let copy = as_array(&Value::Array(outer.clone()).copy_tree(&mut CopyMap::new()));
    let copied_inner = array_at(&copy, "inner");
    assert!(!ArrayValue::ptr_eq(&copy, &outer));
    assert!(!ArrayValue::ptr_eq(&copied_inner, &inner));

    inner.append(Value::Int(2));
    assert_eq!(copied_inner.len(), 1);
}

#[test]
fn test_shared_node_is_copied_once() {
    let shared = ArrayValue::from_values([Value::Int(1)]);
    let outer = ArrayValue::new();
    outer.set_key(ArrayKey::from("a"), Value::Array(shared.clone()));
    outer.set_key(ArrayKey::from("b"), Value::Array(shared));

    let mut map = CopyMap::new();
    let copy = as_array(&Value::Array(outer).copy_tree(&mut map));
    let a = array_at(&copy, "a");
    let b = array_at(&copy, "b");
    assert!(ArrayValue::ptr_eq(&a, &b));
    assert_eq!(map.len(), 2);
}

#[test]
fn test_sharing_between_roots_with_one_map() {
    let shared = Value::list([Value::Int(1)]);
    let mut map = CopyMap::new();
    let first = shared.copy_tree(&mut map);
    let second = shared.copy_tree(&mut map);
    assert_eq!(first.identity(), second.identity());
    assert_ne!(first.identity(), shared.identity());
}

#[test]
fn test_cycle_maps_onto_copy() {
    let a = ArrayValue::new();
    a.set_key(ArrayKey::from("self"), Value::Array(a.clone()));

    let copy = as_array(&Value::Array(a.clone()).copy_tree(&mut CopyMap::new()));
    let back = array_at(&copy, "self");
    assert!(ArrayValue::ptr_eq(&back, &copy));
    assert!(!ArrayValue::ptr_eq(&back, &a));
}

#[test]
fn test_references_keep_aliasing() {
    let cell = Var::new(Value::Int(1));
    let outer = ArrayValue::new();
    outer.set_key(ArrayKey::Int(0), cell.to_ref());
    outer.set_key(ArrayKey::Int(1), cell.to_ref());

    let copy = as_array(&Value::Array(outer).copy_tree(&mut CopyMap::new()));
    let (Some(Value::Reference(x)), Some(Value::Reference(y))) =
        (copy.get_by_key(&ArrayKey::Int(0)), copy.get_by_key(&ArrayKey::Int(1)))
    else {
        panic!("references were not preserved");
    };
    assert!(Var::ptr_eq(&x, &y));
    assert!(!Var::ptr_eq(&x, &cell));

    x.set(Value::Int(5));
    assert_eq!(y.get(), Value::Int(5));
    assert_eq!(cell.get(), Value::Int(1));
}

#[test]
fn test_objects_become_new_instances() {
    let object = ObjectValue::new("Node");
    object.set_prop("value", Value::Int(1));
    object.set_prop("me", Value::Object(object.clone()));

    let Value::Object(copy) = Value::Object(object.clone()).copy_tree(&mut CopyMap::new())
    else {
        panic!("object copy should be an object");
    };
    assert!(!ObjectValue::ptr_eq(&copy, &object));
    assert_eq!(copy.class_name(), "Node");
    assert_ne!(copy.object_id(), object.object_id());
    let Some(Value::Object(me)) = copy.get_prop("me") else {
        panic!("self property missing");
    };
    assert!(ObjectValue::ptr_eq(&me, &copy));
}

#[test]
fn test_immutable_nodes_are_shared() {
    let text = Value::string("payload");
    let frozen = Value::list([Value::Int(1)]).freeze();
    let source = Value::list([text.clone(), frozen.clone()]);

    let copy = as_array(&source.copy_tree(&mut CopyMap::new()));
    assert_eq!(
        copy.get_by_key(&ArrayKey::Int(0)).and_then(|v| v.identity()),
        text.identity()
    );
    assert_eq!(
        copy.get_by_key(&ArrayKey::Int(1)).and_then(|v| v.identity()),
        frozen.identity()
    );
}

#[test]
fn test_frozen_array_with_object_is_copied() {
    let frozen = Value::list([Value::object("Box")]).freeze();
    let copy = frozen.copy_tree(&mut CopyMap::new());
    assert!(matches!(copy, Value::Array(_)));
}

#[test]
fn test_tracking_flag_sees_nested_writes() {
    let source = Value::map([(ArrayKey::from("inner"), Value::list([Value::Int(1)]))]);
    let flag = DirtyFlag::new();
    let copy = as_array(&source.copy_tree(&mut CopyMap::tracking(flag.clone())));
    assert!(!flag.is_dirty());

    let _ = copy.get(&Value::string("inner"));
    assert!(!flag.is_dirty());

    array_at(&copy, "inner").append(Value::Int(2));
    assert!(flag.reset());
    assert!(!flag.is_dirty());
}

#[test]
fn test_untracked_copy_has_no_flag() {
    let source = Value::list([Value::Int(1)]);
    let flag = DirtyFlag::new();
    let tracked = as_array(&source.copy_tree(&mut CopyMap::tracking(flag.clone())));
    let plain = as_array(&source.copy_tree(&mut CopyMap::new()));
    plain.append(Value::Int(2));
    assert!(!flag.is_dirty());
    tracked.clear();
    assert!(flag.is_dirty());
}
