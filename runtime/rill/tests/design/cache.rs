//! Design Tests: Serialization Cache
//!
//! Working copies of one canonical graph handed to independent executions.

use pretty_assertions::assert_eq;
use rill::{
    ArrayKey, ArrayValue, CacheConfig, EntryState, ExecContext, Fingerprint, SerializationCache,
    SerializeMap, Value,
};

fn nested_array(root: &Value, key: &str) -> ArrayValue {
    let Value::Array(root) = root else {
        panic!("root should be an array");
    };
    match root.get(&Value::string(key)) {
        Some(Value::Array(inner)) => inner,
        other => panic!("expected array at {key:?}, got {other:?}"),
    }
}

/// `{"left": inner, "right": inner}` with one shared nested array.
fn aliased_graph() -> Value {
    let inner = Value::list([Value::string("x"), Value::string("y")]);
    Value::map([
        (ArrayKey::from("left"), inner.clone()),
        (ArrayKey::from("right"), inner),
    ])
}

/// Design: each working copy keeps the graph's sharing and is independent
#[test]
fn design_checkouts_preserve_aliasing_and_isolation() {
    rill::init_tracing();
    let cache = SerializationCache::default();
    let payload = Fingerprint::of("aliased");
    cache.store(payload, &aliased_graph());

    let mut first_ctx = ExecContext::new();
    let mut second_ctx = ExecContext::new();
    let first = cache.checkout(payload, &mut first_ctx).unwrap();
    let second = cache.checkout(payload, &mut second_ctx).unwrap();

    for copy in [first.value(), second.value()] {
        assert!(ArrayValue::ptr_eq(
            &nested_array(copy, "left"),
            &nested_array(copy, "right")
        ));
    }
    assert!(!ArrayValue::ptr_eq(
        &nested_array(first.value(), "left"),
        &nested_array(second.value(), "left")
    ));

    nested_array(first.value(), "left").append(Value::string("z"));
    assert_eq!(nested_array(first.value(), "right").len(), 3);
    assert_eq!(nested_array(second.value(), "left").len(), 2);
}

/// Design: a clean copy comes back from the pool; a dirty one never does
#[test]
fn design_pool_reuse() {
    let cache = SerializationCache::default();
    let payload = Fingerprint::of("pooled");
    let entry = cache.store(payload, &aliased_graph());

    let mut ctx = ExecContext::new();
    let clean = cache.checkout(payload, &mut ctx).unwrap();
    let clean_identity = clean.value().identity();
    ctx.teardown();
    assert_eq!(entry.state(), EntryState::Pooled(1));

    let mut ctx = ExecContext::new();
    let reused = cache.checkout(payload, &mut ctx).unwrap();
    assert_eq!(reused.value().identity(), clean_identity);
    nested_array(reused.value(), "left").clear();
    ctx.teardown();
    assert_eq!(entry.state(), EntryState::Canonical);

    let mut ctx = ExecContext::new();
    let fresh = cache.checkout(payload, &mut ctx).unwrap();
    assert_ne!(fresh.value().identity(), clean_identity);
    assert_eq!(fresh.value(), &aliased_graph());
    ctx.teardown();

    let stats = entry.stats();
    assert_eq!(stats.copies, 2);
    assert_eq!(stats.pool_hits, 1);
    assert_eq!(stats.discarded, 1);
}

/// Design: a miss is recoverable by storing the rebuilt graph
#[test]
fn design_miss_then_rebuild() {
    let cache = SerializationCache::new(CacheConfig::default().with_max_entries(1));
    let payload = Fingerprint::of("rebuilt");
    let mut ctx = ExecContext::new();

    let err = cache.checkout(payload, &mut ctx).unwrap_err();
    assert!(err.is_miss());

    cache.store(payload, &Value::Int(7));
    assert_eq!(cache.checkout(payload, &mut ctx).unwrap().value(), &Value::Int(7));

    cache.store(Fingerprint::of("other"), &Value::Int(8));
    assert!(cache.checkout(payload, &mut ctx).unwrap_err().is_miss());
}

/// Design: back-references resolve to the first occurrence
#[test]
fn design_serialize_map_back_references() {
    let graph = aliased_graph();
    let Value::Array(root) = &graph else {
        unreachable!()
    };
    let mut map = SerializeMap::new();
    map.put(&graph);
    let mut emitted = Vec::new();
    for (_, value) in root.iter() {
        match map.get(&value) {
            Some(index) => emitted.push(format!("R:{index}")),
            None => emitted.push(format!("#{}", map.put(&value))),
        }
    }
    assert_eq!(emitted, vec!["#2", "R:2"]);
}
