//! Design Tests: Aliasing
//!
//! Names bound to one cell, and per-context cells for statics and globals
//! whose declarations are shared by every execution.

use pretty_assertions::assert_eq;
use rayon::prelude::*;
use rill::{
    ArrayKey, EnvVar, ExecContext, GlobalLayout, RuntimeError, StaticDecl, StaticId, Value, Var,
};

/// Design: two names bound to one cell observe each other's writes
#[test]
fn design_reference_binding() {
    let mut ctx = ExecContext::new();
    let cell = Var::new(Value::Int(1));
    let a = EnvVar::direct(cell.clone());
    let b = EnvVar::direct(cell);

    let stored = a.set(&mut ctx, Value::string("written")).unwrap();
    assert_eq!(stored, Value::string("written"));
    assert_eq!(b.get(&mut ctx).unwrap(), Value::string("written"));
}

/// Design: each context materializes its own cell for a shared static
#[test]
fn design_static_is_per_context() {
    let decl = StaticDecl::new(
        StaticId::new(1),
        Value::map([(ArrayKey::from("calls"), Value::Int(0))]),
    );
    let slot = EnvVar::lazy_static(decl);
    let mut first = ExecContext::new();
    let mut second = ExecContext::new();

    let a = slot.get_cell(&mut first).unwrap();
    let b = slot.get_cell(&mut second).unwrap();
    assert_eq!(a.get(), b.get());
    assert!(!Var::ptr_eq(&a, &b));

    a.array_mut()
        .unwrap()
        .set_key(ArrayKey::from("calls"), Value::Int(1));
    let Value::Array(seen) = slot.get(&mut second).unwrap() else {
        panic!("static should hold an array");
    };
    assert_eq!(seen.get(&Value::string("calls")), Some(Value::Int(0)));
}

/// Design: concurrent contexts never share materialized globals
#[test]
fn design_globals_are_context_private_under_concurrency() {
    let layout = GlobalLayout::new([Value::Int(0), Value::array()]);
    let counter = EnvVar::lazy_global(layout.slot(0).unwrap());
    let log = EnvVar::lazy_global(layout.slot(1).unwrap());

    let results: Vec<(i64, usize)> = (1..=16_i64)
        .into_par_iter()
        .map(|n| {
            let mut ctx = ExecContext::with_globals(&layout);
            for _ in 0..n {
                let current = counter.get(&mut ctx).unwrap();
                counter.set(&mut ctx, current.add_one()).unwrap();
                log.get_cell(&mut ctx)
                    .unwrap()
                    .array_mut()
                    .unwrap()
                    .append(Value::Int(n));
            }
            let Value::Array(entries) = log.get(&mut ctx).unwrap() else {
                panic!("log should hold an array");
            };
            (counter.get(&mut ctx).unwrap().to_long(), entries.len())
        })
        .collect();

    for (n, (count, logged)) in (1..=16_i64).zip(results) {
        assert_eq!(count, n);
        assert_eq!(logged, usize::try_from(n).unwrap());
    }
}

/// Design: a slot used after its context ends is a stale use
#[test]
fn design_stale_alias_use() {
    let layout = GlobalLayout::new([Value::Null]);
    let slot = EnvVar::lazy_global(layout.slot(0).unwrap());
    let mut ctx = ExecContext::with_globals(&layout);
    slot.set(&mut ctx, Value::Int(1)).unwrap();
    ctx.teardown();
    assert_eq!(
        slot.get(&mut ctx),
        Err(RuntimeError::StaleAliasUse { context: ctx.id() })
    );
}
