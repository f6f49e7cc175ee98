use super::*;
use rayon::prelude::*;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

#[test]
fn test_same_key_returns_same_instance() {
    let table: CanonicalTable<Arc<[u8]>> = CanonicalTable::new();
    let a = table.intern(b"getName", |k| Arc::from(k));
    let b = table.intern(b"getName", |k| Arc::from(k));
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(table.len(), 1);
}

#[test]
fn test_distinct_keys() {
    let table: CanonicalTable<Arc<[u8]>> = CanonicalTable::new();
    let a = table.intern(b"a", |k| Arc::from(k));
    let b = table.intern(b"b", |k| Arc::from(k));
    assert!(!Arc::ptr_eq(&a, &b));
    assert!(table.get(b"a").is_some());
    assert!(table.get(b"c").is_none());
}

#[test]
fn test_make_runs_once_under_contention() {
    let table: CanonicalTable<Arc<[u8]>> = CanonicalTable::new();
    let calls = AtomicUsize::new(0);

    let handles: Vec<Arc<[u8]>> = (0..512)
        .into_par_iter()
        .map(|_| {
            table.intern(b"contended", |key| {
                calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Arc::from(key)
            })
        })
        .collect();

    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    let first = &handles[0];
    assert!(handles.iter().all(|h| Arc::ptr_eq(h, first)));
}
