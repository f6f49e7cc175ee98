use super::*;
use pretty_assertions::assert_eq;
use rayon::prelude::*;
use std::time::Duration;

use crate::entry::EntryState;

fn payload(n: u32) -> Fingerprint {
    Fingerprint::of(format!("i:{n};"))
}

fn small_cache(max_entries: usize) -> SerializationCache {
    SerializationCache::new(
        CacheConfig::default()
            .with_max_entries(max_entries)
            .with_idle_ttl(Some(Duration::from_secs(60))),
    )
}

#[test]
fn test_unknown_fingerprint_misses() {
    let cache = SerializationCache::default();
    let mut ctx = ExecContext::new();
    assert_eq!(
        cache.checkout(payload(1), &mut ctx).unwrap_err(),
        CacheError::Miss { fingerprint: payload(1) }
    );
    assert!(cache.is_empty());
}

#[test]
fn test_store_then_checkout() {
    let cache = SerializationCache::default();
    let entry = cache.store(payload(1), &Value::list([Value::Int(1)]));
    assert_eq!(cache.len(), 1);
    assert!(Arc::ptr_eq(&entry, &cache.get(payload(1)).unwrap()));

    let mut ctx = ExecContext::new();
    let checkout = cache.checkout(payload(1), &mut ctx).unwrap();
    assert_eq!(checkout.value(), &Value::list([Value::Int(1)]));
}

#[test]
fn test_entry_is_created_once() {
    let cache = SerializationCache::default();
    let a = cache.entry(payload(1));
    let b = cache.entry(payload(1));
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.state(), EntryState::Empty);
}

#[test]
fn test_invalidate() {
    let cache = SerializationCache::default();
    cache.store(payload(1), &Value::Int(1));
    assert!(cache.invalidate(payload(1)));
    assert!(!cache.invalidate(payload(2)));

    let mut ctx = ExecContext::new();
    assert!(cache.checkout(payload(1), &mut ctx).unwrap_err().is_miss());
    assert!(cache.is_empty());
    assert_eq!(cache.canonical_count(), 0);
}

#[test]
fn test_capacity_evicts_least_recently_used() {
    let cache = small_cache(2);
    cache.store(payload(1), &Value::Int(1));
    cache.store(payload(2), &Value::Int(2));

    let mut ctx = ExecContext::new();
    cache.checkout(payload(1), &mut ctx).unwrap();

    cache.store(payload(3), &Value::Int(3));
    assert_eq!(cache.canonical_count(), 2);
    assert!(cache.get(payload(1)).unwrap().has_canonical());
    assert!(cache.get(payload(2)).is_none());
    assert!(cache.get(payload(3)).unwrap().has_canonical());
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_eviction_bounds_the_registry() {
    let cache = small_cache(1);
    for n in 0..1000 {
        cache.store(payload(n), &Value::Int(i64::from(n)));
    }
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.canonical_count(), 1);
    assert!(cache.get(payload(999)).unwrap().has_canonical());
}

#[test]
fn test_evicted_checkout_releases_quietly() {
    let cache = small_cache(1);
    let evicted = cache.store(payload(1), &Value::list([Value::Null]));
    let mut ctx = ExecContext::new();
    cache.checkout(payload(1), &mut ctx).unwrap();

    cache.store(payload(2), &Value::Int(2));
    assert!(cache.get(payload(1)).is_none());
    drop(evicted);
    assert!(ctx.teardown().is_clean());
}

#[test]
fn test_restore_after_eviction() {
    let cache = small_cache(1);
    cache.store(payload(1), &Value::Int(1));
    cache.store(payload(2), &Value::Int(2));
    assert!(cache.get(payload(1)).is_none());

    cache.store(payload(1), &Value::Int(1));
    assert!(cache.get(payload(1)).unwrap().has_canonical());
    assert!(cache.get(payload(2)).is_none());
}

#[test]
fn test_evict_idle() {
    let cache = small_cache(8);
    cache.store(payload(1), &Value::Int(1));
    cache.store(payload(2), &Value::Int(2));

    assert_eq!(cache.evict_idle(Instant::now()), 0);
    let later = Instant::now() + Duration::from_secs(61);
    assert_eq!(cache.evict_idle(later), 2);
    assert_eq!(cache.canonical_count(), 0);
    assert!(cache.is_empty());
    assert_eq!(cache.evict_idle(later), 0);
}

#[test]
fn test_evict_idle_disabled() {
    let cache = SerializationCache::new(CacheConfig::default().with_idle_ttl(None));
    cache.store(payload(1), &Value::Int(1));
    let much_later = Instant::now() + Duration::from_secs(86_400);
    assert_eq!(cache.evict_idle(much_later), 0);
}

#[test]
fn test_pool_capacity_from_config() {
    let cache = SerializationCache::new(CacheConfig::default().with_pool_capacity(1));
    cache.store(payload(1), &Value::array());
    let mut a = ExecContext::new();
    let mut b = ExecContext::new();
    cache.checkout(payload(1), &mut a).unwrap();
    cache.checkout(payload(1), &mut b).unwrap();
    a.teardown();
    b.teardown();
    assert_eq!(cache.get(payload(1)).unwrap().state(), EntryState::Pooled(1));
}

#[test]
fn test_concurrent_store_and_checkout() {
    let cache = small_cache(4);
    (0..64_u32).into_par_iter().for_each(|n| {
        let fingerprint = payload(n % 8);
        let mut ctx = ExecContext::new();
        match cache.checkout(fingerprint, &mut ctx) {
            Ok(checkout) => assert_eq!(checkout.value(), &Value::Int(i64::from(n % 8))),
            Err(err) => {
                assert!(err.is_miss());
                cache.store(fingerprint, &Value::Int(i64::from(n % 8)));
            }
        }
    });
    assert!(cache.canonical_count() <= 4);
    assert!(cache.len() <= 8);
}
