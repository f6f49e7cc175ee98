use super::*;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> CleanupFn) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let hook = move |name: &'static str| -> CleanupFn {
        let sink = Arc::clone(&sink);
        Box::new(move || {
            sink.lock().push(name);
            Ok(())
        })
    };
    (log, hook)
}

#[test]
fn test_ids_are_unique() {
    let a = ExecContext::new();
    let b = ExecContext::new();
    assert_ne!(a.id(), b.id());
    assert!(a.id().to_string().starts_with("context #"));
}

#[test]
fn test_cleanups_run_in_reverse_order() {
    let (log, hook) = recorder();
    let mut ctx = ExecContext::new();
    ctx.add_cleanup("first", hook("first")).unwrap();
    ctx.add_cleanup("second", hook("second")).unwrap();
    ctx.add_cleanup("third", hook("third")).unwrap();
    assert_eq!(ctx.pending_cleanups(), 3);

    let report = ctx.teardown();
    assert_eq!(report.ran, 3);
    assert!(report.is_clean());
    assert_eq!(*log.lock(), vec!["third", "second", "first"]);
    assert!(!ctx.is_active());
}

#[test]
fn test_failing_cleanup_does_not_stop_others() {
    let (log, hook) = recorder();
    let mut ctx = ExecContext::new();
    ctx.add_cleanup("ok", hook("ok")).unwrap();
    ctx.add_cleanup("broken", || Err("socket already closed".to_string()))
        .unwrap();

    let report = ctx.teardown();
    assert_eq!(report.ran, 2);
    assert_eq!(
        report.failures,
        vec![CleanupError {
            name: "broken",
            reason: "socket already closed".to_string(),
        }]
    );
    assert_eq!(*log.lock(), vec!["ok"]);
}

#[test]
fn test_panicking_cleanup_does_not_stop_others() {
    let (log, hook) = recorder();
    let mut ctx = ExecContext::new();
    ctx.add_cleanup("release", hook("release")).unwrap();
    ctx.add_cleanup("exploding", || panic!("handle table corrupted"))
        .unwrap();
    ctx.add_cleanup("flush", hook("flush")).unwrap();

    let report = ctx.teardown();
    assert_eq!(report.ran, 3);
    assert_eq!(
        report.failures,
        vec![CleanupError {
            name: "exploding",
            reason: "panicked: handle table corrupted".to_string(),
        }]
    );
    assert_eq!(*log.lock(), vec!["flush", "release"]);
}

#[test]
fn test_removed_cleanup_does_not_run() {
    let (log, hook) = recorder();
    let mut ctx = ExecContext::new();
    let handle = ctx.add_cleanup("gone", hook("gone")).unwrap();
    ctx.add_cleanup("kept", hook("kept")).unwrap();

    assert!(ctx.remove_cleanup(handle));
    assert!(!ctx.remove_cleanup(handle));
    ctx.teardown();
    assert_eq!(*log.lock(), vec!["kept"]);
}

#[test]
fn test_teardown_is_idempotent() {
    let (log, hook) = recorder();
    let mut ctx = ExecContext::new();
    ctx.add_cleanup("once", hook("once")).unwrap();
    assert_eq!(ctx.teardown().ran, 1);
    assert_eq!(ctx.teardown().ran, 0);
    assert_eq!(log.lock().len(), 1);
}

#[test]
fn test_add_cleanup_after_teardown_is_stale() {
    let mut ctx = ExecContext::new();
    let id = ctx.id();
    ctx.teardown();
    let err = ctx.add_cleanup("late", || Ok(())).unwrap_err();
    assert_eq!(err, RuntimeError::StaleAliasUse { context: id });
}

#[test]
fn test_drop_runs_pending_cleanups() {
    let (log, hook) = recorder();
    {
        let mut ctx = ExecContext::new();
        ctx.add_cleanup("on-drop", hook("on-drop")).unwrap();
    }
    assert_eq!(*log.lock(), vec!["on-drop"]);
}

#[test]
fn test_global_layout_slots() {
    let layout = GlobalLayout::new([Value::Int(1), Value::Null]);
    assert_eq!(layout.len(), 2);
    assert_eq!(layout.slot(1).map(GlobalSlotId::raw), Some(1));
    assert_eq!(layout.slot(2), None);
    assert!(GlobalLayout::default().is_empty());
}

#[test]
fn test_copy_value_is_deep() {
    let ctx = ExecContext::new();
    let source = Value::list([Value::list([Value::Int(1)])]);
    let copy = ctx.copy_value(&source);
    assert_eq!(copy, source);
    assert_ne!(copy.identity(), source.identity());
}
