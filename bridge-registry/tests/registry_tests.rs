//! Integration tests for the completion registry.
//!
//! These exercise the registry the way the bridge uses it: handles issued on
//! one side, futures awaited on the other, completions arriving from
//! independently scheduled tasks in any order.

use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use bridge_registry::{CompletionError, CompletionRegistry, Handle};

fn registry() -> Arc<CompletionRegistry<String, String>> {
    Arc::new(CompletionRegistry::new())
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_registration_yields_distinct_handles() {
    let registry = registry();
    let mut tasks = Vec::new();

    for _ in 0..16 {
        let registry = Arc::clone(&registry);
        tasks.push(tokio::spawn(async move {
            (0..500).map(|_| registry.register()).collect::<Vec<_>>()
        }));
    }

    let mut seen = HashSet::new();
    for task in tasks {
        for handle in task.await.unwrap() {
            assert!(seen.insert(handle), "handle {handle} issued twice");
        }
    }
    assert_eq!(seen.len(), 8000);
    assert_eq!(registry.in_flight(), 8000);
}

#[tokio::test]
async fn repeated_take_returns_the_same_value() {
    let registry = registry();
    let handle = registry.register();

    // Two takes before resolution; both continuations must fire exactly
    // once, with the same result.
    let first = registry.take(handle).unwrap();
    let second = registry.take(handle).unwrap();

    let waiter_a = tokio::spawn(first);
    let waiter_b = tokio::spawn(second);

    assert!(registry.complete(handle, Ok("shared".to_string())));

    assert_eq!(waiter_a.await.unwrap().unwrap(), "shared");
    assert_eq!(waiter_b.await.unwrap().unwrap(), "shared");
}

#[tokio::test]
async fn unregistered_handle_is_absent_and_harmless() {
    let registry = registry();
    let live = registry.register();
    let ghost = Handle::from_raw(live.as_raw() + 1000);

    assert!(registry.take(ghost).is_none());
    assert!(!registry.complete(ghost, Ok("nothing".to_string())));

    // The stray completion must not affect any other handle.
    let future = registry.take(live).unwrap();
    assert!(registry.complete(live, Ok("alive".to_string())));
    assert_eq!(future.await.unwrap(), "alive");
}

#[tokio::test]
async fn take_then_complete_delivers_payload() {
    let registry = registry();

    let handle = registry.register();
    let future = registry.take(handle).unwrap();
    assert!(registry.complete(handle, Ok("hello".to_string())));

    assert_eq!(future.await.unwrap(), "hello");
    assert_eq!(registry.in_flight(), 0);
}

#[tokio::test]
async fn complete_then_take_is_order_independent() {
    let registry = registry();

    // The native side may finish before the managed side retrieves the
    // future. The value must already carry the failure when taken.
    let handle = registry.register();
    assert!(registry.complete(handle, Err("boom".to_string())));

    let future = registry.take(handle).unwrap();
    match future.await {
        Err(CompletionError::Native(payload)) => assert_eq!(payload, "boom"),
        other => panic!("expected native failure, got {other:?}"),
    }
}

#[tokio::test]
async fn no_cross_talk_between_handles() {
    let registry = registry();

    let first = registry.register();
    let second = registry.register();
    let future_first = registry.take(first).unwrap();
    let future_second = registry.take(second).unwrap();

    // Complete in reverse registration order.
    assert!(registry.complete(second, Ok("B".to_string())));
    assert!(registry.complete(first, Ok("A".to_string())));

    assert_eq!(future_first.await.unwrap(), "A");
    assert_eq!(future_second.await.unwrap(), "B");
}

#[tokio::test]
async fn resolution_removes_the_entry() {
    let registry = registry();

    let handle = registry.register();
    assert!(registry.is_registered(handle));

    let future = registry.take(handle).unwrap();
    assert!(registry.complete(handle, Ok("done".to_string())));

    assert!(!registry.is_registered(handle));
    assert!(registry.take(handle).is_none());
    assert_eq!(registry.in_flight(), 0);

    // A future obtained before cleanup still observes the result.
    assert_eq!(future.await.unwrap(), "done");
}

#[tokio::test]
async fn completion_before_take_is_held_until_retrieved() {
    let registry = registry();

    let handle = registry.register();
    assert!(registry.complete(handle, Ok("held".to_string())));

    // The result waits for its one retrieval; retrieving it releases the
    // entry.
    assert_eq!(registry.in_flight(), 1);
    let future = registry.take(handle).unwrap();
    assert_eq!(registry.in_flight(), 0);
    assert_eq!(future.await.unwrap(), "held");
    assert!(registry.take(handle).is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn load_leaves_registry_empty_with_distinct_results() {
    const OPERATIONS: usize = 10_000;

    let registry = Arc::new(CompletionRegistry::<u64, String>::new());
    let mut waiters = Vec::with_capacity(OPERATIONS);

    for i in 0..OPERATIONS as u64 {
        let handle = registry.register();
        let future = registry.take(handle).unwrap();

        let completer = Arc::clone(&registry);
        tokio::spawn(async move {
            completer.complete(handle, Ok(i));
        });

        waiters.push(tokio::spawn(future));
    }

    let mut results = HashSet::new();
    for waiter in waiters {
        let value = waiter.await.unwrap().unwrap();
        assert!(results.insert(value), "result {value} delivered twice");
    }

    assert_eq!(results.len(), OPERATIONS);
    assert_eq!(registry.in_flight(), 0);

    let stats = registry.stats();
    assert_eq!(stats.registered.load(Ordering::Relaxed), OPERATIONS as u64);
    assert_eq!(stats.completed.load(Ordering::Relaxed), OPERATIONS as u64);
    assert_eq!(stats.unknown_completions.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn stats_track_outcomes() {
    let registry = registry();

    let ok = registry.register();
    let failed = registry.register();
    let dropped = registry.register();

    let ok_future = registry.take(ok).unwrap();
    assert!(registry.complete(ok, Ok("fine".to_string())));
    assert_eq!(ok_future.await.unwrap(), "fine");

    assert!(registry.complete(failed, Err("bad".to_string())));
    assert!(registry.abandon(dropped));

    // `ok` is fully consumed, `failed` is resolved but unretrieved: one
    // stray completion of each flavor.
    assert!(!registry.complete(ok, Ok("again".to_string())));
    assert!(!registry.complete(failed, Err("worse".to_string())));

    let stats = registry.stats();
    assert_eq!(stats.registered.load(Ordering::Relaxed), 3);
    assert_eq!(stats.completed.load(Ordering::Relaxed), 1);
    assert_eq!(stats.failed.load(Ordering::Relaxed), 1);
    assert_eq!(stats.abandoned.load(Ordering::Relaxed), 1);
    assert_eq!(stats.unknown_completions.load(Ordering::Relaxed), 1);
    assert_eq!(stats.duplicate_completions.load(Ordering::Relaxed), 1);
}
