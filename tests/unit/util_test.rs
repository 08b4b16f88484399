//! Tests for utility functions

use room_dispatch::util::{now_ms, TaskKey};

#[test]
fn test_task_key_display() {
    assert_eq!(TaskKey(42).to_string(), "#42");
    assert_eq!(TaskKey::from(7).get(), 7);
}

#[test]
fn test_task_key_serializes_transparently() {
    assert_eq!(serde_json::to_string(&TaskKey(3)).unwrap(), "3");
    let key: TaskKey = serde_json::from_str("9").unwrap();
    assert_eq!(key, TaskKey(9));
}

#[test]
fn test_task_key_ordering() {
    assert!(TaskKey(1) < TaskKey(2));
}

#[test]
fn test_clock_is_monotonic_enough() {
    let a = now_ms();
    let b = now_ms();
    assert!(b >= a);
    assert!(a > 0);
}

#[test]
fn test_init_tracing_is_idempotent() {
    room_dispatch::util::init_tracing();
    room_dispatch::util::init_tracing();
    tracing::info!("tracing initialised twice without panicking");
}
