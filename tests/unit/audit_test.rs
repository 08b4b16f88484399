//! Tests for audit sink

use room_dispatch::config::ZoneConfig;
use room_dispatch::core::{
    build_audit_event, AuditAction, AuditSink, DispatchEvent, InMemoryAuditSink, NewTask,
    ZoneScheduler,
};
use room_dispatch::util::TaskKey;

fn decision(worker: &str, action: AuditAction) -> DispatchEvent {
    DispatchEvent {
        worker: worker.to_string(),
        key: Some(TaskKey(1)),
        action,
    }
}

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);
    sink.record(build_audit_event("W1N1", decision("w1", AuditAction::Assign)));

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].zone, "W1N1");
    assert_eq!(events[0].worker, "w1");
    assert_eq!(events[0].action, AuditAction::Assign);
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);
    sink.record(build_audit_event("W1N1", decision("w1", AuditAction::Assign)));
    sink.record(build_audit_event("W1N1", decision("w2", AuditAction::Overflow)));
    sink.record(build_audit_event("W1N1", decision("w3", AuditAction::Preempt)));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].worker, "w2"); // first one popped
    assert_eq!(events[1].worker, "w3");
}

#[test]
fn test_build_audit_event_ids_are_unique() {
    let a = build_audit_event("W1N1", decision("w1", AuditAction::Release));
    let b = build_audit_event("W1N1", decision("w1", AuditAction::Release));
    assert_ne!(a.event_id, b.event_id);
    assert!(a.created_at_ms > 0);
}

#[test]
fn test_scheduler_records_preemption() {
    let sink = std::sync::Arc::new(parking_lot::Mutex::new(InMemoryAuditSink::new(32)));
    let mut zone = ZoneScheduler::new("W1N1", ZoneConfig::default())
        .with_audit(Box::new(std::sync::Arc::clone(&sink)));
    zone.add_task(NewTask::new("mine").require("miner"));
    zone.get_assignment("g1", None);
    zone.get_assignment("m1", Some("miner"));

    let actions: Vec<_> = sink.lock().events().into_iter().map(|e| (e.worker, e.action)).collect();
    assert_eq!(
        actions,
        vec![
            ("g1".to_string(), AuditAction::Assign),
            ("g1".to_string(), AuditAction::Displace),
            ("m1".to_string(), AuditAction::Preempt),
            ("g1".to_string(), AuditAction::Park),
        ]
    );
}
