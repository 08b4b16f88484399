//! Audit trail of dispatch decisions.
//!
//! The dispatcher reports every assignment change as a [`DispatchEvent`];
//! the zone scheduler stamps it into an [`AuditEvent`] and hands it to the
//! attached [`AuditSink`], if any.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::util::clock::now_ms;
use crate::util::ids::{TaskKey, WorkerId};

/// Kind of assignment change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Worker attached to an open task.
    Assign,
    /// Worker attached beyond `need` because nothing was open.
    Overflow,
    /// Specialist took a slot from a filler.
    Preempt,
    /// Filler lost its slot to a specialist.
    Displace,
    /// Surplus worker moved to another task during rebalancing.
    Donate,
    /// Worker detached by the caller or by task removal.
    Release,
    /// Detached worker left without a task until it asks again.
    Park,
    /// Ledger entry pointed at a missing task and was dropped.
    Orphan,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Assign => "assign",
            Self::Overflow => "overflow",
            Self::Preempt => "preempt",
            Self::Displace => "displace",
            Self::Donate => "donate",
            Self::Release => "release",
            Self::Park => "park",
            Self::Orphan => "orphan",
        };
        f.write_str(name)
    }
}

/// Raw decision emitted by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchEvent {
    /// Worker affected.
    pub worker: WorkerId,
    /// Task involved, if any.
    pub key: Option<TaskKey>,
    /// What happened.
    pub action: AuditAction,
}

/// Audit event structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Zone the decision was made in.
    pub zone: String,
    /// Worker affected.
    pub worker: WorkerId,
    /// Task involved, if any.
    pub task_key: Option<TaskKey>,
    /// Action taken.
    pub action: AuditAction,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events.min(1024)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Shared handle so callers can read events recorded by a scheduler-owned sink.
impl AuditSink for std::sync::Arc<parking_lot::Mutex<InMemoryAuditSink>> {
    fn record(&mut self, event: AuditEvent) {
        self.lock().record(event);
    }
}

/// Helper to build an audit event from a dispatch decision.
pub fn build_audit_event(zone: impl Into<String>, event: DispatchEvent) -> AuditEvent {
    AuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        zone: zone.into(),
        worker: event.worker,
        task_key: event.key,
        action: event.action,
        created_at_ms: now_ms(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(worker: &str, action: AuditAction) -> DispatchEvent {
        DispatchEvent {
            worker: worker.into(),
            key: Some(TaskKey(1)),
            action,
        }
    }

    #[test]
    fn test_bounded_buffer_drops_oldest() {
        let mut sink = InMemoryAuditSink::new(2);
        sink.record(build_audit_event("z", decision("w1", AuditAction::Assign)));
        sink.record(build_audit_event("z", decision("w2", AuditAction::Assign)));
        sink.record(build_audit_event("z", decision("w3", AuditAction::Overflow)));
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].worker, "w2");
        assert_eq!(events[1].action, AuditAction::Overflow);
    }

    #[test]
    fn test_zero_capacity_records_nothing() {
        let mut sink = InMemoryAuditSink::new(0);
        sink.record(build_audit_event("z", decision("w1", AuditAction::Assign)));
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_event_ids_are_unique() {
        let a = build_audit_event("z", decision("w1", AuditAction::Assign));
        let b = build_audit_event("z", decision("w1", AuditAction::Assign));
        assert_ne!(a.event_id, b.event_id);
        assert!(a.created_at_ms > 0);
        assert_eq!(a.action.to_string(), "assign");
    }
}
