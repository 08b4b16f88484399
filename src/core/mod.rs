//! Core scheduling abstractions: tasks, assignments and the dispatch passes.

pub mod audit;
pub mod dispatcher;
pub mod error;
pub mod invariants;
pub mod ledger;
pub mod matcher;
pub mod scheduler;
pub mod snapshot;
pub mod store;
pub mod task;

pub use audit::{
    build_audit_event, AuditAction, AuditEvent, AuditSink, DispatchEvent, InMemoryAuditSink,
};
pub use dispatcher::Dispatcher;
pub use error::{AppResult, SchedulerError};
pub use ledger::{AssignmentLedger, LedgerEntry};
pub use matcher::{CapabilityProvider, Fit};
pub use scheduler::{Demand, ZoneScheduler};
pub use snapshot::{StateStore, ZoneSnapshot};
pub use store::TaskStore;
pub use task::{NewTask, PatchEffect, TaskPatch, TaskRecord, TaskSelector};
