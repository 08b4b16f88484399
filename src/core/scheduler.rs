//! Per-zone scheduler façade.
//!
//! [`ZoneScheduler`] is what a per-worker execution loop talks to every tick:
//!
//! ```rust
//! use room_dispatch::config::ZoneConfig;
//! use room_dispatch::core::{NewTask, ZoneScheduler};
//!
//! let mut zone = ZoneScheduler::new("W1N1", ZoneConfig::default());
//! let harvest = zone.add_task(NewTask::new("harvest").priority(10).need(2));
//! zone.add_task(NewTask::new("upgrade").priority(1));
//!
//! let task = zone.get_assignment("worker-1", None).map(|t| t.key);
//! assert_eq!(task, Some(harvest));
//! ```

use std::collections::BTreeMap;

use tracing::{debug, error, info, warn};

use crate::config::ZoneConfig;
use crate::core::audit::{build_audit_event, AuditSink, DispatchEvent};
use crate::core::dispatcher::Dispatcher;
use crate::core::invariants;
use crate::core::ledger::AssignmentLedger;
use crate::core::matcher::CapabilityProvider;
use crate::core::snapshot::ZoneSnapshot;
use crate::core::store::TaskStore;
use crate::core::task::{NewTask, TaskPatch, TaskRecord, TaskSelector};
use crate::core::SchedulerError;
use crate::util::ids::{Tag, TaskKey};

/// Read-only signals for an external spawner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Demand {
    /// Tasks below their need.
    pub open_tasks: usize,
    /// Workers missing across all open tasks.
    pub missing_workers: u32,
    /// Specialists missing per tag.
    pub missing_specialists: BTreeMap<Tag, u32>,
    /// Workers displaced and not yet re-placed.
    pub parked_workers: usize,
}

impl Demand {
    /// True if every task is filled.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.missing_workers == 0 && self.missing_specialists.is_empty()
    }
}

/// Task/worker scheduler for one zone.
pub struct ZoneScheduler {
    zone: String,
    config: ZoneConfig,
    store: TaskStore,
    ledger: AssignmentLedger,
    capabilities: Option<Box<dyn CapabilityProvider>>,
    audit: Option<Box<dyn AuditSink>>,
}

impl ZoneScheduler {
    /// Create an empty scheduler for `zone`.
    pub fn new(zone: impl Into<String>, config: ZoneConfig) -> Self {
        Self {
            zone: zone.into(),
            config,
            store: TaskStore::new(),
            ledger: AssignmentLedger::new(),
            capabilities: None,
            audit: None,
        }
    }

    /// Restore a scheduler from a persisted snapshot.
    ///
    /// Orphaned ledger entries are dropped here rather than on first use.
    pub fn restore(zone: impl Into<String>, config: ZoneConfig, snapshot: ZoneSnapshot) -> Self {
        let mut scheduler = Self::new(zone, config);
        scheduler.store = TaskStore::from_records(snapshot.tasks, snapshot.next_key, snapshot.next_seq);
        scheduler.ledger = AssignmentLedger::from_parts(snapshot.ledger, snapshot.parked);
        let orphans = scheduler.ledger.prune_orphans(&scheduler.store);
        if !orphans.is_empty() {
            warn!(zone = %scheduler.zone, count = orphans.len(), "dropped orphaned ledger entries on restore");
            for worker in orphans {
                scheduler.ledger.park(worker);
            }
        }
        scheduler.after_mutation("restore", Vec::new());
        scheduler
    }

    /// Attach a capability provider used to re-place displaced workers.
    #[must_use]
    pub fn with_capabilities(mut self, provider: impl CapabilityProvider + 'static) -> Self {
        self.set_capabilities(provider);
        self
    }

    /// Replace the capability provider.
    pub fn set_capabilities(&mut self, provider: impl CapabilityProvider + 'static) {
        self.capabilities = Some(Box::new(provider));
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Zone name.
    #[must_use]
    pub fn zone(&self) -> &str {
        &self.zone
    }

    /// Zone configuration.
    #[must_use]
    pub const fn config(&self) -> &ZoneConfig {
        &self.config
    }

    /// Add a task and rebalance. Returns the key actually assigned.
    pub fn add_task(&mut self, task: NewTask) -> TaskKey {
        let key = self.store.insert(task, self.config.default_need);
        info!(zone = %self.zone, key = %key, "task added");
        let mut dispatcher = self.dispatcher();
        dispatcher.rebalance();
        let events = dispatcher.into_events();
        self.after_mutation("add_task", events);
        key
    }

    /// Merge `patch` into matching tasks; returns the keys updated.
    ///
    /// Matches by key when the patch carries one, otherwise every task of
    /// the patch's kind. Nothing matching is not an error.
    pub fn update_task(&mut self, patch: TaskPatch) -> Vec<TaskKey> {
        let keys = match (patch.key, patch.kind.as_deref()) {
            (Some(key), _) => self.store.get(key).map(|t| vec![t.key]).unwrap_or_default(),
            (None, Some(kind)) => self.store.keys_of_type(kind),
            (None, None) => Vec::new(),
        };
        if keys.is_empty() {
            return keys;
        }

        let mut rebalance = false;
        let mut refit = Vec::new();
        for &key in &keys {
            let Some(record) = self.store.get_mut(key) else {
                continue;
            };
            let effect = patch.merge_into(record);
            if effect.reordered {
                self.store.reposition(key);
            }
            if effect.require_changed {
                refit.push(key);
            }
            rebalance |= effect.needs_rebalance();
        }
        info!(zone = %self.zone, updated = keys.len(), rebalance, "tasks updated");

        let mut dispatcher = self.dispatcher();
        for key in refit {
            dispatcher.refit(key);
        }
        if rebalance {
            dispatcher.rebalance();
        }
        let events = dispatcher.into_events();
        self.after_mutation("update_task", events);
        keys
    }

    /// Like [`Self::update_task`], but adds the task when nothing matches.
    ///
    /// The patch must carry a kind to be inserted.
    pub fn upsert_task(&mut self, patch: TaskPatch) -> Vec<TaskKey> {
        let updated = self.update_task(patch.clone());
        if !updated.is_empty() {
            return updated;
        }
        patch
            .into_new_task()
            .map(|task| vec![self.add_task(task)])
            .unwrap_or_default()
    }

    /// Remove matching tasks and re-place their workers in the same call.
    pub fn remove_task(&mut self, selector: impl Into<TaskSelector>) -> Vec<TaskRecord> {
        let removed = match selector.into() {
            TaskSelector::Key(key) => self.store.remove_key(key).into_iter().collect(),
            TaskSelector::Type(kind) => self.store.remove_type(&kind),
        };
        if removed.is_empty() {
            return removed;
        }
        info!(zone = %self.zone, removed = removed.len(), "tasks removed");

        let mut dispatcher = self.dispatcher();
        for record in &removed {
            dispatcher.evict_removed(record);
        }
        dispatcher.rebalance();
        let events = dispatcher.into_events();
        self.after_mutation("remove_task", events);
        removed
    }

    /// True if any task of `kind` exists.
    #[must_use]
    pub fn has_task(&self, kind: &str) -> bool {
        self.store.has_type(kind)
    }

    /// Look up a task by key.
    #[must_use]
    pub fn get_task(&self, key: TaskKey) -> Option<&TaskRecord> {
        self.store.get(key)
    }

    /// Tasks in scheduling order.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskRecord> {
        self.store.iter()
    }

    /// Current task for `worker`, assigning one if it has none.
    ///
    /// A live ledger entry is returned as is. Otherwise fresh assignment
    /// runs inline; `None` means no task accepts workers right now.
    pub fn get_assignment(&mut self, worker: &str, tag: Option<&str>) -> Option<&TaskRecord> {
        if let Some(entry) = self.ledger.get(worker) {
            if self.store.get(entry.key).is_some() {
                return self.store.get(entry.key);
            }
        }

        let mut dispatcher = self.dispatcher();
        let key = dispatcher.assign(worker, tag);
        let events = dispatcher.into_events();
        self.after_mutation("get_assignment", events);
        key.and_then(|key| self.store.get(key))
    }

    /// Current task for `worker` without assigning.
    #[must_use]
    pub fn current_assignment(&self, worker: &str) -> Option<&TaskRecord> {
        self.ledger.get(worker).and_then(|e| self.store.get(e.key))
    }

    /// Detach a worker the caller reports gone; returns the task it left.
    pub fn release(&mut self, worker: &str) -> Option<TaskKey> {
        let mut dispatcher = self.dispatcher();
        let key = dispatcher.release(worker);
        if key.is_some() {
            dispatcher.rebalance();
        }
        let events = dispatcher.into_events();
        self.after_mutation("release", events);
        key
    }

    /// Demand signals for the spawner.
    #[must_use]
    pub fn demand(&self) -> Demand {
        let mut demand = Demand {
            parked_workers: self.ledger.parked().count(),
            ..Demand::default()
        };
        for task in &self.store {
            if task.is_open() {
                demand.open_tasks += 1;
                demand.missing_workers += task.shortfall();
            }
            if let Some(tag) = &task.require {
                let missing = task.need.saturating_sub(task.require_unit);
                if missing > 0 {
                    *demand.missing_specialists.entry(tag.clone()).or_default() += missing;
                }
            }
        }
        demand
    }

    /// Assignment ledger.
    #[must_use]
    pub const fn ledger(&self) -> &AssignmentLedger {
        &self.ledger
    }

    /// Snapshot for persistence.
    #[must_use]
    pub fn snapshot(&self) -> ZoneSnapshot {
        ZoneSnapshot {
            tasks: self.store.iter().cloned().collect(),
            ledger: self.ledger.entries().clone(),
            parked: self.ledger.parked().cloned().collect(),
            next_key: self.store.next_key(),
            next_seq: self.store.next_seq(),
        }
    }

    /// Verify store/ledger invariants.
    pub fn verify(&self) -> Result<(), SchedulerError> {
        invariants::check(&self.store, &self.ledger)
    }

    fn dispatcher(&mut self) -> Dispatcher<'_> {
        let provider = self
            .capabilities
            .as_ref()
            .map(|p| &**p as &dyn CapabilityProvider);
        Dispatcher::new(&self.zone, &mut self.store, &mut self.ledger).with_capabilities(provider)
    }

    fn after_mutation(&mut self, operation: &'static str, events: Vec<DispatchEvent>) {
        if let Some(sink) = self.audit.as_mut() {
            for event in events {
                sink.record(build_audit_event(self.zone.clone(), event));
            }
        } else if !events.is_empty() {
            debug!(zone = %self.zone, operation, decisions = events.len(), "dispatch pass finished");
        }

        if self.config.verify_invariants {
            if let Err(err) = self.verify() {
                error!(zone = %self.zone, operation, %err, "scheduler state is inconsistent");
            }
        }
    }
}

impl std::fmt::Debug for ZoneScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneScheduler")
            .field("zone", &self.zone)
            .field("tasks", &self.store.len())
            .field("assigned", &self.ledger.len())
            .finish_non_exhaustive()
    }
}
