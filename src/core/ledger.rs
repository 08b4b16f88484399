//! Worker → task assignments for a single zone.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::matcher::Fit;
use crate::core::store::TaskStore;
use crate::util::ids::{TaskKey, WorkerId};

/// What a worker is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Task the worker serves.
    pub key: TaskKey,
    /// Whether the worker counts toward the task's `require_unit`.
    #[serde(default)]
    pub fit: Fit,
}

/// Assignment ledger. Iteration is ordered by worker id so every pass over
/// occupants is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentLedger {
    entries: BTreeMap<WorkerId, LedgerEntry>,
    parked: BTreeSet<WorkerId>,
}

impl AssignmentLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted parts.
    #[must_use]
    pub fn from_parts(
        entries: BTreeMap<WorkerId, LedgerEntry>,
        parked: impl IntoIterator<Item = WorkerId>,
    ) -> Self {
        let parked = parked
            .into_iter()
            .filter(|w| !entries.contains_key(w))
            .collect();
        Self { entries, parked }
    }

    /// Entry for `worker`.
    #[must_use]
    pub fn get(&self, worker: &str) -> Option<&LedgerEntry> {
        self.entries.get(worker)
    }

    pub(crate) fn insert(&mut self, worker: &str, entry: LedgerEntry) -> Option<LedgerEntry> {
        self.parked.remove(worker);
        self.entries.insert(worker.to_owned(), entry)
    }

    pub(crate) fn remove(&mut self, worker: &str) -> Option<LedgerEntry> {
        self.entries.remove(worker)
    }

    pub(crate) fn set_fit(&mut self, worker: &str, fit: Fit) {
        if let Some(entry) = self.entries.get_mut(worker) {
            entry.fit = fit;
        }
    }

    /// Workers serving `key`, with their fit, in worker-id order.
    #[must_use]
    pub fn occupants(&self, key: TaskKey) -> Vec<(WorkerId, Fit)> {
        self.entries
            .iter()
            .filter(|(_, e)| e.key == key)
            .map(|(w, e)| (w.clone(), e.fit))
            .collect()
    }

    /// First occupant of `key` with the given fit.
    #[must_use]
    pub fn first_with_fit(&self, key: TaskKey, fit: Fit) -> Option<WorkerId> {
        self.entries
            .iter()
            .find(|(_, e)| e.key == key && e.fit == fit)
            .map(|(w, _)| w.clone())
    }

    /// Drop entries naming keys absent from `store`, returning the workers.
    pub fn prune_orphans(&mut self, store: &TaskStore) -> Vec<WorkerId> {
        let orphans: Vec<WorkerId> = self
            .entries
            .iter()
            .filter(|(_, e)| store.get(e.key).is_none())
            .map(|(w, _)| w.clone())
            .collect();
        for worker in &orphans {
            self.entries.remove(worker);
        }
        orphans
    }

    pub(crate) fn park(&mut self, worker: WorkerId) {
        if !self.entries.contains_key(&worker) {
            self.parked.insert(worker);
        }
    }

    pub(crate) fn unpark(&mut self, worker: &str) -> bool {
        self.parked.remove(worker)
    }

    /// Workers displaced without a new task yet.
    pub fn parked(&self) -> impl Iterator<Item = &WorkerId> {
        self.parked.iter()
    }

    /// True if `worker` is parked.
    #[must_use]
    pub fn is_parked(&self, worker: &str) -> bool {
        self.parked.contains(worker)
    }

    /// All entries in worker-id order.
    pub fn iter(&self) -> impl Iterator<Item = (&WorkerId, &LedgerEntry)> {
        self.entries.iter()
    }

    /// Number of assigned workers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no worker is assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &BTreeMap<WorkerId, LedgerEntry> {
        &self.entries
    }
}
