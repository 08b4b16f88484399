//! Assignment, preemption and rebalancing over one zone's tasks.
//!
//! The dispatcher borrows a zone's [`TaskStore`] and [`AssignmentLedger`]
//! for the duration of a single operation. It is the only code that moves
//! `unit`/`require_unit` counters, and every counter change goes through
//! `attach` or `detach` so the ledger and the counters move together.
//!
//! # Fresh assignment
//!
//! 1. A worker tagged `X` takes the highest-priority task requiring `X`
//!    whose specialist coverage is short. If that task has a free slot the
//!    worker attaches; otherwise it displaces one filler. Workers that carry
//!    the tag, counted or held in reserve, are never displaced.
//! 2. Any worker takes the highest-priority open task.
//! 3. Nothing open: the worker overflows onto the highest-priority task with
//!    a non-zero need.
//!
//! # Rebalancing
//!
//! Surplus moves upward first: each over-filled task donates to the nearest
//! open task of strictly higher priority. Equal priorities never trade in
//! this phase. Remaining surplus then spills to the highest-priority open
//! task, and parked workers are pulled into whatever is still open.
//!
//! # Specialist coverage
//!
//! `require_unit` never exceeds `need`. A matching worker beyond that is held
//! as [`Fit::Reserve`] and promoted as soon as a counted specialist leaves or
//! the need grows.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, warn};

use crate::core::audit::{AuditAction, DispatchEvent};
use crate::core::ledger::{AssignmentLedger, LedgerEntry};
use crate::core::matcher::{self, CapabilityProvider, Fit};
use crate::core::store::TaskStore;
use crate::core::task::TaskRecord;
use crate::util::ids::{Tag, TaskKey, WorkerId};

/// A detached worker waiting to be placed again.
#[derive(Debug)]
enum Pending {
    /// Tag given by the worker earlier in this call, or inferred from the
    /// slot it held.
    Known { worker: WorkerId, tag: Option<Tag> },
    /// Tag unknown until a capability provider or the worker itself says.
    Unknown(WorkerId),
}

/// Single-operation view over a zone's scheduling state.
pub struct Dispatcher<'a> {
    zone: &'a str,
    store: &'a mut TaskStore,
    ledger: &'a mut AssignmentLedger,
    capabilities: Option<&'a dyn CapabilityProvider>,
    displaced: VecDeque<Pending>,
    known_tags: HashMap<WorkerId, Option<Tag>>,
    events: Vec<DispatchEvent>,
}

impl<'a> Dispatcher<'a> {
    /// Borrow a zone's state.
    pub fn new(zone: &'a str, store: &'a mut TaskStore, ledger: &'a mut AssignmentLedger) -> Self {
        Self {
            zone,
            store,
            ledger,
            capabilities: None,
            displaced: VecDeque::new(),
            known_tags: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// Resolve tags of displaced workers through `provider`.
    ///
    /// Without a provider, a preempted filler whose tag was not given in
    /// this call is parked until it asks again or a rebalance pulls it.
    #[must_use]
    pub fn with_capabilities(mut self, provider: Option<&'a dyn CapabilityProvider>) -> Self {
        self.capabilities = provider;
        self
    }

    /// Decisions made so far.
    #[must_use]
    pub fn into_events(self) -> Vec<DispatchEvent> {
        self.events
    }

    /// Fresh assignment for `worker`, then re-place anyone it displaced.
    ///
    /// Returns `None` only when no task accepts workers.
    pub fn assign(&mut self, worker: &str, tag: Option<&str>) -> Option<TaskKey> {
        if let Some(previous) = self.ledger.get(worker).copied() {
            if self.store.get(previous.key).is_some() {
                return Some(previous.key);
            }
            self.ledger.remove(worker);
            self.emit(worker, Some(previous.key), AuditAction::Orphan);
            warn!(zone = self.zone, worker, key = %previous.key, "dropped orphaned ledger entry");
        }
        self.ledger.unpark(worker);
        self.known_tags.insert(worker.to_owned(), tag.map(str::to_owned));
        let key = self.place(worker, tag);
        if key.is_none() {
            self.park(worker.to_owned());
        }
        self.resettle();
        key
    }

    /// Steps 1-3 of fresh assignment. Displaced fillers are queued.
    fn place(&mut self, worker: &str, tag: Option<&str>) -> Option<TaskKey> {
        if let Some(tag) = tag {
            if let Some(at) = self.store.find(|t| t.wants_specialist(tag)) {
                if let Some(key) = self.claim_specialist_slot(worker, tag, at) {
                    return Some(key);
                }
            }
        }

        if let Some(at) = self.store.find(TaskRecord::is_open) {
            let fit = self.fit_at(tag, at);
            return self.attach(worker, at, fit, AuditAction::Assign);
        }

        let at = self.store.find(|t| t.need > 0)?;
        let fit = self.fit_at(tag, at);
        self.attach(worker, at, fit, AuditAction::Overflow)
    }

    fn claim_specialist_slot(&mut self, worker: &str, tag: &str, at: usize) -> Option<TaskKey> {
        let (key, unit, need, require) = self
            .store
            .at(at)
            .map(|t| (t.key, t.unit, t.need, t.require.clone()))?;
        if unit < need {
            return self.attach(worker, at, Fit::Specialist, AuditAction::Assign);
        }
        let Some(victim) = self.ledger.first_with_fit(key, Fit::Filler) else {
            warn!(zone = self.zone, key = %key, "specialist coverage short but no filler to reclaim");
            return None;
        };
        let known = self.known_tags.get(&victim).cloned();
        let victim_tag = match self.capabilities {
            Some(provider) => provider.tag_of(&victim),
            None => known.clone().flatten(),
        };
        if !matcher::is_better_fit(Some(tag), victim_tag.as_deref(), require.as_deref()) {
            debug!(zone = self.zone, worker, occupant = %victim, key = %key, "occupant already carries the tag");
            return None;
        }
        self.detach(&victim);
        self.emit(&victim, Some(key), AuditAction::Displace);
        debug!(zone = self.zone, worker, displaced = %victim, key = %key, "preempted filler");
        self.displaced.push_back(match known {
            Some(tag) => Pending::Known { worker: victim, tag },
            None => Pending::Unknown(victim),
        });
        self.attach(worker, at, Fit::Specialist, AuditAction::Preempt)
    }

    /// Re-place every queued worker, or park it when its tag is unknown.
    fn resettle(&mut self) {
        while let Some(pending) = self.displaced.pop_front() {
            let (worker, tag) = match (pending, self.capabilities) {
                (Pending::Known { worker, .. } | Pending::Unknown(worker), Some(provider)) => {
                    let tag = provider.tag_of(&worker);
                    (worker, tag)
                }
                (Pending::Known { worker, tag }, None) => (worker, tag),
                (Pending::Unknown(worker), None) => {
                    self.park(worker);
                    continue;
                }
            };
            self.known_tags.insert(worker.clone(), tag.clone());
            if self.place(&worker, tag.as_deref()).is_none() {
                self.park(worker);
            }
        }
    }

    fn park(&mut self, worker: WorkerId) {
        self.emit(&worker, None, AuditAction::Park);
        self.ledger.park(worker);
    }

    /// Detach `worker` for good (the caller reports it gone).
    pub fn release(&mut self, worker: &str) -> Option<TaskKey> {
        self.ledger.unpark(worker);
        let (key, _) = self.detach(worker)?;
        self.emit(worker, Some(key), AuditAction::Release);
        Some(key)
    }

    /// Detach every occupant of a task that has already left the store and
    /// re-place them in this call.
    ///
    /// Without a provider a matching worker keeps the tag of the slot it
    /// held and fillers are re-placed as generic workers. Matching workers
    /// are placed first, so a filler never takes a slot a specialist would
    /// reclaim from it.
    pub fn evict_removed(&mut self, removed: &TaskRecord) {
        let mut occupants = self.ledger.occupants(removed.key);
        occupants.sort_by_key(|&(_, fit)| match fit {
            Fit::Specialist => 0,
            Fit::Reserve => 1,
            Fit::Filler => 2,
        });
        for (worker, fit) in occupants {
            self.ledger.remove(&worker);
            self.emit(&worker, Some(removed.key), AuditAction::Release);
            let tag = if fit.is_match() {
                removed.require.clone()
            } else {
                None
            };
            self.displaced.push_back(Pending::Known { worker, tag });
        }
        self.resettle();
    }

    /// Recompute occupant fits after a task's requirement changed.
    pub fn refit(&mut self, key: TaskKey) {
        let Some(at) = self.store.position(key) else {
            return;
        };
        let require = self.store.at(at).and_then(|t| t.require.clone());
        let mut specialists = 0;
        for (worker, _) in self.ledger.occupants(key) {
            let fit = match (self.capabilities, require.as_deref()) {
                (Some(provider), Some(_)) => {
                    matcher::fit(provider.tag_of(&worker).as_deref(), require.as_deref())
                }
                _ => Fit::Filler,
            };
            if fit.is_specialist() {
                specialists += 1;
            }
            self.ledger.set_fit(&worker, fit);
        }
        if let Some(task) = self.store.at_mut(at) {
            task.require_unit = specialists;
        }
        self.settle_coverage(at);
    }

    /// Full structural rebalancing pass.
    pub fn rebalance(&mut self) {
        let len = self.store.len();

        for from in (0..len).rev() {
            while self.surplus_at(from) > 0 {
                let Some(to) = (0..from)
                    .rev()
                    .find(|&j| self.is_open_at(j) && self.outranks(j, from))
                else {
                    break;
                };
                if !self.donate(from, to) {
                    break;
                }
            }
        }

        for from in 0..len {
            while self.surplus_at(from) > 0 {
                let Some(to) = (0..len).find(|&j| j != from && self.is_open_at(j)) else {
                    break;
                };
                if !self.donate(from, to) {
                    break;
                }
            }
        }

        self.pull_parked();

        for at in 0..len {
            self.settle_coverage(at);
        }
    }

    /// Parked workers fill open tasks in priority order. Without a provider
    /// their tag is unknown and they count as fillers.
    fn pull_parked(&mut self) {
        let parked: Vec<WorkerId> = self.ledger.parked().cloned().collect();
        for worker in parked {
            let Some(at) = self.store.find(TaskRecord::is_open) else {
                break;
            };
            let tag = self.capabilities.and_then(|p| p.tag_of(&worker));
            let fit = self.fit_at(tag.as_deref(), at);
            self.attach(&worker, at, fit, AuditAction::Assign);
        }
    }

    /// Move one surplus worker from `from` to `to`. Fillers go first, then
    /// reserves, then counted specialists.
    fn donate(&mut self, from: usize, to: usize) -> bool {
        let Some(source) = self.store.at(from) else {
            return false;
        };
        let source_key = source.key;
        let source_require = source.require.clone();
        let donor = [Fit::Filler, Fit::Reserve, Fit::Specialist]
            .into_iter()
            .find_map(|fit| self.ledger.first_with_fit(source_key, fit).map(|w| (w, fit)));
        let Some((worker, old_fit)) = donor else {
            warn!(zone = self.zone, key = %source_key, "surplus counted but no occupant to donate");
            return false;
        };

        self.detach(&worker);
        let target_require = self.store.at(to).and_then(|t| t.require.clone());
        let fit = match self.capabilities {
            Some(provider) => {
                matcher::fit(provider.tag_of(&worker).as_deref(), target_require.as_deref())
            }
            None if old_fit.is_match() && source_require == target_require => {
                Fit::Specialist
            }
            None => Fit::Filler,
        };
        self.attach(&worker, to, fit, AuditAction::Donate).is_some()
    }

    /// Hold specialists beyond `need` in reserve and promote reserves into
    /// uncovered slots.
    fn settle_coverage(&mut self, at: usize) {
        let Some(task) = self.store.at(at) else {
            return;
        };
        let (key, need) = (task.key, task.need);
        let mut covered = task.require_unit;
        while covered > need {
            let Some(worker) = self.ledger.first_with_fit(key, Fit::Specialist) else {
                break;
            };
            self.ledger.set_fit(&worker, Fit::Reserve);
            covered -= 1;
        }
        while covered < need {
            let Some(worker) = self.ledger.first_with_fit(key, Fit::Reserve) else {
                break;
            };
            self.ledger.set_fit(&worker, Fit::Specialist);
            covered += 1;
        }
        if let Some(task) = self.store.at_mut(at) {
            task.require_unit = covered;
        }
    }

    /// True if the task at `a` has strictly higher priority than the one at
    /// `b`. Any priority outranks none.
    fn outranks(&self, a: usize, b: usize) -> bool {
        let priority = |at| self.store.at(at).and_then(|t| t.priority);
        match (priority(a), priority(b)) {
            (Some(a), Some(b)) => a > b,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    fn fit_at(&self, tag: Option<&str>, at: usize) -> Fit {
        self.store
            .at(at)
            .map_or(Fit::Filler, |t| matcher::fit(tag, t.require.as_deref()))
    }

    fn surplus_at(&self, at: usize) -> u32 {
        self.store.at(at).map_or(0, TaskRecord::surplus)
    }

    fn is_open_at(&self, at: usize) -> bool {
        self.store.at(at).is_some_and(TaskRecord::is_open)
    }

    /// Attach `worker` to the task at `at`. A matching worker is counted
    /// while coverage is below `need` and held in reserve after that.
    fn attach(&mut self, worker: &str, at: usize, fit: Fit, action: AuditAction) -> Option<TaskKey> {
        let task = self.store.at_mut(at)?;
        let fit = match fit {
            Fit::Filler => Fit::Filler,
            _ if task.require_unit < task.need => Fit::Specialist,
            _ => Fit::Reserve,
        };
        task.unit += 1;
        if fit.is_specialist() {
            task.require_unit += 1;
        }
        let key = task.key;
        self.ledger.insert(worker, LedgerEntry { key, fit });
        self.emit(worker, Some(key), action);
        debug!(zone = self.zone, worker, key = %key, ?fit, %action, "attached worker");
        Some(key)
    }

    /// Remove `worker`'s ledger entry and release its counters. A counted
    /// specialist leaving promotes one reserve of the same task.
    fn detach(&mut self, worker: &str) -> Option<(TaskKey, Fit)> {
        let entry = self.ledger.remove(worker)?;
        if let Some(task) = self.store.get_mut(entry.key) {
            task.unit = task.unit.saturating_sub(1);
            if entry.fit.is_specialist() {
                task.require_unit = task.require_unit.saturating_sub(1);
                if task.require_unit < task.need {
                    if let Some(reserve) = self.ledger.first_with_fit(entry.key, Fit::Reserve) {
                        self.ledger.set_fit(&reserve, Fit::Specialist);
                        task.require_unit += 1;
                        debug!(zone = self.zone, worker = %reserve, key = %entry.key, "promoted reserve specialist");
                    }
                }
            }
        }
        Some((entry.key, entry.fit))
    }

    fn emit(&mut self, worker: &str, key: Option<TaskKey>, action: AuditAction) {
        self.events.push(DispatchEvent {
            worker: worker.to_owned(),
            key,
            action,
        });
    }
}
