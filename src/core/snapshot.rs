//! Persisted zone state and the storage abstraction around it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::ledger::LedgerEntry;
use crate::core::task::TaskRecord;
use crate::core::SchedulerError;
use crate::util::ids::WorkerId;

/// Everything needed to restore a zone scheduler between ticks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneSnapshot {
    /// Tasks in scheduling order.
    pub tasks: Vec<TaskRecord>,
    /// Worker → assignment.
    #[serde(default)]
    pub ledger: BTreeMap<WorkerId, LedgerEntry>,
    /// Workers displaced without a new task.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parked: Vec<WorkerId>,
    /// Next task key to hand out.
    #[serde(default)]
    pub next_key: u64,
    /// Next insertion sequence.
    #[serde(default)]
    pub next_seq: u64,
}

/// Abstraction for persistence backends.
///
/// Invoked once per tick boundary: `load` at tick start, `save` at tick end.
pub trait StateStore {
    /// Load the last saved snapshot for `zone`, if any.
    fn load(&mut self, zone: &str) -> Result<Option<ZoneSnapshot>, SchedulerError>;
    /// Persist `snapshot` for `zone`, replacing the previous one.
    fn save(&mut self, zone: &str, snapshot: &ZoneSnapshot) -> Result<(), SchedulerError>;
}

impl<S: StateStore + ?Sized> StateStore for Box<S> {
    fn load(&mut self, zone: &str) -> Result<Option<ZoneSnapshot>, SchedulerError> {
        (**self).load(zone)
    }

    fn save(&mut self, zone: &str, snapshot: &ZoneSnapshot) -> Result<(), SchedulerError> {
        (**self).save(zone, snapshot)
    }
}
