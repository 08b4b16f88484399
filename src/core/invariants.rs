//! Consistency checks between the task store and the assignment ledger.
//!
//! A failure here means the dispatcher itself is wrong; callers log it at
//! `error` level and keep running.

use std::collections::HashMap;

use crate::core::error::SchedulerError;
use crate::core::ledger::AssignmentLedger;
use crate::core::matcher::Fit;
use crate::core::store::TaskStore;
use crate::core::task::schedule_order;
use crate::util::ids::TaskKey;

/// Verify every store/ledger invariant, reporting the first violation.
///
/// Ledger entries pointing at missing tasks are orphans, resolved lazily,
/// and are not counted as violations.
pub fn check(store: &TaskStore, ledger: &AssignmentLedger) -> Result<(), SchedulerError> {
    for pair in store.iter().collect::<Vec<_>>().windows(2) {
        if schedule_order(pair[0], pair[1]).is_gt() {
            return Err(violation(format!(
                "task {} sorted before {}",
                pair[0].key, pair[1].key
            )));
        }
    }

    let mut counted: HashMap<TaskKey, (u32, u32, u32)> = HashMap::new();
    for (_, entry) in ledger.iter() {
        let slot = counted.entry(entry.key).or_default();
        slot.0 += 1;
        match entry.fit {
            Fit::Specialist => slot.1 += 1,
            Fit::Reserve => slot.2 += 1,
            Fit::Filler => {}
        }
    }

    for task in store {
        if task.require.is_none() && task.require_unit != 0 {
            return Err(violation(format!(
                "task {} has requireUnit {} without a requirement",
                task.key, task.require_unit
            )));
        }
        if task.require_unit > task.unit {
            return Err(violation(format!(
                "task {} has requireUnit {} > unit {}",
                task.key, task.require_unit, task.unit
            )));
        }
        if task.require.is_some() && task.require_unit > task.need {
            return Err(violation(format!(
                "task {} has requireUnit {} > need {}",
                task.key, task.require_unit, task.need
            )));
        }
        let (unit, require_unit, reserves) = counted.get(&task.key).copied().unwrap_or_default();
        if unit != task.unit || require_unit != task.require_unit {
            return Err(violation(format!(
                "task {} counters ({}, {}) disagree with ledger ({unit}, {require_unit})",
                task.key, task.unit, task.require_unit
            )));
        }
        if reserves > 0 && (task.require.is_none() || task.require_unit < task.need) {
            return Err(violation(format!(
                "task {} holds {reserves} reserve specialists with coverage {}/{}",
                task.key, task.require_unit, task.need
            )));
        }
    }

    if let Some(worker) = ledger.parked().find(|w| ledger.get(w).is_some()) {
        return Err(violation(format!("worker {worker} is both parked and assigned")));
    }
    Ok(())
}

fn violation(detail: String) -> SchedulerError {
    SchedulerError::InvariantViolation(detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::LedgerEntry;
    use crate::core::task::NewTask;

    #[test]
    fn test_consistent_state_passes() {
        let mut store = TaskStore::new();
        let key = store.insert(NewTask::new("a").require("x").need(2), 1);
        let task = store.get_mut(key).unwrap();
        task.unit = 2;
        task.require_unit = 1;
        let mut ledger = AssignmentLedger::new();
        ledger.insert("w1", LedgerEntry { key, fit: Fit::Specialist });
        ledger.insert("w2", LedgerEntry { key, fit: Fit::Filler });
        assert!(check(&store, &ledger).is_ok());
    }

    #[test]
    fn test_counter_mismatch_is_reported() {
        let mut store = TaskStore::new();
        let key = store.insert(NewTask::new("a"), 1);
        store.get_mut(key).unwrap().unit = 1;
        let ledger = AssignmentLedger::new();
        let err = check(&store, &ledger).unwrap_err();
        assert!(matches!(err, SchedulerError::InvariantViolation(_)));
    }

    #[test]
    fn test_require_unit_above_unit_is_reported() {
        let mut store = TaskStore::new();
        let key = store.insert(NewTask::new("a").require("x"), 1);
        store.get_mut(key).unwrap().require_unit = 1;
        let err = check(&store, &AssignmentLedger::new()).unwrap_err();
        assert!(err.to_string().contains("requireUnit 1 > unit 0"));
    }

    #[test]
    fn test_reserve_with_uncovered_slot_is_reported() {
        let mut store = TaskStore::new();
        let key = store.insert(NewTask::new("a").require("x"), 1);
        store.get_mut(key).unwrap().unit = 1;
        let mut ledger = AssignmentLedger::new();
        ledger.insert("w1", LedgerEntry { key, fit: Fit::Reserve });
        let err = check(&store, &ledger).unwrap_err();
        assert!(err.to_string().contains("reserve specialists with coverage 0/1"));
    }

    #[test]
    fn test_orphans_are_tolerated() {
        let store = TaskStore::new();
        let mut ledger = AssignmentLedger::new();
        ledger.insert(
            "w1",
            LedgerEntry {
                key: TaskKey(42),
                fit: Fit::Filler,
            },
        );
        assert!(check(&store, &ledger).is_ok());
    }
}
