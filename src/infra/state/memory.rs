//! In-memory state store for development and tests.

use std::collections::HashMap;

use crate::core::{SchedulerError, StateStore, ZoneSnapshot};

/// Keeps the latest snapshot per zone in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStateStore {
    zones: HashMap<String, ZoneSnapshot>,
}

impl InMemoryStateStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of zones with saved state.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// True if nothing has been saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

impl StateStore for InMemoryStateStore {
    fn load(&mut self, zone: &str) -> Result<Option<ZoneSnapshot>, SchedulerError> {
        Ok(self.zones.get(zone).cloned())
    }

    fn save(&mut self, zone: &str, snapshot: &ZoneSnapshot) -> Result<(), SchedulerError> {
        self.zones.insert(zone.to_owned(), snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_zone_loads_none() {
        let mut store = InMemoryStateStore::new();
        assert!(store.load("W1N1").unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_replaces_previous() {
        let mut store = InMemoryStateStore::new();
        let mut snapshot = ZoneSnapshot::default();
        store.save("W1N1", &snapshot).unwrap();
        snapshot.next_key = 7;
        store.save("W1N1", &snapshot).unwrap();
        assert_eq!(store.load("W1N1").unwrap().unwrap().next_key, 7);
        assert_eq!(store.len(), 1);
    }
}
