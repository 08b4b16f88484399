//! Registry of live zone schedulers shared across threads.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::{AuditEvent, InMemoryAuditSink, SchedulerError, ZoneScheduler};

type SharedZone = Arc<Mutex<ZoneScheduler>>;

/// Zone name → scheduler, each behind its own lock.
#[derive(Debug, Default)]
pub struct ZoneRegistry {
    zones: HashMap<String, SharedZone>,
    audit: HashMap<String, Arc<Mutex<InMemoryAuditSink>>>,
}

impl ZoneRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scheduler under its zone name, replacing any previous one.
    pub fn insert(&mut self, scheduler: ZoneScheduler, audit: Option<Arc<Mutex<InMemoryAuditSink>>>) {
        let name = scheduler.zone().to_owned();
        match audit {
            Some(sink) => {
                self.audit.insert(name.clone(), sink);
            }
            None => {
                self.audit.remove(&name);
            }
        }
        self.zones.insert(name, Arc::new(Mutex::new(scheduler)));
    }

    /// Shared handle to a zone.
    #[must_use]
    pub fn get(&self, zone: &str) -> Option<SharedZone> {
        self.zones.get(zone).cloned()
    }

    /// Run `f` with the zone locked.
    pub fn with_zone<R>(
        &self,
        zone: &str,
        f: impl FnOnce(&mut ZoneScheduler) -> R,
    ) -> Result<R, SchedulerError> {
        let handle = self
            .zones
            .get(zone)
            .ok_or_else(|| SchedulerError::UnknownZone(zone.to_owned()))?;
        let mut guard = handle.lock();
        Ok(f(&mut guard))
    }

    /// Audit events recorded for `zone`; empty when auditing is off.
    #[must_use]
    pub fn audit_events(&self, zone: &str) -> Vec<AuditEvent> {
        self.audit
            .get(zone)
            .map(|sink| sink.lock().events())
            .unwrap_or_default()
    }

    /// Registered zone names, sorted.
    #[must_use]
    pub fn zone_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.zones.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// True if no zones are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
