//! Builders to construct zone schedulers from configuration.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::config::{SchedulerConfig, StateBackendConfig, ZoneConfig};
use crate::core::{InMemoryAuditSink, SchedulerError, StateStore, ZoneScheduler};
use crate::infra::{FileStateStore, InMemoryStateStore};
use crate::runtime::ZoneRegistry;

/// Builds one zone scheduler, wiring an audit buffer when configured.
#[derive(Debug, Clone)]
pub struct ZoneBuilder {
    name: String,
    config: ZoneConfig,
}

impl ZoneBuilder {
    /// Start a builder for `name`.
    pub fn new(name: impl Into<String>, config: ZoneConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    /// Zone name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Zone configuration.
    #[must_use]
    pub const fn config(&self) -> &ZoneConfig {
        &self.config
    }

    /// Build the scheduler and, if auditing is enabled, the shared buffer
    /// it records into.
    pub fn build(self) -> Result<(ZoneScheduler, Option<Arc<Mutex<InMemoryAuditSink>>>), SchedulerError> {
        self.config
            .validate()
            .map_err(|e| SchedulerError::InvalidConfig(format!("zone `{}`: {e}", self.name)))?;
        let audit = (self.config.audit_capacity > 0)
            .then(|| Arc::new(Mutex::new(InMemoryAuditSink::new(self.config.audit_capacity))));
        let mut scheduler = ZoneScheduler::new(self.name, self.config);
        if let Some(sink) = &audit {
            scheduler = scheduler.with_audit(Box::new(Arc::clone(sink)));
        }
        Ok((scheduler, audit))
    }
}

/// Build every configured zone into a registry.
pub fn build_zones(cfg: &SchedulerConfig) -> Result<ZoneRegistry, SchedulerError> {
    cfg.validate().map_err(SchedulerError::InvalidConfig)?;

    let mut registry = ZoneRegistry::new();
    for (name, zone_cfg) in &cfg.zones {
        let (scheduler, audit) = ZoneBuilder::new(name.clone(), zone_cfg.clone()).build()?;
        registry.insert(scheduler, audit);
    }
    info!(zones = registry.len(), "zone registry built");
    Ok(registry)
}

/// Build the state backend a zone is configured for.
pub fn build_state_store(
    cfg: &SchedulerConfig,
    zone: &ZoneConfig,
) -> Result<Box<dyn StateStore + Send>, SchedulerError> {
    match zone.state {
        StateBackendConfig::InMemory => Ok(Box::new(InMemoryStateStore::new())),
        StateBackendConfig::File => {
            let dir = cfg.state_dir.as_ref().ok_or_else(|| {
                SchedulerError::InvalidConfig("file state requires state_dir".into())
            })?;
            Ok(Box::new(FileStateStore::new(dir)?))
        }
    }
}
