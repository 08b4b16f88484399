//! Tick driver: load zone state, run the tick body, save state.

use anyhow::Context;
use tracing::{debug, warn};

use crate::config::ZoneConfig;
use crate::core::{AppResult, StateStore, ZoneScheduler};

/// Drives one zone through a tick against a persistence backend.
#[derive(Debug)]
pub struct TickDriver<S> {
    store: S,
}

impl<S: StateStore> TickDriver<S> {
    /// Wrap a state store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Backing store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Consume the driver, returning the store.
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Restore `zone` (or start it empty), run `body`, then persist it.
    ///
    /// State is only saved when `body` returns; a failed save is reported
    /// as an error after the tick's work has happened.
    pub fn run_tick<R>(
        &mut self,
        zone: &str,
        config: ZoneConfig,
        body: impl FnOnce(&mut ZoneScheduler) -> R,
    ) -> AppResult<R> {
        let snapshot = self
            .store
            .load(zone)
            .with_context(|| format!("loading state for zone {zone}"))?;
        let mut scheduler = match snapshot {
            Some(snapshot) => ZoneScheduler::restore(zone, config, snapshot),
            None => {
                debug!(zone, "no saved state; starting empty");
                ZoneScheduler::new(zone, config)
            }
        };

        let out = body(&mut scheduler);

        if let Err(err) = scheduler.verify() {
            warn!(zone, %err, "saving inconsistent zone state");
        }
        self.store
            .save(zone, &scheduler.snapshot())
            .with_context(|| format!("saving state for zone {zone}"))?;
        Ok(out)
    }
}
