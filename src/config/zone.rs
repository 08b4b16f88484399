//! Zone and scheduler configuration structures.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::AppResult;

/// Environment variable naming the JSON configuration file.
pub const CONFIG_ENV_VAR: &str = "ROOM_DISPATCH_CONFIG";

/// State backend selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateBackendConfig {
    /// In-memory snapshots for development/testing.
    #[default]
    InMemory,
    /// One JSON document per zone under `SchedulerConfig::state_dir`.
    File,
}

/// Per-zone configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Need applied to tasks added without one.
    #[serde(default = "default_need")]
    pub default_need: u32,
    /// Check store/ledger invariants after every mutation.
    #[serde(default = "default_verify")]
    pub verify_invariants: bool,
    /// Capacity of the in-memory audit buffer; 0 disables auditing.
    #[serde(default)]
    pub audit_capacity: usize,
    /// State backend selection.
    #[serde(default)]
    pub state: StateBackendConfig,
}

const fn default_need() -> u32 {
    1
}

const fn default_verify() -> bool {
    true
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            default_need: default_need(),
            verify_invariants: default_verify(),
            audit_capacity: 0,
            state: StateBackendConfig::default(),
        }
    }
}

impl ZoneConfig {
    /// Set the default need.
    #[must_use]
    pub const fn with_default_need(mut self, need: u32) -> Self {
        self.default_need = need;
        self
    }

    /// Enable auditing with a bounded buffer.
    #[must_use]
    pub const fn with_audit_capacity(mut self, capacity: usize) -> Self {
        self.audit_capacity = capacity;
        self
    }

    /// Toggle invariant verification.
    #[must_use]
    pub const fn with_verify_invariants(mut self, verify: bool) -> Self {
        self.verify_invariants = verify;
        self
    }

    /// Validate zone configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.default_need == 0 {
            return Err("default_need must be greater than 0".into());
        }
        Ok(())
    }
}

/// Root scheduler configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Map of zone name to configuration.
    pub zones: HashMap<String, ZoneConfig>,
    /// Directory for file-backed zone state.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
}

impl SchedulerConfig {
    /// Validate all zones and ensure at least one zone exists.
    pub fn validate(&self) -> Result<(), String> {
        if self.zones.is_empty() {
            return Err("at least one zone must be defined".into());
        }
        for (name, zone) in &self.zones {
            zone.validate()
                .map_err(|e| format!("zone `{name}` invalid: {e}"))?;
            if zone.state == StateBackendConfig::File && self.state_dir.is_none() {
                return Err(format!("zone `{name}` uses file state but no state_dir is set"));
            }
        }
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and validate a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json_str(&raw)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("loading config {}", path.display()))
    }

    /// Load from the file named by [`CONFIG_ENV_VAR`], after reading `.env`.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();
        let path = std::env::var(CONFIG_ENV_VAR)
            .with_context(|| format!("{CONFIG_ENV_VAR} is not set"))?;
        Self::from_file(path)
    }

    /// Configuration for `zone`, falling back to defaults.
    #[must_use]
    pub fn zone(&self, zone: &str) -> ZoneConfig {
        self.zones.get(zone).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_json() {
        let cfg = SchedulerConfig::from_json_str(r#"{ "zones": { "W1N1": {} } }"#).unwrap();
        let zone = cfg.zone("W1N1");
        assert_eq!(zone.default_need, 1);
        assert!(zone.verify_invariants);
        assert_eq!(zone.state, StateBackendConfig::InMemory);
    }

    #[test]
    fn test_unknown_zone_falls_back_to_default() {
        let cfg = SchedulerConfig::default();
        assert_eq!(cfg.zone("nowhere"), ZoneConfig::default());
    }
}
