//! Configuration models for zones and state backends.

pub mod zone;

pub use zone::{SchedulerConfig, StateBackendConfig, ZoneConfig, CONFIG_ENV_VAR};
