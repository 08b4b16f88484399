//! Builders turning configuration into live zone schedulers.

pub mod zone_builder;

pub use zone_builder::{build_state_store, build_zones, ZoneBuilder};
