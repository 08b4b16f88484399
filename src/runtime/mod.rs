//! Runtime glue: the zone registry and the per-tick load/run/save cycle.

pub mod registry;
pub mod tick;

pub use registry::ZoneRegistry;
pub use tick::TickDriver;
