//! Infrastructure adapters for zone state persistence.

pub mod state;

pub use state::{FileStateStore, InMemoryStateStore};
