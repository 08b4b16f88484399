//! Identifier types shared across the scheduler.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Worker identifier, unique within a zone.
pub type WorkerId = String;

/// Specialization tag carried by workers and required by tasks.
pub type Tag = String;

/// Unique task key, monotonic within a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskKey(pub u64);

impl TaskKey {
    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for TaskKey {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
