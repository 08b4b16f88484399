//! Capability matching between worker tags and task requirements.
//!
//! Pure functions only. A worker without a tag is *generic*; a worker tagged
//! `X` is a specialist for tasks that require `X` and a plain filler
//! everywhere else.

use serde::{Deserialize, Serialize};

/// How a worker occupies its task slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fit {
    /// Tag matches the task's `require`; counted in `require_unit`.
    Specialist,
    /// Tag matches but the task's specialist coverage is already full.
    /// Promoted when a counted specialist leaves; never preempted.
    Reserve,
    /// Any other occupant. Fillers are reclaimed before specialists.
    #[default]
    Filler,
}

impl Fit {
    /// True for [`Fit::Specialist`].
    #[must_use]
    pub const fn is_specialist(self) -> bool {
        matches!(self, Self::Specialist)
    }

    /// True if the worker carries the task's required tag, counted or not.
    #[must_use]
    pub const fn is_match(self) -> bool {
        matches!(self, Self::Specialist | Self::Reserve)
    }
}

/// True if a worker with `worker_tag` can service a task requiring `require`.
///
/// Every worker can service a task; a requirement only expresses preference,
/// so this holds when the task has no requirement or the tags agree.
#[must_use]
pub fn matches(worker_tag: Option<&str>, require: Option<&str>) -> bool {
    require.is_none() || worker_tag == require
}

/// True iff `worker_tag` satisfies `require` and `occupant_tag` does not.
#[must_use]
pub fn is_better_fit(
    worker_tag: Option<&str>,
    occupant_tag: Option<&str>,
    require: Option<&str>,
) -> bool {
    require.is_some() && worker_tag == require && occupant_tag != require
}

/// Slot kind a worker with `worker_tag` takes on a task requiring `require`.
#[must_use]
pub fn fit(worker_tag: Option<&str>, require: Option<&str>) -> Fit {
    if require.is_some() && matches(worker_tag, require) {
        Fit::Specialist
    } else {
        Fit::Filler
    }
}

/// Supplies a worker's specialization tag on demand.
///
/// Consulted when the scheduler must re-place a worker it was not asked
/// about directly (preemption victims, occupants of removed tasks). Answers
/// are used for the current call only.
pub trait CapabilityProvider: Send + Sync {
    /// Tag of `worker`, `None` for generic workers.
    fn tag_of(&self, worker: &str) -> Option<String>;
}

impl<F> CapabilityProvider for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn tag_of(&self, worker: &str) -> Option<String> {
        self(worker)
    }
}

impl<S: std::hash::BuildHasher + Send + Sync> CapabilityProvider
    for std::collections::HashMap<String, String, S>
{
    fn tag_of(&self, worker: &str) -> Option<String> {
        self.get(worker).cloned()
    }
}
