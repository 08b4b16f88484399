//! Task records and the inputs used to create or modify them.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::util::ids::{Tag, TaskKey};

/// A unit of work in a zone, together with its fill counters.
///
/// Counters are owned by the dispatcher; callers read them but never write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Kind of work, used by the caller to look up the action handler.
    #[serde(rename = "type")]
    pub kind: String,
    /// Unique key within the zone.
    pub key: TaskKey,
    /// Priority, higher first. `None` sorts after every defined priority.
    #[serde(default)]
    pub priority: Option<i32>,
    /// Desired worker count.
    pub need: u32,
    /// Workers currently assigned, specialists included.
    #[serde(default)]
    pub unit: u32,
    /// Specialization tag preferred for this task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require: Option<Tag>,
    /// Assigned workers whose tag matches `require`.
    #[serde(default, rename = "requireUnit")]
    pub require_unit: u32,
    /// Insertion sequence; breaks priority ties.
    #[serde(default)]
    pub seq: u64,
    /// Opaque caller data, e.g. the id of the target the task refers to.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
}

impl TaskRecord {
    /// True while the task wants more workers.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.need > 0 && self.unit < self.need
    }

    /// Workers above `need`.
    #[must_use]
    pub const fn surplus(&self) -> u32 {
        self.unit.saturating_sub(self.need)
    }

    /// Workers still missing to reach `need`.
    #[must_use]
    pub const fn shortfall(&self) -> u32 {
        self.need.saturating_sub(self.unit)
    }

    /// True when a specialist with `tag` would still be counted here.
    #[must_use]
    pub fn wants_specialist(&self, tag: &str) -> bool {
        self.need > 0 && self.require.as_deref() == Some(tag) && self.require_unit < self.need
    }
}

/// Scheduling order: priority descending with `None` last, then insertion order.
#[must_use]
pub fn schedule_order(a: &TaskRecord, b: &TaskRecord) -> Ordering {
    let by_priority = match (a.priority, b.priority) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_priority.then(a.seq.cmp(&b.seq))
}

/// Input for inserting a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    /// Kind of work.
    #[serde(rename = "type")]
    pub kind: String,
    /// Caller-chosen key; replaced when absent or already taken.
    #[serde(default)]
    pub key: Option<TaskKey>,
    /// Priority, higher first.
    #[serde(default)]
    pub priority: Option<i32>,
    /// Desired worker count; the zone default applies when absent.
    #[serde(default)]
    pub need: Option<u32>,
    /// Specialization tag.
    #[serde(default)]
    pub require: Option<Tag>,
    /// Opaque caller data.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl NewTask {
    /// Start a task of the given kind with no priority and default need.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Set the priority.
    #[must_use]
    pub const fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the desired worker count.
    #[must_use]
    pub const fn need(mut self, need: u32) -> Self {
        self.need = Some(need);
        self
    }

    /// Require a specialization tag.
    #[must_use]
    pub fn require(mut self, tag: impl Into<Tag>) -> Self {
        self.require = Some(tag.into());
        self
    }

    /// Request a specific key.
    #[must_use]
    pub const fn key(mut self, key: TaskKey) -> Self {
        self.key = Some(key);
        self
    }

    /// Attach caller data.
    #[must_use]
    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// Which tasks an update or removal applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSelector {
    /// The single task with this key.
    Key(TaskKey),
    /// Every task of this kind.
    Type(String),
}

impl From<TaskKey> for TaskSelector {
    fn from(key: TaskKey) -> Self {
        Self::Key(key)
    }
}

impl From<&str> for TaskSelector {
    fn from(kind: &str) -> Self {
        Self::Type(kind.to_owned())
    }
}

/// Partial update merged into existing records.
///
/// Located by `key` when set, otherwise by `kind`. Outer `None` leaves a
/// field untouched; `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    /// Target key.
    pub key: Option<TaskKey>,
    /// Target kind (fallback locator, and the kind used on upsert).
    pub kind: Option<String>,
    /// New priority.
    pub priority: Option<Option<i32>>,
    /// New desired worker count.
    pub need: Option<u32>,
    /// New specialization tag.
    pub require: Option<Option<Tag>>,
    /// New caller data.
    pub data: Option<serde_json::Value>,
}

impl TaskPatch {
    /// Patch the task with `key`.
    #[must_use]
    pub fn for_key(key: TaskKey) -> Self {
        Self {
            key: Some(key),
            ..Self::default()
        }
    }

    /// Patch every task of `kind`.
    pub fn for_type(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    /// Set the priority (`None` moves the task behind every prioritised one).
    #[must_use]
    pub const fn priority(mut self, priority: Option<i32>) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the desired worker count.
    #[must_use]
    pub const fn need(mut self, need: u32) -> Self {
        self.need = Some(need);
        self
    }

    /// Set or clear the specialization tag.
    #[must_use]
    pub fn require(mut self, tag: Option<Tag>) -> Self {
        self.require = Some(tag);
        self
    }

    /// Replace caller data.
    #[must_use]
    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Merge into `record`, reporting which scheduling inputs changed.
    pub fn merge_into(&self, record: &mut TaskRecord) -> PatchEffect {
        let mut effect = PatchEffect::default();
        if let Some(priority) = self.priority {
            effect.reordered = record.priority != priority;
            record.priority = priority;
        }
        if let Some(need) = self.need {
            effect.need_changed = record.need != need;
            record.need = need;
        }
        if let Some(require) = &self.require {
            effect.require_changed = record.require != *require;
            record.require.clone_from(require);
        }
        if let Some(data) = &self.data {
            record.data.clone_from(data);
        }
        effect
    }

    /// Convert into an insert, used when an upsert matches nothing.
    #[must_use]
    pub fn into_new_task(self) -> Option<NewTask> {
        Some(NewTask {
            kind: self.kind?,
            key: self.key,
            priority: self.priority.flatten(),
            need: self.need,
            require: self.require.flatten(),
            data: self.data.unwrap_or_default(),
        })
    }
}

/// Which scheduling inputs a patch changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchEffect {
    /// Priority changed; the record must be re-positioned.
    pub reordered: bool,
    /// Need changed.
    pub need_changed: bool,
    /// Require tag changed; occupant fits must be recomputed.
    pub require_changed: bool,
}

impl PatchEffect {
    /// True when a rebalancing pass is required.
    #[must_use]
    pub const fn needs_rebalance(self) -> bool {
        self.reordered || self.need_changed || self.require_changed
    }
}
