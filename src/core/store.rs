//! Ordered task collection for a single zone.

use std::collections::HashMap;

use crate::core::task::{schedule_order, NewTask, TaskRecord};
use crate::util::ids::TaskKey;

/// Tasks of one zone, always sorted by [`schedule_order`].
///
/// Keys are resolved through a position index rebuilt on every structural
/// change, so lookups by key are O(1).
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Vec<TaskRecord>,
    index: HashMap<TaskKey, usize>,
    next_key: u64,
    next_seq: u64,
}

impl TaskStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted records.
    ///
    /// Records are re-sorted; a record whose key is already taken gets a
    /// fresh key. Counters are advanced past every key and sequence seen.
    #[must_use]
    pub fn from_records(mut records: Vec<TaskRecord>, next_key: u64, next_seq: u64) -> Self {
        records.sort_by(schedule_order);
        let mut store = Self {
            tasks: Vec::with_capacity(records.len()),
            index: HashMap::with_capacity(records.len()),
            next_key,
            next_seq,
        };
        for record in &records {
            store.next_key = store.next_key.max(record.key.get().saturating_add(1));
            store.next_seq = store.next_seq.max(record.seq.saturating_add(1));
        }
        for mut record in records {
            if store.index.contains_key(&record.key) {
                let fresh = store.fresh_key();
                tracing::warn!(duplicate = %record.key, replacement = %fresh, "duplicate key in snapshot");
                record.key = fresh;
            }
            store.index.insert(record.key, store.tasks.len());
            store.tasks.push(record);
        }
        store
    }

    /// Insert a task at its ordered position and return its key.
    ///
    /// `default_need` applies when the input carries no need.
    pub fn insert(&mut self, task: NewTask, default_need: u32) -> TaskKey {
        let key = match task.key {
            Some(key) if !self.index.contains_key(&key) => {
                self.next_key = self.next_key.max(key.get().saturating_add(1));
                key
            }
            Some(key) => {
                let fresh = self.fresh_key();
                tracing::warn!(requested = %key, assigned = %fresh, "duplicate task key replaced");
                fresh
            }
            None => self.fresh_key(),
        };
        let seq = self.next_seq;
        self.next_seq += 1;
        let record = TaskRecord {
            kind: task.kind,
            key,
            priority: task.priority,
            need: task.need.unwrap_or(default_need),
            unit: 0,
            require: task.require,
            require_unit: 0,
            seq,
            data: task.data,
        };
        let at = self.insertion_point(&record);
        self.tasks.insert(at, record);
        self.reindex();
        key
    }

    fn fresh_key(&mut self) -> TaskKey {
        while self.index.contains_key(&TaskKey(self.next_key)) {
            self.next_key += 1;
        }
        let key = TaskKey(self.next_key);
        self.next_key += 1;
        key
    }

    fn insertion_point(&self, record: &TaskRecord) -> usize {
        self.tasks
            .partition_point(|t| schedule_order(t, record).is_lt())
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (at, task) in self.tasks.iter().enumerate() {
            self.index.insert(task.key, at);
        }
    }

    /// Move a record whose priority changed back into order.
    pub fn reposition(&mut self, key: TaskKey) {
        let Some(at) = self.position(key) else {
            return;
        };
        let record = self.tasks.remove(at);
        let to = self.insertion_point(&record);
        self.tasks.insert(to, record);
        self.reindex();
    }

    /// Remove a task by key.
    pub fn remove_key(&mut self, key: TaskKey) -> Option<TaskRecord> {
        let at = self.position(key)?;
        let record = self.tasks.remove(at);
        self.reindex();
        Some(record)
    }

    /// Remove every task of `kind`.
    pub fn remove_type(&mut self, kind: &str) -> Vec<TaskRecord> {
        let (removed, kept) = std::mem::take(&mut self.tasks)
            .into_iter()
            .partition(|t| t.kind == kind);
        self.tasks = kept;
        self.reindex();
        removed
    }

    /// Position of `key` in scheduling order.
    #[must_use]
    pub fn position(&self, key: TaskKey) -> Option<usize> {
        self.index.get(&key).copied()
    }

    /// Look up a task by key.
    #[must_use]
    pub fn get(&self, key: TaskKey) -> Option<&TaskRecord> {
        self.position(key).map(|at| &self.tasks[at])
    }

    pub(crate) fn get_mut(&mut self, key: TaskKey) -> Option<&mut TaskRecord> {
        let at = self.position(key)?;
        self.tasks.get_mut(at)
    }

    /// Task at a scheduling position.
    #[must_use]
    pub fn at(&self, position: usize) -> Option<&TaskRecord> {
        self.tasks.get(position)
    }

    pub(crate) fn at_mut(&mut self, position: usize) -> Option<&mut TaskRecord> {
        self.tasks.get_mut(position)
    }

    /// True if any task of `kind` exists.
    #[must_use]
    pub fn has_type(&self, kind: &str) -> bool {
        self.tasks.iter().any(|t| t.kind == kind)
    }

    /// Keys of every task of `kind`, in scheduling order.
    #[must_use]
    pub fn keys_of_type(&self, kind: &str) -> Vec<TaskKey> {
        self.tasks
            .iter()
            .filter(|t| t.kind == kind)
            .map(|t| t.key)
            .collect()
    }

    /// Tasks in scheduling order.
    pub fn iter(&self) -> std::slice::Iter<'_, TaskRecord> {
        self.tasks.iter()
    }

    /// First position whose task satisfies `pred`.
    pub fn find(&self, pred: impl FnMut(&TaskRecord) -> bool) -> Option<usize> {
        self.tasks.iter().position(pred)
    }

    /// Number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True if the store holds no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Next key that would be handed out.
    #[must_use]
    pub const fn next_key(&self) -> u64 {
        self.next_key
    }

    /// Next insertion sequence.
    #[must_use]
    pub const fn next_seq(&self) -> u64 {
        self.next_seq
    }
}

impl<'a> IntoIterator for &'a TaskStore {
    type Item = &'a TaskRecord;
    type IntoIter = std::slice::Iter<'a, TaskRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
