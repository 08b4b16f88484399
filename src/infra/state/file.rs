//! File-backed state store.
//!
//! Each zone is one JSON document, `<dir>/<zone>.json`. Saves go to a
//! temporary sibling first and are renamed into place, so a crash mid-write
//! leaves the previous snapshot intact.

use std::fs::{self, create_dir_all};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::{SchedulerError, StateStore, ZoneSnapshot};

/// Directory of per-zone JSON snapshots.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    /// Open (and create if needed) a state directory.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, SchedulerError> {
        let dir = dir.as_ref().to_path_buf();
        create_dir_all(&dir).map_err(backend)?;
        Ok(Self { dir })
    }

    /// Directory holding the snapshots.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_path(&self, zone: &str) -> PathBuf {
        self.dir.join(format!("{zone}.json"))
    }
}

impl StateStore for FileStateStore {
    fn load(&mut self, zone: &str) -> Result<Option<ZoneSnapshot>, SchedulerError> {
        let raw = match fs::read_to_string(self.file_path(zone)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(backend(e)),
        };
        let snapshot = serde_json::from_str(&raw).map_err(backend)?;
        Ok(Some(snapshot))
    }

    fn save(&mut self, zone: &str, snapshot: &ZoneSnapshot) -> Result<(), SchedulerError> {
        let path = self.file_path(zone);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec(snapshot).map_err(backend)?;
        fs::write(&tmp, body).map_err(backend)?;
        fs::rename(&tmp, &path).map_err(backend)?;
        debug!(zone, path = %path.display(), tasks = snapshot.tasks.len(), "zone state saved");
        Ok(())
    }
}

fn backend(err: impl std::fmt::Display) -> SchedulerError {
    SchedulerError::Backend(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{NewTask, ZoneScheduler};
    use crate::config::ZoneConfig;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("room-dispatch-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_missing_file_loads_none() {
        let dir = scratch_dir();
        let mut store = FileStateStore::new(&dir).unwrap();
        assert!(store.load("W1N1").unwrap().is_none());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_round_trip_keeps_counters() {
        let dir = scratch_dir();
        let mut zone = ZoneScheduler::new("W1N1", ZoneConfig::default());
        let key = zone.add_task(NewTask::new("mine").require("miner").need(2));
        zone.get_assignment("m1", Some("miner"));
        zone.get_assignment("g1", None);

        let mut store = FileStateStore::new(&dir).unwrap();
        store.save("W1N1", &zone.snapshot()).unwrap();
        let loaded = store.load("W1N1").unwrap().unwrap();
        assert_eq!(loaded, zone.snapshot());
        let task = loaded.tasks.iter().find(|t| t.key == key).unwrap();
        assert_eq!((task.unit, task.require_unit), (2, 1));
        assert!(!dir.join("W1N1.json.tmp").exists());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_corrupt_file_is_backend_error() {
        let dir = scratch_dir();
        let mut store = FileStateStore::new(&dir).unwrap();
        fs::write(dir.join("W1N1.json"), b"{not json").unwrap();
        let err = store.load("W1N1").unwrap_err();
        assert!(matches!(err, SchedulerError::Backend(_)));
        let _ = fs::remove_dir_all(dir);
    }
}
