//! Isolated environment for driving the engine end to end.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Duration;
use tempfile::TempDir;

use soft_delete::config::{load_state, ConfigStore, PluginState};
use soft_delete::{ConfigError, QuarantineEngine, RecordId};

pub struct TestHarness {
    temp_dir: TempDir,
    /// Shared project storage ("global" location).
    pub project_dir: PathBuf,
    /// Per-workstation storage ("local" location).
    pub local_dir: PathBuf,
    pub trash_dir: PathBuf,
    pub settings_path: PathBuf,
    pub store: Arc<ConfigStore>,
    pub engine: Arc<QuarantineEngine>,
}

impl TestHarness {
    /// Deleting enabled, quarantine root present, no retention window.
    pub fn new() -> Self {
        Self::with_retention(0)
    }

    pub fn with_retention(retention_hours: u32) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();

        let project_dir = base.join("projects/Demo");
        let local_dir = base.join("local/Demo");
        let trash_dir = base.join("trash");
        let settings_path = base.join("config/DeleteFunctions_Config.json");

        for dir in [&project_dir, &local_dir, &trash_dir] {
            std::fs::create_dir_all(dir).expect("Failed to create test dir");
        }

        let store = Arc::new(ConfigStore::open(&settings_path).expect("Failed to open settings"));
        store
            .update(|state| {
                state.delete_enabled = true;
                state.quarantine_root = trash_dir.clone();
                state.retention_hours = retention_hours;
                Ok::<_, ConfigError>(())
            })
            .expect("Failed to write settings");
        let engine = Arc::new(QuarantineEngine::new(Arc::clone(&store)));

        Self {
            temp_dir,
            project_dir,
            local_dir,
            trash_dir,
            settings_path,
            store,
            engine,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes a file under the project directory, creating parents.
    pub fn write_project(&self, relative: &str, content: &[u8]) -> PathBuf {
        write(&self.project_dir.join(relative), content)
    }

    pub fn write_local(&self, relative: &str, content: &[u8]) -> PathBuf {
        write(&self.local_dir.join(relative), content)
    }

    /// Moves a record's deletion time `hours` into the past.
    pub fn backdate(&self, id: &RecordId, hours: i64) {
        self.store
            .update(|state| {
                for record in state.records.iter_mut().filter(|r| &r.id == id) {
                    record.deleted_at = record.deleted_at - Duration::hours(hours);
                }
                Ok::<_, ConfigError>(())
            })
            .expect("Failed to backdate record");
    }

    /// State as currently on disk.
    pub fn persisted(&self) -> PluginState {
        load_state(&self.settings_path).expect("Failed to load settings")
    }

    pub fn trash_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.trash_dir)
            .expect("Failed to read trash dir")
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

fn write(path: &Path, content: &[u8]) -> PathBuf {
    std::fs::create_dir_all(path.parent().unwrap()).expect("Failed to create parent dir");
    std::fs::write(path, content).expect("Failed to write test file");
    path.to_path_buf()
}

/// Every file under `root`, relative, with contents, sorted.
pub fn snapshot_tree(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files = Vec::new();
    collect(root, root, &mut files);
    files.sort();
    files
}

fn collect(root: &Path, dir: &Path, files: &mut Vec<(PathBuf, Vec<u8>)>) {
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect(root, &path, files);
        } else {
            let relative = path.strip_prefix(root).unwrap().to_path_buf();
            files.push((relative, std::fs::read(&path).unwrap()));
        }
    }
}
