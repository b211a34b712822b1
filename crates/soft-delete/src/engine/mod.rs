//! The delete / restore / purge lifecycle.
//!
//! Every record moves Live -> Restored or Live -> Purged, never back. All
//! operations are synchronous; an engine-wide operation lock serialises them
//! so a sweep on the scheduler thread cannot interleave with a restore
//! triggered from the UI.

mod purge;
mod quarantine;
mod restore;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::config::{ConfigStore, PluginState};
use crate::error::{ConfigError, Result, StorageError};
use crate::record::{QuarantineRecord, RecordId};
use crate::storage::{filesystem, format_size, move_path, QuarantineDirectory};

pub use purge::{PurgeTarget, SweepReport};

/// Outcome of reconciling the record list with the quarantine directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResyncReport {
    /// Records dropped because their quarantine directory was gone.
    pub dropped: Vec<QuarantineRecord>,
    /// Entries under the quarantine root that no record points at.
    pub orphans: Vec<PathBuf>,
}

pub struct QuarantineEngine {
    store: Arc<ConfigStore>,
    operation_lock: Mutex<()>,
}

impl QuarantineEngine {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self {
            store,
            operation_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// True iff deleting is enabled and the quarantine root exists.
    pub fn is_active(&self) -> bool {
        self.store
            .snapshot()
            .map(|state| state.is_active())
            .unwrap_or(false)
    }

    /// Live records, newest first.
    pub fn records(&self) -> std::result::Result<Vec<QuarantineRecord>, ConfigError> {
        Ok(self.store.snapshot()?.records_newest_first())
    }

    pub fn find(&self, id: &RecordId) -> std::result::Result<Option<QuarantineRecord>, ConfigError> {
        Ok(self.store.snapshot()?.find(id).cloned())
    }

    /// Bytes currently held under the quarantine root.
    pub fn quarantine_size(&self) -> Result<u64> {
        let state = self.store.snapshot()?;
        if !state.quarantine_root().is_dir() {
            return Ok(0);
        }
        Ok(QuarantineDirectory::new(state.quarantine_root()).size()?)
    }

    /// Size as shown on the settings page, e.g. `1.5 GB`.
    pub fn quarantine_size_label(&self) -> Result<String> {
        Ok(format_size(self.quarantine_size()?))
    }

    /// Drops records whose quarantine directory has disappeared and reports
    /// directories under the root that no record references. Orphans are
    /// left in place; `purge(All)` clears them.
    pub fn resync(&self) -> Result<ResyncReport> {
        let _guard = self.lock_operations();

        let dropped = self.store.update(|state: &mut PluginState| {
            let (kept, dropped): (Vec<_>, Vec<_>) = state
                .records
                .drain(..)
                .partition(|r| filesystem::path_occupied(&r.quarantine_path));
            state.records = kept;
            Ok::<_, ConfigError>(dropped)
        })?;
        for record in &dropped {
            warn!(id = %record.id, name = %record.display_name, "Dropping record without quarantine directory");
        }

        let state = self.store.snapshot()?;
        let orphans = if state.quarantine_root().is_dir() {
            QuarantineDirectory::new(state.quarantine_root())
                .entries()?
                .into_iter()
                .filter(|entry| !state.records.iter().any(|r| &r.quarantine_path == entry))
                .collect()
        } else {
            Vec::new()
        };

        info!(dropped = dropped.len(), orphans = orphans.len(), "Quarantine list resynced");
        Ok(ResyncReport { dropped, orphans })
    }

    fn lock_operations(&self) -> MutexGuard<'_, ()> {
        // The guard protects no data, so a panic elsewhere leaves nothing to repair.
        self.operation_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// A completed move, undone by moving `to` back to `from`.
#[derive(Debug, Clone)]
struct Move {
    from: PathBuf,
    to: PathBuf,
}

/// Undoes `moves` newest first. Returns the paths that could not be put back.
fn roll_back(moves: &[Move]) -> Vec<PathBuf> {
    let mut stranded = Vec::new();
    for mv in moves.iter().rev() {
        if let Err(e) = move_back(mv) {
            tracing::error!(path = ?mv.to, error = %e, "Rollback failed");
            stranded.push(mv.to.clone());
        }
    }
    stranded
}

fn move_back(mv: &Move) -> std::result::Result<(), StorageError> {
    if let Some(parent) = mv.from.parent() {
        filesystem::ensure_directory(parent)?;
    }
    move_path(&mv.to, &mv.from)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::QuarantineEngine;
    use crate::config::ConfigStore;
    use crate::error::ConfigError;

    /// Engine over a temp project tree and an active quarantine root.
    pub struct Fixture {
        pub temp_dir: TempDir,
        pub engine: QuarantineEngine,
    }

    impl Fixture {
        pub fn new() -> Self {
            let temp_dir = TempDir::new().unwrap();
            let trash = temp_dir.path().join("trash");
            std::fs::create_dir_all(&trash).unwrap();
            std::fs::create_dir_all(temp_dir.path().join("project")).unwrap();

            let store = ConfigStore::open(temp_dir.path().join("settings.json")).unwrap();
            store
                .update(|state| {
                    state.delete_enabled = true;
                    state.quarantine_root = trash.clone();
                    Ok::<_, ConfigError>(())
                })
                .unwrap();

            Self {
                engine: QuarantineEngine::new(Arc::new(store)),
                temp_dir,
            }
        }

        pub fn trash(&self) -> PathBuf {
            self.temp_dir.path().join("trash")
        }

        pub fn project(&self) -> PathBuf {
            self.temp_dir.path().join("project")
        }

        pub fn write(&self, relative: &str, content: &[u8]) -> PathBuf {
            let path = self.project().join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, content).unwrap();
            path
        }

        pub fn persisted_ids(&self) -> Vec<String> {
            crate::config::load_state(self.engine.store().path())
                .unwrap()
                .records
                .iter()
                .map(|r| r.id.to_string())
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::Fixture;
    use super::*;
    use crate::record::{EntityType, SourceItem};

    #[test]
    fn test_is_active_follows_settings() {
        let fixture = Fixture::new();
        assert!(fixture.engine.is_active());

        std::fs::remove_dir_all(fixture.trash()).unwrap();
        assert!(!fixture.engine.is_active());
    }

    #[test]
    fn test_records_sorted_newest_first() {
        let fixture = Fixture::new();
        let a = fixture.write("a.txt", b"a");
        let b = fixture.write("b.txt", b"b");

        let first = fixture
            .engine
            .quarantine(EntityType::LibraryItem, "a", &[SourceItem::new("global", a)], "Demo")
            .unwrap();
        let second = fixture
            .engine
            .quarantine(EntityType::LibraryItem, "b", &[SourceItem::new("global", b)], "Demo")
            .unwrap();

        let ids: Vec<RecordId> = fixture.engine.records().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn test_resync_drops_missing_and_reports_orphans() {
        let fixture = Fixture::new();
        let kept = fixture.write("kept.txt", b"k");
        let lost = fixture.write("lost.txt", b"l");

        let kept = fixture
            .engine
            .quarantine(EntityType::LibraryItem, "kept", &[SourceItem::new("global", kept)], "Demo")
            .unwrap();
        let lost = fixture
            .engine
            .quarantine(EntityType::LibraryItem, "lost", &[SourceItem::new("global", lost)], "Demo")
            .unwrap();
        std::fs::remove_dir_all(&lost.quarantine_path).unwrap();
        std::fs::create_dir(fixture.trash().join("stray")).unwrap();

        let report = fixture.engine.resync().unwrap();

        assert_eq!(report.dropped.len(), 1);
        assert_eq!(report.dropped[0].id, lost.id);
        assert_eq!(report.orphans, vec![fixture.trash().join("stray")]);
        assert_eq!(fixture.persisted_ids(), vec![kept.id.to_string()]);
    }

    #[test]
    fn test_quarantine_size_label() {
        let fixture = Fixture::new();
        let file = fixture.write("big.bin", &vec![0u8; 2048]);
        fixture
            .engine
            .quarantine(EntityType::LibraryItem, "big", &[SourceItem::new("global", file)], "Demo")
            .unwrap();

        assert_eq!(fixture.engine.quarantine_size().unwrap(), 2048);
        assert_eq!(fixture.engine.quarantine_size_label().unwrap(), "2.0 KB");
    }

    #[test]
    fn test_roll_back_reports_stranded_paths() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let moved = temp_dir.path().join("moved");
        std::fs::write(&moved, b"x").unwrap();
        let moves = vec![
            Move {
                from: temp_dir.path().join("origin/file"),
                to: moved.clone(),
            },
            Move {
                from: temp_dir.path().join("other"),
                to: temp_dir.path().join("never-existed"),
            },
        ];

        let stranded = roll_back(&moves);

        assert_eq!(stranded, vec![temp_dir.path().join("never-existed")]);
        assert!(temp_dir.path().join("origin/file").exists());
    }
}
