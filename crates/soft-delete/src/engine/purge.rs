use std::path::PathBuf;

use chrono::{Duration, NaiveDateTime};
use tracing::{error, info, info_span, warn};

use super::QuarantineEngine;
use crate::error::PurgeError;
use crate::record::RecordId;
use crate::storage::{filesystem, remove_path};

/// What a purge removes for good.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeTarget {
    Record(RecordId),
    /// Every entry under the quarantine root, including unreferenced ones.
    All,
}

/// Outcome of one retention sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub purged: Vec<RecordId>,
    /// Expired records whose directory could not be removed, with the reason.
    pub failed: Vec<(RecordId, String)>,
    /// Records still live after the sweep.
    pub retained: usize,
}

impl QuarantineEngine {
    /// Permanently deletes `target`. Returns the number of records removed.
    pub fn purge(&self, target: &PurgeTarget) -> Result<usize, PurgeError> {
        let _guard = self.lock_operations();
        match target {
            PurgeTarget::Record(id) => self.purge_record(id),
            PurgeTarget::All => self.purge_all(),
        }
    }

    fn purge_record(&self, id: &RecordId) -> Result<usize, PurgeError> {
        let _span = info_span!("engine.purge", id = %id).entered();

        let record = self
            .store
            .snapshot()?
            .find(id)
            .cloned()
            .ok_or_else(|| PurgeError::NotFound(id.clone()))?;

        // The record survives a failed removal so the purge can be retried.
        if !remove_path(&record.quarantine_path)? {
            warn!("Quarantine directory was already gone");
        }

        self.store.update(|state| {
            state.take(id);
            Ok::<_, PurgeError>(())
        })?;
        info!(name = %record.display_name, "Purged");
        Ok(1)
    }

    fn purge_all(&self) -> Result<usize, PurgeError> {
        let _span = info_span!("engine.purge_all").entered();

        let state = self.store.snapshot()?;
        if !state.has_quarantine_root() {
            return Err(PurgeError::NoQuarantineRoot);
        }
        let root = state.quarantine_root().to_path_buf();

        let mut targets = if root.is_dir() {
            filesystem::list_children(&root)?
        } else {
            Vec::new()
        };
        // Records left behind by an earlier root still own their directories.
        targets.extend(
            state
                .records
                .iter()
                .filter(|r| !r.is_under(&root))
                .map(|r| r.quarantine_path.clone()),
        );

        let mut failed: Vec<PathBuf> = Vec::new();
        for path in targets {
            if let Err(e) = remove_path(&path) {
                error!(error = %e, "Could not purge quarantine entry");
                failed.push(path);
            }
        }

        let purged = self.store.update(|state| {
            let before = state.records.len();
            state
                .records
                .retain(|r| failed.contains(&r.quarantine_path) && filesystem::path_occupied(&r.quarantine_path));
            Ok::<_, PurgeError>(before - state.records.len())
        })?;

        if failed.is_empty() {
            info!(purged, "Quarantine emptied");
            Ok(purged)
        } else {
            warn!(purged, failed = failed.len(), "Quarantine partly emptied");
            Err(PurgeError::Partial { purged, failed })
        }
    }

    /// Purges every record deleted strictly before `now - retention_hours`.
    ///
    /// A zero retention disables the sweep. Failures are reported per record
    /// and keep that record; the list is persisted once at the end.
    pub fn purge_expired(&self, retention_hours: u32, now: NaiveDateTime) -> Result<SweepReport, PurgeError> {
        if retention_hours == 0 {
            return Ok(SweepReport::default());
        }

        let _guard = self.lock_operations();
        let _span = info_span!("engine.purge_expired", retention_hours).entered();

        let retention = Duration::hours(i64::from(retention_hours));
        let state = self.store.snapshot()?;

        let mut report = SweepReport::default();
        for record in state.records.iter().filter(|r| r.is_expired(now, retention)) {
            match remove_path(&record.quarantine_path) {
                Ok(_) => {
                    info!(id = %record.id, name = %record.display_name, deleted = %record.deleted_label(), "Expired record purged");
                    report.purged.push(record.id.clone());
                }
                Err(e) => {
                    error!(id = %record.id, error = %e, "Could not purge expired record");
                    report.failed.push((record.id.clone(), e.to_string()));
                }
            }
        }

        report.retained = if report.purged.is_empty() {
            state.records.len()
        } else {
            self.store.update(|state| {
                state.records.retain(|r| !report.purged.contains(&r.id));
                Ok::<_, PurgeError>(state.records.len())
            })?
        };
        Ok(report)
    }
}
