use tracing::{error, info, info_span, warn};

use super::{roll_back, Move, QuarantineEngine};
use crate::error::RestoreError;
use crate::record::{QuarantineRecord, RecordId};
use crate::sanitize::redact_path;
use crate::storage::{filesystem, move_path, remove_path};

impl QuarantineEngine {
    /// Moves a record's items back to their original paths and forgets it.
    ///
    /// Fails with `Conflict` before anything moves when any original path is
    /// already occupied; the record then stays in quarantine untouched.
    pub fn restore(&self, id: &RecordId) -> Result<QuarantineRecord, RestoreError> {
        let _guard = self.lock_operations();
        self.restore_unlocked(id)
    }

    /// Restores the most recently deleted record.
    pub fn undo_last(&self) -> Result<QuarantineRecord, RestoreError> {
        let _guard = self.lock_operations();
        let newest = self
            .store
            .snapshot()?
            .records_newest_first()
            .into_iter()
            .next()
            .ok_or(RestoreError::NothingToUndo)?;
        self.restore_unlocked(&newest.id)
    }

    fn restore_unlocked(&self, id: &RecordId) -> Result<QuarantineRecord, RestoreError> {
        let _span = info_span!("engine.restore", id = %id).entered();

        let record = self
            .store
            .snapshot()?
            .find(id)
            .cloned()
            .ok_or_else(|| RestoreError::NotFound(id.clone()))?;

        let plan = plan_restore(&record)?;

        let mut done = Vec::with_capacity(plan.len());
        for mv in plan {
            let result = mv
                .to
                .parent()
                .map_or(Ok(()), filesystem::ensure_directory)
                .and_then(|()| move_path(&mv.from, &mv.to));
            if let Err(e) = result {
                error!(error = %e, "Restore move failed, returning items to quarantine");
                let stranded = roll_back(&done);
                if !stranded.is_empty() {
                    error!(count = stranded.len(), "Restored items could not be returned to quarantine");
                }
                return Err(e.into());
            }
            info!(item = %redact_path(&mv.to), "Restored");
            done.push(mv);
        }

        let forgotten = self.store.update(|state| {
            state.take(id);
            Ok::<_, RestoreError>(())
        });
        if let Err(e) = forgotten {
            error!(error = %e, "Could not drop restored record, returning items to quarantine");
            let stranded = roll_back(&done);
            if !stranded.is_empty() {
                error!(count = stranded.len(), "Restored items could not be returned to quarantine");
            }
            return Err(e);
        }

        if let Err(e) = remove_path(&record.quarantine_path) {
            warn!(error = %e, "Could not remove emptied quarantine directory");
        }

        info!(name = %record.display_name, strategy = ?record.restore_strategy(), "Record restored");
        Ok(record)
    }
}

/// Every quarantined item paired with where it goes back to.
///
/// Checks the whole record first: every quarantined item must still be there
/// and no original path may be occupied.
fn plan_restore(record: &QuarantineRecord) -> Result<Vec<Move>, RestoreError> {
    let mut plan = Vec::with_capacity(record.original_locations.len());
    let mut conflicts = Vec::new();

    for location in &record.original_locations {
        let quarantined = record
            .quarantined_item_path(location)
            .filter(|path| filesystem::path_occupied(path))
            .ok_or_else(|| RestoreError::MissingQuarantinedItem(location.original_path.clone()))?;

        if filesystem::path_occupied(&location.original_path) {
            conflicts.push(location.original_path.clone());
        }
        plan.push(Move {
            from: quarantined,
            to: location.original_path.clone(),
        });
    }

    if !conflicts.is_empty() {
        warn!(count = conflicts.len(), "Restore would overwrite existing items");
        return Err(RestoreError::Conflict {
            id: record.id.clone(),
            paths: conflicts,
        });
    }
    Ok(plan)
}
