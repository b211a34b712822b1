use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::Path;

use chrono::Local;
use tracing::{error, info, info_span, warn};

use super::{roll_back, Move, QuarantineEngine};
use crate::entity::DeletionRequest;
use crate::error::{DeleteError, StorageError};
use crate::record::{deletion_timestamp, EntityType, OriginalLocation, QuarantineRecord, RecordId, SourceItem};
use crate::sanitize::{redact_path, sanitize_component};
use crate::storage::{filesystem, move_path, remove_path, Allocation, QuarantineDirectory};

impl QuarantineEngine {
    /// Moves `source_items` into a fresh directory under the quarantine root
    /// and records the deletion under the directory's final name.
    ///
    /// Nothing moves unless every source exists. If a move fails part way,
    /// the items already moved are put back and the allocated directory is
    /// removed; no record is written.
    pub fn quarantine(
        &self,
        entity_type: EntityType,
        display_name_hint: &str,
        source_items: &[SourceItem],
        project_name: &str,
    ) -> Result<QuarantineRecord, DeleteError> {
        let _span = info_span!("engine.quarantine", entity_type = %entity_type, name = %display_name_hint).entered();
        let _guard = self.lock_operations();

        let state = self.store.snapshot()?;
        if !state.has_quarantine_root() {
            return Err(DeleteError::NoQuarantineRoot);
        }
        let names = validate(display_name_hint, source_items)?;

        let directory = QuarantineDirectory::new(state.quarantine_root());
        let allocation = directory.allocate(display_name_hint)?;

        let mut moves = Vec::with_capacity(source_items.len());
        for (item, name) in source_items.iter().zip(&names) {
            match move_into(&directory, &allocation.path, item, name) {
                Ok(mv) => moves.push(mv),
                Err(e) => return Err(abandon(&allocation, &moves, e)),
            }
        }

        let now = Local::now().naive_local();
        let deleted_at = deletion_timestamp(now);
        let persisted = self.store.update(|state| {
            let id = RecordId::generate(now, state.records.iter().map(|r| &r.id));
            let record = QuarantineRecord {
                project_name: project_name.to_string(),
                entity_type: entity_type.clone(),
                display_name: allocation.name.clone(),
                deleted_at,
                id,
                original_locations: source_items.iter().map(OriginalLocation::from).collect(),
                quarantine_path: allocation.path.clone(),
            };
            state.records.push(record.clone());
            Ok::<_, DeleteError>(record)
        });

        match persisted {
            Ok(record) => {
                info!(
                    id = %record.id,
                    directory = %allocation.name,
                    items = moves.len(),
                    "Quarantined"
                );
                Ok(record)
            }
            Err(e) => {
                error!(error = %e, "Could not record deletion, putting items back");
                let stranded = roll_back(&moves);
                if stranded.is_empty() {
                    discard_allocation(&allocation);
                } else {
                    error!(count = stranded.len(), directory = ?allocation.path, "Items left in quarantine without a record");
                }
                Err(e)
            }
        }
    }

    /// Quarantines whatever `request` resolves to.
    pub fn quarantine_request(&self, request: &DeletionRequest) -> Result<QuarantineRecord, DeleteError> {
        let items = request.source_items()?;
        tracing::debug!(
            strategy = ?request.restore_strategy(),
            items = items.len(),
            "Resolved deletion request"
        );
        self.quarantine(
            request.entity_type(),
            &request.display_name(),
            &items,
            request.project(),
        )
    }
}

/// Checks every source before anything moves and returns each item's file name.
fn validate<'a>(display_name: &str, items: &'a [SourceItem]) -> Result<Vec<&'a OsStr>, DeleteError> {
    if items.is_empty() {
        return Err(DeleteError::NoItems(display_name.to_string()));
    }

    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(items.len());
    for item in items {
        let name = item
            .source_path
            .file_name()
            .ok_or_else(|| DeleteError::InvalidSource(item.source_path.clone()))?;
        if !filesystem::path_occupied(&item.source_path) {
            return Err(DeleteError::PathMissing(item.source_path.clone()));
        }

        let location = sanitize_component(&item.location_tag);
        if !seen.insert((location.clone(), name)) {
            return Err(DeleteError::DuplicateItem {
                location,
                name: name.to_string_lossy().into_owned(),
            });
        }
        names.push(name);
    }
    Ok(names)
}

fn move_into(
    directory: &QuarantineDirectory,
    destination: &Path,
    item: &SourceItem,
    name: &OsStr,
) -> Result<Move, StorageError> {
    let location_dir = directory.location_dir(destination, &item.location_tag)?;
    let target = location_dir.join(name);
    move_path(&item.source_path, &target)?;
    info!(item = %redact_path(&item.source_path), location = %item.location_tag, "Moved into quarantine");
    Ok(Move {
        from: item.source_path.clone(),
        to: target,
    })
}

fn abandon(allocation: &Allocation, moves: &[Move], cause: StorageError) -> DeleteError {
    error!(error = %cause, moved = moves.len(), "Quarantine move failed, rolling back");
    let stranded = roll_back(moves);
    if !stranded.is_empty() {
        return DeleteError::RollbackFailed {
            stranded,
            source: cause,
        };
    }
    discard_allocation(allocation);
    DeleteError::Storage(cause)
}

fn discard_allocation(allocation: &Allocation) {
    if let Err(e) = remove_path(&allocation.path) {
        warn!(error = %e, directory = ?allocation.path, "Could not remove abandoned quarantine directory");
    }
}
