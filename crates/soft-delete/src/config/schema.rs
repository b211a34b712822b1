use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::record::{QuarantineRecord, RecordId};

/// Everything the plugin persists: settings plus the live quarantine list.
///
/// Key names match the settings file written by earlier plugin releases, so
/// an existing `DeleteFunctions_Config.json` keeps working.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginState {
    #[serde(rename = "Delete Active", default)]
    pub delete_enabled: bool,
    /// Hours a record is kept before the sweep purges it. 0 disables the sweep.
    #[serde(rename = "UpdateInterval", default)]
    pub retention_hours: u32,
    #[serde(
        rename = "Delete Directory",
        default,
        deserialize_with = "nullable_path"
    )]
    pub quarantine_root: PathBuf,
    #[serde(rename = "Items", default)]
    pub records: Vec<QuarantineRecord>,
}

// Older releases wrote `null` before a directory was picked.
fn nullable_path<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PathBuf, D::Error> {
    Ok(Option::<PathBuf>::deserialize(deserializer)?.unwrap_or_default())
}

impl PluginState {
    /// True iff deleting is enabled and the quarantine root exists on disk.
    pub fn is_active(&self) -> bool {
        self.delete_enabled && self.has_quarantine_root() && self.quarantine_root.is_dir()
    }

    pub fn has_quarantine_root(&self) -> bool {
        !self.quarantine_root.as_os_str().is_empty()
    }

    pub fn quarantine_root(&self) -> &Path {
        &self.quarantine_root
    }

    pub fn find(&self, id: &RecordId) -> Option<&QuarantineRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// Removes and returns the record with `id`.
    pub fn take(&mut self, id: &RecordId) -> Option<QuarantineRecord> {
        let index = self.records.iter().position(|r| &r.id == id)?;
        Some(self.records.remove(index))
    }

    /// Records newest first, the order the settings table shows them in.
    pub fn records_newest_first(&self) -> Vec<QuarantineRecord> {
        let mut records = self.records.clone();
        records.sort_by(|a, b| {
            b.deleted_at
                .cmp(&a.deleted_at)
                .then_with(|| b.id.as_str().len().cmp(&a.id.as_str().len()))
                .then_with(|| b.id.cmp(&a.id))
        });
        records
    }
}
