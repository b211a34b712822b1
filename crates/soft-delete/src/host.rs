//! The surface a host application drives.
//!
//! The host resolves a browser selection into a [`DeletionRequest`], offers
//! the label from [`DeletePlugin::delete_action_label`] in its context menu
//! and forwards the user's choice. Confirmation dialogs and browser refreshes
//! go back through [`HostServices`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ConfigStore, PluginState};
use crate::engine::{PurgeTarget, QuarantineEngine, ResyncReport};
use crate::entity::DeletionRequest;
use crate::error::{ConfigError, PurgeError, RestoreError, Result};
use crate::record::{QuarantineRecord, RecordId};
use crate::scheduler::{AutoPurgeScheduler, DEFAULT_CHECK_INTERVAL};

/// Callbacks into the host application.
pub trait HostServices: Send + Sync {
    /// Asks the user a yes/no question.
    fn confirm(&self, question: &str, title: &str) -> bool;

    /// The project browser should refresh.
    fn notify_changed(&self);
}

pub struct DeletePlugin<H: HostServices> {
    host: H,
    store: Arc<ConfigStore>,
    engine: Arc<QuarantineEngine>,
    scheduler: AutoPurgeScheduler,
}

impl<H: HostServices> DeletePlugin<H> {
    /// Loads settings from `settings_path` and starts the auto-purge sweep
    /// when deleting is active and a retention window is set.
    pub fn activate<P: AsRef<Path>>(settings_path: P, host: H) -> Result<Self> {
        Self::activate_with_interval(settings_path, host, DEFAULT_CHECK_INTERVAL)
    }

    pub fn activate_with_interval<P: AsRef<Path>>(
        settings_path: P,
        host: H,
        check_interval: Duration,
    ) -> Result<Self> {
        let store = Arc::new(ConfigStore::open(settings_path)?);
        let engine = Arc::new(QuarantineEngine::new(Arc::clone(&store)));
        let scheduler = AutoPurgeScheduler::with_interval(Arc::clone(&engine), check_interval);

        let plugin = Self {
            host,
            store,
            engine,
            scheduler,
        };
        plugin.reconcile_scheduler()?;
        log::info!(
            "Soft delete plugin activated (settings {:?}, active: {})",
            plugin.store.path(),
            plugin.is_active()
        );
        Ok(plugin)
    }

    pub fn deactivate(&self) {
        self.scheduler.stop();
        log::info!("Soft delete plugin deactivated");
    }

    pub fn engine(&self) -> &Arc<QuarantineEngine> {
        &self.engine
    }

    pub fn scheduler(&self) -> &AutoPurgeScheduler {
        &self.scheduler
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn is_active(&self) -> bool {
        self.engine.is_active()
    }

    pub fn settings(&self) -> Result<PluginState> {
        Ok(self.store.snapshot()?)
    }

    /// Context-menu entry for `request`, or `None` while deleting is off.
    pub fn delete_action_label(&self, request: &DeletionRequest) -> Option<String> {
        self.is_active().then(|| request.action_label())
    }

    /// Quarantines `request` after the user confirms. `Ok(None)` when the
    /// plugin is inactive or the user declined.
    pub fn on_delete_requested(&self, request: &DeletionRequest) -> Result<Option<QuarantineRecord>> {
        if !self.is_active() {
            log::debug!("Delete requested while inactive, ignoring");
            return Ok(None);
        }

        let kind = request.kind_label();
        let question = format!("Are you sure you want to Delete:\n\n{}: {}", kind, request.subject());
        let title = format!("Delete {}", kind);
        if !self.host.confirm(&question, &title) {
            return Ok(None);
        }

        let record = self.engine.quarantine_request(request)?;
        self.host.notify_changed();
        Ok(Some(record))
    }

    pub fn on_restore_requested(&self, id: &RecordId) -> Result<Option<QuarantineRecord>> {
        let record = self
            .engine
            .find(id)?
            .ok_or_else(|| RestoreError::NotFound(id.clone()))?;

        let question = format!(
            "Are you sure you want to Restore:\n\n{}: {}",
            record.entity_type, record.display_name
        );
        if !self.host.confirm(&question, "Restore Item") {
            return Ok(None);
        }

        let restored = self.engine.restore(id)?;
        self.host.notify_changed();
        Ok(Some(restored))
    }

    pub fn on_undo_last_requested(&self) -> Result<Option<QuarantineRecord>> {
        let newest = self
            .engine
            .records()?
            .into_iter()
            .next()
            .ok_or(RestoreError::NothingToUndo)?;

        let question = format!(
            "Undo the last delete and restore:\n\n{}: {}",
            newest.entity_type, newest.display_name
        );
        if !self.host.confirm(&question, "Undo Last Delete") {
            return Ok(None);
        }

        let restored = self.engine.restore(&newest.id)?;
        self.host.notify_changed();
        Ok(Some(restored))
    }

    /// Permanently deletes `target` after the user confirms. Returns the
    /// number of records removed, or `None` when declined.
    pub fn on_purge_requested(&self, target: &PurgeTarget) -> Result<Option<usize>> {
        let question = match target {
            PurgeTarget::Record(id) => {
                let record = self
                    .engine
                    .find(id)?
                    .ok_or_else(|| PurgeError::NotFound(id.clone()))?;
                format!(
                    "Permanently delete {}: {}?\n\nThis cannot be undone.",
                    record.entity_type, record.display_name
                )
            }
            PurgeTarget::All => format!(
                "Permanently delete all {} quarantined item(s)?\n\nThis cannot be undone.",
                self.engine.records()?.len()
            ),
        };
        if !self.host.confirm(&question, "Purge Deleted Items") {
            return Ok(None);
        }

        match self.engine.purge(target) {
            Ok(purged) => {
                self.host.notify_changed();
                Ok(Some(purged))
            }
            Err(e @ PurgeError::Partial { .. }) => {
                self.host.notify_changed();
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn on_resync_requested(&self) -> Result<ResyncReport> {
        let report = self.engine.resync()?;
        if !report.dropped.is_empty() {
            self.host.notify_changed();
        }
        Ok(report)
    }

    pub fn set_delete_enabled(&self, enabled: bool) -> Result<()> {
        self.store.update(|state| {
            state.delete_enabled = enabled;
            Ok::<_, ConfigError>(())
        })?;
        log::info!("Deleting {}", if enabled { "enabled" } else { "disabled" });
        self.reconcile_scheduler()
    }

    pub fn set_quarantine_root<P: Into<PathBuf>>(&self, root: P) -> Result<()> {
        let root = root.into();
        log::info!("Quarantine directory set to {:?}", root);
        self.store.update(|state| {
            state.quarantine_root = root;
            Ok::<_, ConfigError>(())
        })?;
        self.reconcile_scheduler()
    }

    pub fn set_retention_hours(&self, hours: u32) -> Result<()> {
        self.store.update(|state| {
            state.retention_hours = hours;
            Ok::<_, ConfigError>(())
        })?;
        log::info!("Auto-purge retention set to {}h", hours);
        self.reconcile_scheduler()
    }

    pub fn records(&self) -> Result<Vec<QuarantineRecord>> {
        Ok(self.engine.records()?)
    }

    pub fn quarantine_size_label(&self) -> Result<String> {
        self.engine.quarantine_size_label()
    }

    /// Runs the sweep only while deleting is active and a retention window
    /// is set, restarting it when the window changed.
    fn reconcile_scheduler(&self) -> Result<()> {
        let state = self.store.snapshot()?;
        if state.is_active() && state.retention_hours > 0 {
            if self.scheduler.retention_hours() != Some(state.retention_hours) {
                self.scheduler.set_retention_hours(state.retention_hours);
            }
        } else {
            self.scheduler.stop();
        }
        Ok(())
    }
}
