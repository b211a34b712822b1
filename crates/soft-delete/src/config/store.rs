//! Durable single-file storage of [`PluginState`].

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::schema::PluginState;
use crate::error::ConfigError;

/// File name used by earlier plugin releases, kept for compatibility.
pub const SETTINGS_FILE_NAME: &str = "DeleteFunctions_Config.json";

/// Default settings location: `<config dir>/soft-delete/DeleteFunctions_Config.json`.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("soft-delete").join(SETTINGS_FILE_NAME))
}

/// Reads the state at `path`.
///
/// A missing file is created with defaults. A file that cannot be parsed is
/// replaced with defaults and a warning is logged; the caller never sees a
/// parse failure. Only failures to write the regenerated file are returned.
pub fn load_state<P: AsRef<Path>>(path: P) -> Result<PluginState, ConfigError> {
    let path = path.as_ref();

    match read_state(path) {
        Ok(state) => Ok(state),
        Err(ConfigError::ReadFile { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            log::info!("No settings file at {:?}, writing defaults", path);
            let state = PluginState::default();
            save_state(path, &state)?;
            Ok(state)
        }
        Err(e) => {
            log::warn!("Discarding unreadable settings file {:?}: {}", path, e);
            let state = PluginState::default();
            save_state(path, &state)?;
            Ok(state)
        }
    }
}

fn read_state(path: &Path) -> Result<PluginState, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    serde_json::from_str(&content).map_err(|e| ConfigError::ParseJson {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Writes `state` to `path`.
///
/// The JSON goes to a sibling temp file which is synced and then renamed over
/// the target, so a reader never sees a half-written file.
pub fn save_state<P: AsRef<Path>>(path: P, state: &PluginState) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let write_error = |e| ConfigError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }

    let json = serde_json::to_string_pretty(state).map_err(ConfigError::Serialize)?;

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let mut file = std::fs::File::create(&tmp_path).map_err(write_error)?;
    file.write_all(json.as_bytes()).map_err(write_error)?;
    file.write_all(b"\n").map_err(write_error)?;
    file.sync_all().map_err(write_error)?;
    drop(file);

    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        write_error(e)
    })
}

/// In-memory state backed by the settings file.
///
/// All mutations go through [`ConfigStore::update`], which holds one lock
/// across read, modify and write so concurrent callers (UI actions and the
/// purge sweep) cannot lose each other's changes.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    state: Mutex<PluginState>,
}

impl ConfigStore {
    /// Loads (or initialises) the settings file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let state = load_state(&path)?;
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> Result<PluginState, ConfigError> {
        let guard = self.state.lock().map_err(|_| ConfigError::LockPoisoned)?;
        Ok(guard.clone())
    }

    /// Read-modify-write of the full state.
    ///
    /// `f` works on a copy. The copy is saved and becomes the current state
    /// only when `f` returns `Ok` and the save succeeds; otherwise both the
    /// file and the in-memory state are left as they were.
    pub fn update<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut PluginState) -> Result<T, E>,
        E: From<ConfigError>,
    {
        let mut guard = self.state.lock().map_err(|_| ConfigError::LockPoisoned)?;
        let mut working = guard.clone();
        let value = f(&mut working)?;
        save_state(&self.path, &working)?;
        *guard = working;
        Ok(value)
    }

    /// Re-reads the file, replacing the in-memory state.
    pub fn reload(&self) -> Result<PluginState, ConfigError> {
        let mut guard = self.state.lock().map_err(|_| ConfigError::LockPoisoned)?;
        *guard = load_state(&self.path)?;
        Ok(guard.clone())
    }
}
