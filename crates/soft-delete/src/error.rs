use std::path::PathBuf;
use thiserror::Error;

use crate::record::RecordId;

#[derive(Error, Debug)]
pub enum SoftDeleteError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Delete failed: {0}")]
    Delete(#[from] DeleteError),

    #[error("Restore failed: {0}")]
    Restore(#[from] RestoreError),

    #[error("Purge failed: {0}")]
    Purge(#[from] PurgeError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write settings file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings JSON in '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Settings lock poisoned")]
    LockPoisoned,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read directory '{path}': {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move '{from}' to '{to}': {source}")]
    MoveItem {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy '{from}' to '{to}': {source}")]
    CopyItem {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove '{path}': {source}")]
    RemoveItem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory walk failed under '{path}': {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("No free quarantine directory name for '{name}' under '{root}'")]
    NamesExhausted { root: PathBuf, name: String },
}

#[derive(Error, Debug)]
pub enum DeleteError {
    #[error("Quarantine directory is not configured")]
    NoQuarantineRoot,

    #[error("Nothing to delete for '{0}'")]
    NoItems(String),

    #[error("Source item no longer exists: {0}")]
    PathMissing(PathBuf),

    #[error("Two items named '{name}' would share location '{location}'")]
    DuplicateItem { location: String, name: String },

    #[error("Source path has no file name: {0}")]
    InvalidSource(PathBuf),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Move failed and {} item(s) could not be put back: {source}", .stranded.len())]
    RollbackFailed {
        stranded: Vec<PathBuf>,
        #[source]
        source: StorageError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug)]
pub enum RestoreError {
    #[error("No quarantined item with id {0}")]
    NotFound(RecordId),

    #[error("Restore of {id} would overwrite {} existing item(s)", .paths.len())]
    Conflict { id: RecordId, paths: Vec<PathBuf> },

    #[error("Quarantined item is missing: {0}")]
    MissingQuarantinedItem(PathBuf),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug)]
pub enum PurgeError {
    #[error("No quarantined item with id {0}")]
    NotFound(RecordId),

    #[error("Quarantine directory is not configured")]
    NoQuarantineRoot,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Purged {purged} item(s), {} could not be removed", .failed.len())]
    Partial { purged: usize, failed: Vec<PathBuf> },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("A global tracing subscriber is already installed")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("A global log logger is already installed")]
    Logger(#[from] log::SetLoggerError),
}

pub type Result<T> = std::result::Result<T, SoftDeleteError>;
