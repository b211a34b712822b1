pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod host;
pub mod logging;
pub mod record;
pub mod sanitize;
pub mod scheduler;
pub mod storage;

pub use config::{default_settings_path, ConfigStore, PluginState, SETTINGS_FILE_NAME};
pub use engine::{PurgeTarget, QuarantineEngine, ResyncReport, SweepReport};
pub use entity::{
    DeletionRequest, DepartmentDeletion, EntityOwner, LibraryItemDeletion, MediaDeletion,
    ProductDeletion, SceneFileDeletion, TaskDeletion,
};
pub use error::{
    ConfigError, DeleteError, LoggingError, PurgeError, RestoreError, Result, SoftDeleteError,
    StorageError,
};
pub use host::{DeletePlugin, HostServices};
pub use logging::{init_logging, LogFormat};
pub use record::{EntityType, OriginalLocation, QuarantineRecord, RecordId, RestoreStrategy, SourceItem};
pub use scheduler::{AutoPurgeScheduler, DEFAULT_CHECK_INTERVAL};
pub use storage::{format_size, QuarantineDirectory};
