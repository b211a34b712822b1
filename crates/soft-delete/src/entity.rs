//! Typed deletion requests, one per kind of browser entity.
//!
//! The host resolves a right-clicked item into one of these; each variant
//! knows its display name, the label shown in the context menu and the
//! filesystem items that make it up.

use std::path::{Path, PathBuf};

use crate::error::{DeleteError, StorageError};
use crate::record::{EntityType, RestoreStrategy, SourceItem};
use crate::storage::filesystem;

/// Location tag used for items that only ever live in one place.
pub const DEFAULT_LOCATION: &str = "global";

/// What a department or task belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityOwner {
    Shot { sequence: String, shot: String },
    Asset { asset: String },
}

impl EntityOwner {
    fn prefix(&self) -> String {
        match self {
            Self::Shot { sequence, shot } => format!("{}_{}", sequence, shot),
            Self::Asset { asset } => asset.clone(),
        }
    }
}

/// One version of a scene file: every file in `source_dir` whose name
/// contains `version` (the scene itself plus its sidecar files).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneFileDeletion {
    pub project: String,
    pub source_dir: PathBuf,
    pub version: String,
    pub scene_filename: String,
    pub location_tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentDeletion {
    pub project: String,
    pub owner: EntityOwner,
    /// Label shown in the browser, e.g. `Lighting (lgt)`.
    pub department_label: String,
    pub path: PathBuf,
    pub location_tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDeletion {
    pub project: String,
    pub owner: EntityOwner,
    pub department: String,
    pub task: String,
    pub path: PathBuf,
    pub location_tag: String,
}

/// A whole product, or one of its versions when `version` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDeletion {
    pub project: String,
    pub product: String,
    pub version: Option<String>,
    pub locations: Vec<SourceItem>,
}

/// A media identifier, or one of its versions when `version` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDeletion {
    pub project: String,
    pub identifier: String,
    pub version: Option<String>,
    pub locations: Vec<SourceItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryItemDeletion {
    pub project: String,
    pub path: PathBuf,
    pub location_tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionRequest {
    SceneFile(SceneFileDeletion),
    Department(DepartmentDeletion),
    Task(TaskDeletion),
    Product(ProductDeletion),
    Media(MediaDeletion),
    LibraryItem(LibraryItemDeletion),
}

impl DeletionRequest {
    pub fn project(&self) -> &str {
        match self {
            Self::SceneFile(d) => &d.project,
            Self::Department(d) => &d.project,
            Self::Task(d) => &d.project,
            Self::Product(d) => &d.project,
            Self::Media(d) => &d.project,
            Self::LibraryItem(d) => &d.project,
        }
    }

    pub fn entity_type(&self) -> EntityType {
        match self {
            Self::SceneFile(_) => EntityType::SceneFiles,
            Self::Department(d) => match d.owner {
                EntityOwner::Shot { .. } => EntityType::ShotDepartment,
                EntityOwner::Asset { .. } => EntityType::AssetDepartment,
            },
            Self::Task(d) => match d.owner {
                EntityOwner::Shot { .. } => EntityType::ShotTask,
                EntityOwner::Asset { .. } => EntityType::AssetTask,
            },
            Self::Product(d) if d.version.is_some() => EntityType::ProductVersion,
            Self::Product(_) => EntityType::Product,
            Self::Media(d) if d.version.is_some() => EntityType::MediaVersion,
            Self::Media(_) => EntityType::Media,
            Self::LibraryItem(_) => EntityType::LibraryItem,
        }
    }

    pub fn restore_strategy(&self) -> RestoreStrategy {
        self.entity_type().restore_strategy()
    }

    /// Name of the quarantine entry before collision suffixes.
    pub fn display_name(&self) -> String {
        match self {
            Self::SceneFile(d) => d.scene_filename.clone(),
            Self::Department(d) => format!("{}_{}", d.owner.prefix(), d.department_label),
            Self::Task(d) => format!("{}_{}_{}", d.owner.prefix(), d.department, d.task),
            Self::Product(d) => versioned(&d.product, d.version.as_deref()),
            Self::Media(d) => versioned(&d.identifier, d.version.as_deref()),
            Self::LibraryItem(d) => file_name_or(&d.path, "item"),
        }
    }

    /// Word used in the confirmation question, e.g. `Task`.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::SceneFile(_) => "Version",
            Self::Department(_) => "Department",
            Self::Task(_) => "Task",
            Self::Product(d) if d.version.is_some() => "Version",
            Self::Product(_) => "Product",
            Self::Media(d) if d.version.is_some() => "Version",
            Self::Media(_) => "Media",
            Self::LibraryItem(_) => "Library Item",
        }
    }

    /// The thing being deleted, as the user knows it.
    pub fn subject(&self) -> String {
        match self {
            Self::SceneFile(d) => d.version.clone(),
            Self::Department(d) => d.department_label.clone(),
            Self::Task(d) => d.task.clone(),
            Self::Product(d) => d.version.clone().unwrap_or_else(|| d.product.clone()),
            Self::Media(d) => d.version.clone().unwrap_or_else(|| d.identifier.clone()),
            Self::LibraryItem(d) => file_name_or(&d.path, "item"),
        }
    }

    /// Context-menu entry offered for this entity.
    pub fn action_label(&self) -> String {
        match self {
            Self::SceneFile(_) => "Delete Version".to_string(),
            Self::Department(d) => format!("Delete Dept: {}", d.department_label),
            Self::Task(d) => format!("Delete Task: {}", d.task),
            Self::Product(d) if d.version.is_none() => format!("Delete {}", d.product),
            Self::Media(d) if d.version.is_none() => format!("Delete {}", d.identifier),
            Self::Product(_) | Self::Media(_) => "Delete Version".to_string(),
            Self::LibraryItem(_) => "Delete Library Item".to_string(),
        }
    }

    /// Filesystem items to move into quarantine.
    pub fn source_items(&self) -> Result<Vec<SourceItem>, DeleteError> {
        let items = match self {
            Self::SceneFile(d) => scene_file_items(&d.source_dir, &d.version, &d.location_tag)?,
            Self::Department(d) => vec![SourceItem::new(d.location_tag.as_str(), d.path.clone())],
            Self::Task(d) => vec![SourceItem::new(d.location_tag.as_str(), d.path.clone())],
            Self::Product(d) => d.locations.clone(),
            Self::Media(d) => d.locations.clone(),
            Self::LibraryItem(d) => vec![SourceItem::new(d.location_tag.as_str(), d.path.clone())],
        };

        if items.is_empty() {
            return Err(DeleteError::NoItems(self.display_name()));
        }
        Ok(items)
    }
}

fn versioned(name: &str, version: Option<&str>) -> String {
    match version {
        Some(version) => format!("{}_{}", name, version),
        None => name.to_string(),
    }
}

fn file_name_or(path: &Path, fallback: &str) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| fallback.to_string())
}

/// Every entry of `source_dir` whose name contains `version`, sorted by name.
///
/// A blank version matches nothing.
pub fn scene_file_items(
    source_dir: &Path,
    version: &str,
    location_tag: &str,
) -> Result<Vec<SourceItem>, StorageError> {
    if version.trim().is_empty() {
        return Ok(Vec::new());
    }
    let items = filesystem::list_children(source_dir)?
        .into_iter()
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().contains(version))
                .unwrap_or(false)
        })
        .map(|path| SourceItem::new(location_tag, path))
        .collect();
    Ok(items)
}
