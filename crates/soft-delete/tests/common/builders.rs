//! Deletion requests as the host would build them.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use soft_delete::entity::DEFAULT_LOCATION;
use soft_delete::{
    DeletionRequest, DepartmentDeletion, EntityOwner, LibraryItemDeletion, MediaDeletion,
    ProductDeletion, SceneFileDeletion, SourceItem, TaskDeletion,
};

pub const PROJECT: &str = "Demo";

pub fn shot(sequence: &str, shot: &str) -> EntityOwner {
    EntityOwner::Shot {
        sequence: sequence.to_string(),
        shot: shot.to_string(),
    }
}

pub fn asset(name: &str) -> EntityOwner {
    EntityOwner::Asset {
        asset: name.to_string(),
    }
}

pub fn scene_file(source_dir: &Path, version: &str, scene_filename: &str) -> DeletionRequest {
    DeletionRequest::SceneFile(SceneFileDeletion {
        project: PROJECT.to_string(),
        source_dir: source_dir.to_path_buf(),
        version: version.to_string(),
        scene_filename: scene_filename.to_string(),
        location_tag: "Scene Files".to_string(),
    })
}

pub fn department(owner: EntityOwner, label: &str, path: PathBuf) -> DeletionRequest {
    DeletionRequest::Department(DepartmentDeletion {
        project: PROJECT.to_string(),
        owner,
        department_label: label.to_string(),
        path,
        location_tag: DEFAULT_LOCATION.to_string(),
    })
}

pub fn task(owner: EntityOwner, department: &str, task: &str, path: PathBuf) -> DeletionRequest {
    DeletionRequest::Task(TaskDeletion {
        project: PROJECT.to_string(),
        owner,
        department: department.to_string(),
        task: task.to_string(),
        path,
        location_tag: DEFAULT_LOCATION.to_string(),
    })
}

pub fn product_version(product: &str, version: &str, locations: &[(&str, PathBuf)]) -> DeletionRequest {
    DeletionRequest::Product(ProductDeletion {
        project: PROJECT.to_string(),
        product: product.to_string(),
        version: Some(version.to_string()),
        locations: items(locations),
    })
}

pub fn media(identifier: &str, version: Option<&str>, locations: &[(&str, PathBuf)]) -> DeletionRequest {
    DeletionRequest::Media(MediaDeletion {
        project: PROJECT.to_string(),
        identifier: identifier.to_string(),
        version: version.map(str::to_string),
        locations: items(locations),
    })
}

pub fn library_item(path: PathBuf) -> DeletionRequest {
    DeletionRequest::LibraryItem(LibraryItemDeletion {
        project: PROJECT.to_string(),
        path,
        location_tag: DEFAULT_LOCATION.to_string(),
    })
}

fn items(locations: &[(&str, PathBuf)]) -> Vec<SourceItem> {
    locations
        .iter()
        .map(|(tag, path)| SourceItem::new(*tag, path.clone()))
        .collect()
}
