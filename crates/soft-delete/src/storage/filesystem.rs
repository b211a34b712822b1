use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::StorageError;

/// Move a file or directory from `src` to `dst`. Uses `rename` first (fast,
/// atomic on the same filesystem). Falls back to a recursive copy followed by
/// removal of the source when rename fails, which covers moves between
/// volumes (project share to a local quarantine disk, for instance).
pub fn move_path(src: &Path, dst: &Path) -> Result<(), StorageError> {
    // Fast path: atomic rename
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    let metadata = std::fs::symlink_metadata(src).map_err(|e| StorageError::MoveItem {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;

    // Slow path: copy then remove original
    if metadata.file_type().is_symlink() {
        copy_link(src, dst)?;
        std::fs::remove_file(src).map_err(|e| StorageError::MoveItem {
            from: src.to_path_buf(),
            to: dst.to_path_buf(),
            source: e,
        })?;
    } else if metadata.is_dir() {
        if let Err(e) = copy_tree(src, dst) {
            // Leave no half-copied tree behind; the source is still intact.
            let _ = std::fs::remove_dir_all(dst);
            return Err(e);
        }
        std::fs::remove_dir_all(src).map_err(|e| StorageError::MoveItem {
            from: src.to_path_buf(),
            to: dst.to_path_buf(),
            source: e,
        })?;
    } else {
        std::fs::copy(src, dst).map_err(|e| StorageError::MoveItem {
            from: src.to_path_buf(),
            to: dst.to_path_buf(),
            source: e,
        })?;
        std::fs::remove_file(src).map_err(|e| StorageError::MoveItem {
            from: src.to_path_buf(),
            to: dst.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

/// Recursively copies the directory `src` to `dst`. `dst` must not exist.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<(), StorageError> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| StorageError::Walk {
            path: src.to_path_buf(),
            source: e,
        })?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(relative);

        if entry.file_type().is_symlink() {
            copy_link(entry.path(), &target)?;
        } else if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| StorageError::CreateDirectory {
                path: target.clone(),
                source: e,
            })?;
        } else {
            std::fs::copy(entry.path(), &target).map_err(|e| StorageError::CopyItem {
                from: entry.path().to_path_buf(),
                to: target.clone(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Recreates the symlink `src` at `dst`, pointing at the same target.
fn copy_link(src: &Path, dst: &Path) -> Result<(), StorageError> {
    let copy_error = |e| StorageError::CopyItem {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    };
    let target = std::fs::read_link(src).map_err(copy_error)?;

    #[cfg(unix)]
    let result = std::os::unix::fs::symlink(&target, dst);
    #[cfg(windows)]
    let result = if src.is_dir() {
        std::os::windows::fs::symlink_dir(&target, dst)
    } else {
        std::os::windows::fs::symlink_file(&target, dst)
    };
    #[cfg(not(any(unix, windows)))]
    let result = std::fs::copy(src, dst).map(|_| ());

    result.map_err(copy_error)
}

/// Removes a file or a whole directory tree.
///
/// Returns `Ok(false)` when there was nothing at `path`.
pub fn remove_path(path: &Path) -> Result<bool, StorageError> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => {
            return Err(StorageError::RemoveItem {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    let result = if metadata.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };

    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StorageError::RemoveItem {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// True if anything (including a dangling symlink) occupies `path`.
pub fn path_occupied(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}

/// Direct children of `directory`, sorted by name.
pub fn list_children(directory: &Path) -> Result<Vec<PathBuf>, StorageError> {
    let read_error = |e| StorageError::ReadDirectory {
        path: directory.to_path_buf(),
        source: e,
    };

    let mut children = std::fs::read_dir(directory)
        .map_err(read_error)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<PathBuf>, io::Error>>()
        .map_err(read_error)?;
    children.sort();
    Ok(children)
}

/// Creates `path` and its parents if needed.
pub fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    if !path.is_dir() {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

/// Total size in bytes of every regular file under `path`.
pub fn directory_size(path: &Path) -> Result<u64, StorageError> {
    let mut total = 0u64;
    for entry in WalkDir::new(path) {
        let entry = entry.map_err(|e| StorageError::Walk {
            path: path.to_path_buf(),
            source: e,
        })?;
        if entry.file_type().is_file() {
            let metadata = entry.metadata().map_err(|e| StorageError::Walk {
                path: path.to_path_buf(),
                source: e,
            })?;
            total += metadata.len();
        }
    }
    Ok(total)
}

/// Human readable size for the settings page: `KB` below one megabyte,
/// `GB` from one gigabyte, `MB` otherwise, rounded to one decimal.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let value = bytes as f64;
    if value < MB {
        format!("{:.1} KB", value / KB)
    } else if value >= GB {
        format!("{:.1} GB", value / GB)
    } else {
        format!("{:.1} MB", value / MB)
    }
}
