use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::sanitize::sanitize_component;

use super::filesystem;

/// Upper bound on `_N` suffixes tried before giving up on a name.
const MAX_SUFFIX: u32 = 10_000;

/// A freshly created, empty quarantine directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub path: PathBuf,
    pub name: String,
}

/// Hands out collision-free destination directories under the quarantine
/// root.
#[derive(Debug, Clone)]
pub struct QuarantineDirectory {
    root: PathBuf,
}

impl QuarantineDirectory {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates `root/desired_name`, or the first free `desired_name_N`
    /// (N = 1, 2, ...) when it is taken.
    ///
    /// Each candidate is created with `create_dir`, which fails if the
    /// directory already exists, so an existing directory is never reused.
    /// A desired name that already ends in `_N` is suffixed again rather than
    /// renumbered.
    pub fn allocate(&self, desired_name: &str) -> Result<Allocation, StorageError> {
        let base = sanitize_component(desired_name);

        for counter in 0..=MAX_SUFFIX {
            let name = if counter == 0 {
                base.clone()
            } else {
                format!("{}_{}", base, counter)
            };
            let path = self.root.join(&name);

            match std::fs::create_dir(&path) {
                Ok(()) => return Ok(Allocation { path, name }),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(StorageError::CreateDirectory { path, source: e }),
            }
        }

        Err(StorageError::NamesExhausted {
            root: self.root.clone(),
            name: base,
        })
    }

    /// Ensures the per-location subdirectory of an allocated directory.
    pub fn location_dir(
        &self,
        quarantine_path: &Path,
        location_tag: &str,
    ) -> Result<PathBuf, StorageError> {
        let dir = quarantine_path.join(sanitize_component(location_tag));
        filesystem::ensure_directory(&dir)?;
        Ok(dir)
    }

    /// Total bytes held in quarantine.
    pub fn size(&self) -> Result<u64, StorageError> {
        filesystem::directory_size(&self.root)
    }

    /// Entries directly under the root.
    pub fn entries(&self) -> Result<Vec<PathBuf>, StorageError> {
        filesystem::list_children(&self.root)
    }
}

/// Free-function form of [`QuarantineDirectory::allocate`].
pub fn allocate(root: &Path, desired_name: &str) -> Result<(PathBuf, String), StorageError> {
    let allocation = QuarantineDirectory::new(root).allocate(desired_name)?;
    Ok((allocation.path, allocation.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_allocate_free_name_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let (path, name) = allocate(temp_dir.path(), "shot010_comp_v003").unwrap();

        assert_eq!(name, "shot010_comp_v003");
        assert_eq!(path, temp_dir.path().join("shot010_comp_v003"));
        assert!(path.is_dir());
    }

    #[test]
    fn test_allocate_numbering_sequence() {
        let temp_dir = TempDir::new().unwrap();
        let dir = QuarantineDirectory::new(temp_dir.path());

        let names: Vec<String> = (0..4)
            .map(|_| dir.allocate("charGeo").unwrap().name)
            .collect();

        assert_eq!(names, vec!["charGeo", "charGeo_1", "charGeo_2", "charGeo_3"]);
        for name in &names {
            assert!(temp_dir.path().join(name).is_dir());
        }
    }

    #[test]
    fn test_allocate_fills_first_gap() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("task")).unwrap();
        std::fs::create_dir(temp_dir.path().join("task_2")).unwrap();

        let (_, name) = allocate(temp_dir.path(), "task").unwrap();

        assert_eq!(name, "task_1");
    }

    #[test]
    fn test_allocate_suffixes_numeric_names_further() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("comp_v003_1")).unwrap();

        let (_, name) = allocate(temp_dir.path(), "comp_v003_1").unwrap();

        assert_eq!(name, "comp_v003_1_1");
        assert!(!temp_dir.path().join("comp_v003_2").exists());
    }

    #[test]
    fn test_allocate_skips_files_with_same_name() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("asset"), b"not a dir").unwrap();

        let (path, name) = allocate(temp_dir.path(), "asset").unwrap();

        assert_eq!(name, "asset_1");
        assert!(path.is_dir());
        assert_eq!(std::fs::read(temp_dir.path().join("asset")).unwrap(), b"not a dir");
    }

    #[test]
    fn test_allocate_sanitizes_name() {
        let temp_dir = TempDir::new().unwrap();
        let (path, name) = allocate(temp_dir.path(), "sq01/sh010").unwrap();

        assert_eq!(name, "sq01_sh010");
        assert_eq!(path.parent().unwrap(), temp_dir.path());
    }

    #[test]
    fn test_allocate_missing_root_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = allocate(&temp_dir.path().join("missing"), "x");

        assert!(matches!(result, Err(StorageError::CreateDirectory { .. })));
    }

    #[test]
    fn test_location_dir_is_created_once() {
        let temp_dir = TempDir::new().unwrap();
        let dir = QuarantineDirectory::new(temp_dir.path());
        let allocation = dir.allocate("v0001").unwrap();

        let first = dir.location_dir(&allocation.path, "global").unwrap();
        std::fs::write(first.join("a.abc"), b"a").unwrap();
        let second = dir.location_dir(&allocation.path, "global").unwrap();

        assert_eq!(first, second);
        assert!(second.join("a.abc").exists());
    }
}
