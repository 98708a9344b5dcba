//! In-memory filesystem used by tests and embedders that keep notes off disk.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Error, ErrorKind, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use super::{FileSystem, is_markdown};

#[derive(Debug, Default)]
struct Tree {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
}

impl Tree {
    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(dir) = parent {
            if dir.as_os_str().is_empty() || !self.dirs.insert(dir.to_path_buf()) {
                break;
            }
            parent = dir.parent();
        }
    }
}

/// A filesystem held entirely in memory.
///
/// Clones share the same underlying tree, so a test can keep one handle for
/// assertions while a store owns another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFileSystem {
    tree: Arc<RwLock<Tree>>,
}

impl InMemoryFileSystem {
    /// Create a new empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file (builder pattern).
    pub fn with_file(self, path: impl AsRef<Path>, content: &str) -> Self {
        self.insert(path.as_ref(), content);
        self
    }

    fn insert(&self, path: &Path, content: &str) {
        let mut tree = self.tree.write().unwrap();
        tree.add_parents(path);
        tree.files.insert(path.to_path_buf(), content.to_string());
    }

    /// Content of a file, for test assertions.
    pub fn get_content(&self, path: impl AsRef<Path>) -> Option<String> {
        self.tree.read().unwrap().files.get(path.as_ref()).cloned()
    }
}

impl FileSystem for InMemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.get_content(path).ok_or_else(|| {
            Error::new(
                ErrorKind::NotFound,
                format!("File not found: {}", path.display()),
            )
        })
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        self.insert(path, content);
        Ok(())
    }

    fn list_md_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let tree = self.tree.read().unwrap();
        Ok(tree
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir) && is_markdown(p))
            .cloned()
            .collect())
    }

    fn exists(&self, path: &Path) -> bool {
        let tree = self.tree.read().unwrap();
        tree.files.contains_key(path) || tree.dirs.contains(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut tree = self.tree.write().unwrap();
        tree.dirs.insert(path.to_path_buf());
        tree.add_parents(path);
        Ok(())
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.tree.read().unwrap().dirs.contains(path)
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let tree = self.tree.read().unwrap();
        let files = tree.files.keys();
        let dirs = tree.dirs.iter();
        Ok(files
            .chain(dirs)
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_files() {
        let fs = InMemoryFileSystem::new();
        let other = fs.clone();
        fs.write_file(Path::new("vault/a.md"), "A").unwrap();
        assert_eq!(other.get_content("vault/a.md").as_deref(), Some("A"));
        assert!(other.is_dir(Path::new("vault")));
    }

    #[test]
    fn test_recursive_listing() {
        let fs = InMemoryFileSystem::new()
            .with_file("vault/a.md", "")
            .with_file("vault/image.png", "")
            .with_file("vault/sub/deeper/b.md", "");

        let mut files = fs.list_md_files_recursive(Path::new("vault")).unwrap();
        files.sort();
        assert_eq!(
            files,
            vec![
                PathBuf::from("vault/a.md"),
                PathBuf::from("vault/sub/deeper/b.md")
            ]
        );
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let fs = InMemoryFileSystem::new();
        let err = fs.read_to_string(Path::new("nope.md")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
