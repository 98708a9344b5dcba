//! Filesystem abstraction module.
//!
//! This module provides the `FileSystem` trait used by the note store and the
//! configuration loader, so both can run against the real disk or an
//! in-memory tree in tests.
//!
//! - [`RealFileSystem`]: maps straight onto `std::fs`
//! - [`InMemoryFileSystem`]: a shared in-memory tree, cheap to clone
//!
//! Change notifications are delivered as [`NoteEvent`]s through a
//! [`CallbackRegistry`].

mod callback_registry;
mod events;
mod memory;
mod native;

pub use callback_registry::{CallbackRegistry, EventCallback, SubscriptionId};
pub use events::NoteEvent;
pub use memory::InMemoryFileSystem;
pub use native::RealFileSystem;

use std::io::Result;
use std::path::{Path, PathBuf};

/// Abstraction over filesystem operations
/// Allows for different implementations: real filesystem, in-memory for tests.
/// Send + Sync required so a store can be shared with a watcher thread.
pub trait FileSystem: Send + Sync {
    /// Reads the file content
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Writes the file, creating it if needed
    fn write_file(&self, path: &Path, content: &str) -> Result<()>;

    /// Finds markdown files directly inside a folder
    fn list_md_files(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Checks if a file exists
    fn exists(&self, path: &Path) -> bool;

    /// Creates a directory and all parent directories
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Checks if a path is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// List all entries in a directory (not recursive)
    fn list_files(&self, _dir: &Path) -> Result<Vec<PathBuf>> {
        Ok(vec![])
    }

    /// Recursively list all markdown files in a directory and its subdirectories
    fn list_md_files_recursive(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut all_files = self.list_md_files(dir)?;

        // Get subdirectories and recurse
        if let Ok(entries) = self.list_files(dir) {
            for entry in entries {
                if self.is_dir(&entry)
                    && let Ok(subdir_files) = self.list_md_files_recursive(&entry)
                {
                    all_files.extend(subdir_files);
                }
            }
        }

        Ok(all_files)
    }
}

// Blanket implementation for references to FileSystem
impl<T: FileSystem> FileSystem for &T {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        (*self).read_to_string(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        (*self).write_file(path, content)
    }

    fn list_md_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        (*self).list_md_files(dir)
    }

    fn exists(&self, path: &Path) -> bool {
        (*self).exists(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        (*self).create_dir_all(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        (*self).is_dir(path)
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        (*self).list_files(dir)
    }
}

/// Whether `path` has a `.md` extension.
pub fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "md")
}
