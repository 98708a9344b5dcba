//! Native filesystem implementation.

use std::fs;
use std::io::Result;
use std::path::{Path, PathBuf};

use super::{FileSystem, is_markdown};

#[derive(Debug, Clone, Copy, Default)]
/// This is a simple filesystem implementation that simply maps to std::fs methods
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        fs::write(path, content)
    }

    fn list_md_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        if dir.is_dir() {
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                if path.is_file() && is_markdown(&path) {
                    files.push(path);
                }
            }
        }
        Ok(files)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        if dir.is_dir() {
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                // Hidden folders such as `.obsidian` or `.git` never hold notes.
                let hidden = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with('.'));
                if !hidden {
                    files.push(path);
                }
            }
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recursive_listing_skips_hidden_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::create_dir_all(root.join(".obsidian")).unwrap();
        fs::write(root.join("a.md"), "a").unwrap();
        fs::write(root.join("notes.txt"), "x").unwrap();
        fs::write(root.join("sub/b.md"), "b").unwrap();
        fs::write(root.join(".obsidian/c.md"), "c").unwrap();

        let mut files = RealFileSystem.list_md_files_recursive(root).unwrap();
        files.sort();
        assert_eq!(files, vec![root.join("a.md"), root.join("sub/b.md")]);
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.md");
        RealFileSystem.write_file(&path, "---\nrelated: x\n---\n").unwrap();
        assert!(RealFileSystem.exists(&path));
        assert_eq!(
            RealFileSystem.read_to_string(&path).unwrap(),
            "---\nrelated: x\n---\n"
        );
    }
}
