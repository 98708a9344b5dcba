//! Note store: the read/write/lookup surface the relation orchestrator needs.
//!
//! [`NoteStore`] is the collaborator interface; [`VaultStore`] implements it
//! over a directory of markdown files on any [`FileSystem`].

use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use serde_yaml::Value;
use ts_rs::TS;

use crate::error::{ReciprocalError, Result};
use crate::frontmatter;
use crate::fs::{CallbackRegistry, EventCallback, FileSystem, NoteEvent, SubscriptionId};

/// A resolved note: where it lives and the name other notes link to it by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NoteHandle {
    /// Path of the markdown file.
    pub path: PathBuf,
    /// File stem, as written inside `[[...]]`.
    pub name: String,
}

impl NoteHandle {
    /// Build a handle from a markdown path, or `None` if it has no file stem.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let name = path.file_stem()?.to_str()?.to_string();
        Some(Self { path, name })
    }
}

/// Everything the relation orchestrator needs from the host application.
pub trait NoteStore {
    /// Resolve a link target to a note.
    ///
    /// Must return the same note every time for the same name, even when
    /// several notes share it.
    fn find_note_by_name(&self, name: &str) -> Option<NoteHandle>;

    /// Raw note content.
    fn read_content(&self, note: &NoteHandle) -> Result<String>;

    /// Replace the note's content.
    fn write_content(&self, note: &NoteHandle, content: &str) -> Result<()>;

    /// All notes in the store.
    fn list_notes(&self) -> Result<Vec<NoteHandle>>;

    /// Subscribe to change notifications.
    fn on_changed(&self, callback: EventCallback) -> SubscriptionId;

    /// Drop a subscription. Returns `false` if it was unknown.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Structured front matter of the note, in file order.
    ///
    /// A note without front matter yields an empty map. A block that is not
    /// valid YAML is an error, so callers can tell "no relations" apart from
    /// "unreadable relations".
    fn get_frontmatter(&self, note: &NoteHandle) -> Result<IndexMap<String, Value>> {
        let content = self.read_content(note)?;
        Ok(frontmatter::parse_or_empty(&content)?.frontmatter)
    }
}

/// A directory of markdown notes.
pub struct VaultStore<FS: FileSystem> {
    fs: FS,
    root: PathBuf,
    events: CallbackRegistry,
}

impl<FS: FileSystem> VaultStore<FS> {
    /// Open the vault rooted at `root`.
    pub fn new(fs: FS, root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !fs.is_dir(&root) {
            return Err(ReciprocalError::VaultNotFound(root));
        }
        Ok(Self {
            fs,
            root,
            events: CallbackRegistry::new(),
        })
    }

    /// Vault root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Forward an externally observed event (e.g. from a file watcher) to
    /// subscribers.
    pub fn notify(&self, event: &NoteEvent) {
        self.events.emit(event);
    }
}

impl<FS: FileSystem> NoteStore for VaultStore<FS> {
    fn find_note_by_name(&self, name: &str) -> Option<NoteHandle> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        // Only plain relative names; `[[/etc/x]]` or `[[../x]]` would point
        // outside the vault.
        if !Path::new(name)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            log::warn!("Not resolving [[{}]]: it leaves the vault", name);
            return None;
        }

        let exact = self.root.join(format!("{}.md", name));
        if self.fs.exists(&exact) && !self.fs.is_dir(&exact) {
            return NoteHandle::from_path(exact);
        }

        // Links may name a note anywhere in the vault by its stem. The first
        // match in path order wins.
        let notes = match self.list_notes() {
            Ok(notes) => notes,
            Err(e) => {
                log::warn!("Could not list notes while resolving [[{}]]: {}", name, e);
                return None;
            }
        };
        notes.into_iter().find(|note| note.name == name)
    }

    fn read_content(&self, note: &NoteHandle) -> Result<String> {
        self.fs
            .read_to_string(&note.path)
            .map_err(|e| ReciprocalError::FileRead {
                path: note.path.clone(),
                source: e,
            })
    }

    fn write_content(&self, note: &NoteHandle, content: &str) -> Result<()> {
        self.fs
            .write_file(&note.path, content)
            .map_err(|e| ReciprocalError::FileWrite {
                path: note.path.clone(),
                source: e,
            })?;
        self.events.emit(&NoteEvent::changed(&note.path));
        Ok(())
    }

    fn list_notes(&self) -> Result<Vec<NoteHandle>> {
        let mut paths = self
            .fs
            .list_md_files_recursive(&self.root)
            .map_err(|e| ReciprocalError::FileRead {
                path: self.root.clone(),
                source: e,
            })?;
        paths.sort();
        Ok(paths.into_iter().filter_map(NoteHandle::from_path).collect())
    }

    fn on_changed(&self, callback: EventCallback) -> SubscriptionId {
        self.events.subscribe(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFileSystem;
    use std::sync::{Arc, Mutex};

    fn vault() -> VaultStore<InMemoryFileSystem> {
        let fs = InMemoryFileSystem::new()
            .with_file("vault/Alpha.md", "---\nrelated: \"[[Beta]]\"\n---\nAlpha")
            .with_file("vault/people/Beta.md", "Beta body")
            .with_file("vault/z/Beta.md", "Other Beta")
            .with_file("vault/Broken.md", "---\nrelated: [\"[[A]]\"\n---\n");
        VaultStore::new(fs, "vault").unwrap()
    }

    #[test]
    fn test_missing_vault() {
        let result = VaultStore::new(InMemoryFileSystem::new(), "nowhere");
        assert!(matches!(result, Err(ReciprocalError::VaultNotFound(_))));
    }

    #[test]
    fn test_find_exact_path_first() {
        let store = vault();
        let note = store.find_note_by_name("Alpha").unwrap();
        assert_eq!(note.path, PathBuf::from("vault/Alpha.md"));
        assert_eq!(note.name, "Alpha");
    }

    #[test]
    fn test_find_by_stem_is_deterministic() {
        let store = vault();
        for _ in 0..3 {
            let note = store.find_note_by_name("Beta").unwrap();
            assert_eq!(note.path, PathBuf::from("vault/people/Beta.md"));
        }
        assert!(store.find_note_by_name("Gamma").is_none());
        assert!(store.find_note_by_name("  ").is_none());
    }

    #[test]
    fn test_find_by_relative_path() {
        let store = vault();
        let note = store.find_note_by_name("z/Beta").unwrap();
        assert_eq!(note.path, PathBuf::from("vault/z/Beta.md"));
        assert_eq!(note.name, "Beta");
    }

    #[test]
    fn test_find_never_leaves_the_vault() {
        let fs = InMemoryFileSystem::new()
            .with_file("vault/A.md", "A")
            .with_file("outside/Secret.md", "private body")
            .with_file("/outside/Secret.md", "private body");
        let store = VaultStore::new(fs, "vault").unwrap();

        assert!(store.find_note_by_name("../outside/Secret").is_none());
        assert!(store.find_note_by_name("/outside/Secret").is_none());
        assert!(store.find_note_by_name("a/../../outside/Secret").is_none());
        assert_eq!(
            store.find_note_by_name("A").map(|n| n.path),
            Some(PathBuf::from("vault/A.md"))
        );
    }

    #[test]
    fn test_get_frontmatter() {
        let store = vault();
        let alpha = store.find_note_by_name("Alpha").unwrap();
        let fm = store.get_frontmatter(&alpha).unwrap();
        assert_eq!(fm.get("related").and_then(Value::as_str), Some("[[Beta]]"));

        let beta = store.find_note_by_name("Beta").unwrap();
        assert!(store.get_frontmatter(&beta).unwrap().is_empty());

        let broken = store.find_note_by_name("Broken").unwrap();
        assert!(matches!(
            store.get_frontmatter(&broken),
            Err(ReciprocalError::Yaml(_))
        ));
    }

    #[test]
    fn test_write_emits_changed_event() {
        let store = vault();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let id = store.on_changed(Arc::new(move |event| {
            s.lock().unwrap().push(event.clone());
        }));

        let beta = store.find_note_by_name("Beta").unwrap();
        store.write_content(&beta, "new").unwrap();
        assert_eq!(store.read_content(&beta).unwrap(), "new");
        assert_eq!(
            *seen.lock().unwrap(),
            vec![NoteEvent::changed("vault/people/Beta.md")]
        );

        assert!(store.unsubscribe(id));
        store.write_content(&beta, "again").unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_list_notes_sorted() {
        let names: Vec<PathBuf> = vault()
            .list_notes()
            .unwrap()
            .into_iter()
            .map(|n| n.path)
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("vault/Alpha.md"),
                PathBuf::from("vault/Broken.md"),
                PathBuf::from("vault/people/Beta.md"),
                PathBuf::from("vault/z/Beta.md"),
            ]
        );
    }
}
