//! `watch` command: keep relations reciprocal while notes are edited.
//!
//! Filesystem events are forwarded to the vault store as [`NoteEvent`]s, so
//! they reach the orchestrator through the same subscription that filters out
//! its own writes.

use std::path::{Component, Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use indexmap::IndexMap;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use reciprocal_core::fs::{NoteEvent, is_markdown};
use reciprocal_core::sync::{ChangeQueue, RelationSync, SyncReport};

use crate::cli::util::{load_config, open_vault, print_report};

/// Quiet period before a burst of events is processed.
const DEBOUNCE: Duration = Duration::from_millis(300);

/// Handle the watch command
/// Returns false if the watcher could not be started; otherwise runs until
/// interrupted.
pub fn handle_watch(vault: Option<&Path>, sync_first: bool) -> bool {
    let config = load_config();
    let store = match open_vault(&config, vault) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };
    let root = store.root().to_path_buf();
    let mut sync = RelationSync::new(store, &config);

    let primed = if sync_first {
        sync.reconcile_all().map(|report| {
            print_report(&report);
            sync.snapshots().len()
        })
    } else {
        sync.prime()
    };
    match primed {
        Ok(count) => log::info!("Tracking {} notes", count),
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    }

    let queue = ChangeQueue::new();
    sync.subscribe(&queue);

    let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
    let mut watcher: RecommendedWatcher = match notify::recommended_watcher(tx) {
        Ok(watcher) => watcher,
        Err(e) => {
            eprintln!("✗ Failed to create watcher: {}", e);
            return false;
        }
    };
    if let Err(e) = watcher.watch(&root, RecursiveMode::Recursive) {
        eprintln!("✗ Failed to watch {}: {}", root.display(), e);
        return false;
    }
    println!("Watching {} (Ctrl+C to stop)", root.display());

    // Block for the first event, then collect until the vault goes quiet.
    while let Ok(first) = rx.recv() {
        let mut pending: IndexMap<PathBuf, NoteEvent> = IndexMap::new();
        collect(first, &root, &mut pending);
        while let Ok(next) = rx.recv_timeout(DEBOUNCE) {
            collect(next, &root, &mut pending);
        }

        for (path, event) in pending {
            // Gone again before we got to it.
            let event = if event.has_content() && !path.exists() {
                NoteEvent::deleted(path)
            } else {
                event
            };
            log::debug!("{:?}", event);
            sync.store().notify(&event);
        }
        report_changes(&sync.drain(&queue));
    }

    log::info!("File watcher stopping");
    true
}

/// Record the latest note event per path; a later event for the same path
/// replaces an earlier one.
fn collect(event: notify::Result<Event>, root: &Path, pending: &mut IndexMap<PathBuf, NoteEvent>) {
    let event = match event {
        Ok(event) => event,
        Err(e) => {
            log::warn!("Watch error: {}", e);
            return;
        }
    };
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return;
    }
    for path in event.paths {
        if !should_sync_file(root, &path) {
            continue;
        }
        let note_event = match event.kind {
            EventKind::Create(_) => NoteEvent::created(&path),
            EventKind::Remove(_) => NoteEvent::deleted(&path),
            _ => NoteEvent::changed(&path),
        };
        pending.insert(path, note_event);
    }
}

/// Only markdown notes inside the vault, outside hidden directories.
fn should_sync_file(root: &Path, path: &Path) -> bool {
    if !is_markdown(path) {
        return false;
    }
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    !relative.components().any(|c| match c {
        Component::Normal(name) => name.to_str().is_some_and(|n| n.starts_with('.')),
        _ => false,
    })
}

fn report_changes(report: &SyncReport) {
    for notice in &report.notices {
        eprintln!("✗ {}", notice);
    }
    if report.writes() > 0 {
        println!(
            "✓ Added {} and removed {} reciprocal reference(s)",
            report.inserted, report.removed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_sync_markdown_files() {
        let root = Path::new("/vault");
        assert!(should_sync_file(root, Path::new("/vault/Note.md")));
        assert!(should_sync_file(root, Path::new("/vault/people/Ada.md")));
    }

    #[test]
    fn test_should_not_sync_other_files() {
        let root = Path::new("/vault");
        assert!(!should_sync_file(root, Path::new("/vault/image.png")));
        assert!(!should_sync_file(root, Path::new("/vault/Note.md.swp")));
        assert!(!should_sync_file(root, Path::new("/elsewhere/Note.md")));
    }

    #[test]
    fn test_should_not_sync_hidden_paths() {
        let root = Path::new("/vault");
        assert!(!should_sync_file(root, Path::new("/vault/.obsidian/Note.md")));
        assert!(!should_sync_file(root, Path::new("/vault/.trash/a/Old.md")));
        assert!(should_sync_file(Path::new("/home/.notes"), Path::new("/home/.notes/A.md")));
    }

    #[test]
    fn test_collect_maps_event_kinds() {
        let root = Path::new("/vault");
        let mut pending = IndexMap::new();

        let modify = Event::new(EventKind::Modify(notify::event::ModifyKind::Any))
            .add_path(PathBuf::from("/vault/A.md"))
            .add_path(PathBuf::from("/vault/a.txt"));
        collect(Ok(modify), root, &mut pending);

        let remove = Event::new(EventKind::Remove(notify::event::RemoveKind::File))
            .add_path(PathBuf::from("/vault/B.md"));
        collect(Ok(remove), root, &mut pending);

        let create = Event::new(EventKind::Create(notify::event::CreateKind::File))
            .add_path(PathBuf::from("/vault/A.md"));
        collect(Ok(create), root, &mut pending);

        let access = Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(PathBuf::from("/vault/C.md"));
        collect(Ok(access), root, &mut pending);

        assert_eq!(
            pending.into_values().collect::<Vec<_>>(),
            vec![
                NoteEvent::created("/vault/A.md"),
                NoteEvent::deleted("/vault/B.md"),
            ]
        );
    }
}
