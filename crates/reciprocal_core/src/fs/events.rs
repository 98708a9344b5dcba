//! Note change events.
//!
//! Emitted by a [`NoteStore`](crate::store::NoteStore) through its
//! [`CallbackRegistry`](super::CallbackRegistry) so the relation orchestrator
//! (or a host UI) can react to edits.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use ts_rs::TS;

/// Events describing a change to a note on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type")]
pub enum NoteEvent {
    /// A note's content was written.
    Changed {
        /// Path of the note.
        path: PathBuf,
    },

    /// A new note appeared.
    Created {
        /// Path of the note.
        path: PathBuf,
    },

    /// A note was deleted.
    Deleted {
        /// Path of the note.
        path: PathBuf,
    },
}

impl NoteEvent {
    /// Create a Changed event.
    pub fn changed(path: impl Into<PathBuf>) -> Self {
        Self::Changed { path: path.into() }
    }

    /// Create a Created event.
    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self::Created { path: path.into() }
    }

    /// Create a Deleted event.
    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self::Deleted { path: path.into() }
    }

    /// The note this event is about.
    pub fn path(&self) -> &Path {
        match self {
            Self::Changed { path } | Self::Created { path } | Self::Deleted { path } => path,
        }
    }

    /// Whether the note may have new front matter worth diffing.
    pub fn has_content(&self) -> bool {
        !matches!(self, Self::Deleted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = NoteEvent::changed("vault/a.md");
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"Changed","path":"vault/a.md"}"#);

        let back: NoteEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_event_path() {
        assert_eq!(NoteEvent::deleted("x.md").path(), Path::new("x.md"));
        assert!(!NoteEvent::deleted("x.md").has_content());
        assert!(NoteEvent::created("x.md").has_content());
    }
}
