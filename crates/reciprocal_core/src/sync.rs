//! Relation orchestrator.
//!
//! Watches notes' front matter change over time and mirrors every added or
//! removed reference onto the linked note. When note A gains `[[B]]` under a
//! configured property, `[[A]]` is inserted into B's reciprocal property; when
//! the link goes away, it is removed again.
//!
//! Two pieces of state make this safe to run on every change notification:
//!
//! - a [`SnapshotStore`] with the last front matter seen for each note, so
//!   only the *difference* is acted on;
//! - an [`InFlight`] guard with the notes currently being processed, so a
//!   write to B during A's update does not re-trigger processing of B.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use serde_yaml::Value;

use crate::config::{Config, PropertyPair};
use crate::error::{ReciprocalError, Result, SerializableError};
use crate::frontmatter;
use crate::fs::{NoteEvent, SubscriptionId};
use crate::patch::{self, PatchOp, Patched, RemovalPolicy};
use crate::store::{NoteHandle, NoteStore};
use crate::wikilink::{extract_wikilinks, link_target};

/// Front matter as last observed for one note.
pub type Snapshot = IndexMap<String, Value>;

/// Last observed front matter per note path.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    entries: HashMap<PathBuf, Snapshot>,
}

impl SnapshotStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot for `path`, if one was taken.
    pub fn get(&self, path: &Path) -> Option<&Snapshot> {
        self.entries.get(path)
    }

    /// Replace the snapshot for `path`.
    pub fn insert(&mut self, path: impl Into<PathBuf>, snapshot: Snapshot) {
        self.entries.insert(path.into(), snapshot);
    }

    /// Overwrite one property of a snapshot, creating the snapshot if needed.
    /// `None` records the property as absent.
    pub fn set_property(&mut self, path: &Path, property: &str, value: Option<Value>) {
        let snapshot = self.entries.entry(path.to_path_buf()).or_default();
        match value {
            Some(value) => {
                snapshot.insert(property.to_string(), value);
            }
            None => {
                snapshot.shift_remove(property);
            }
        }
    }

    /// Forget the snapshot for `path`. Returns `false` if there was none.
    pub fn remove(&mut self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    /// Note names referenced by `property` in the snapshot for `path`.
    pub fn references(&self, path: &Path, property: &str) -> Vec<String> {
        extract_wikilinks(self.get(path).and_then(|s| s.get(property)))
    }

    /// Number of notes with a snapshot.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no snapshot has been taken yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Set of note paths currently being processed.
///
/// Clones share the same set, so a store's change callback can consult it
/// while the orchestrator holds entries.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    paths: Arc<Mutex<HashSet<PathBuf>>>,
}

impl InFlight {
    /// Create an empty guard set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `path` is being processed right now.
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.lock().unwrap().contains(path)
    }

    /// Mark `path` as in flight until the returned entry is dropped.
    /// Returns `None` if it already is.
    pub fn enter(&self, path: &Path) -> Option<InFlightEntry> {
        let mut paths = self.paths.lock().unwrap();
        if !paths.insert(path.to_path_buf()) {
            return None;
        }
        Some(InFlightEntry {
            paths: Arc::clone(&self.paths),
            path: path.to_path_buf(),
        })
    }
}

/// Releases its path from the [`InFlight`] set on drop.
#[derive(Debug)]
pub struct InFlightEntry {
    paths: Arc<Mutex<HashSet<PathBuf>>>,
    path: PathBuf,
}

impl Drop for InFlightEntry {
    fn drop(&mut self) {
        if let Ok(mut paths) = self.paths.lock() {
            paths.remove(&self.path);
        }
    }
}

/// Something the user should hear about after a sync.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum SyncNotice {
    /// A note links to a name no note answers to.
    Unresolved {
        /// Note holding the link.
        source: String,
        /// The name that could not be found.
        target: String,
    },
    /// Updating a linked note failed; the note was left as it was.
    Failed {
        /// Note that could not be updated.
        note: String,
        /// What went wrong.
        error: SerializableError,
    },
}

impl SyncNotice {
    fn failed(note: &str, error: &ReciprocalError) -> Self {
        SyncNotice::Failed {
            note: note.to_string(),
            error: error.to_serializable(),
        }
    }
}

impl fmt::Display for SyncNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncNotice::Unresolved { source, target } => {
                write!(f, "[[{}]] links to [[{}]], which does not exist", source, target)
            }
            SyncNotice::Failed { note, error } => {
                write!(f, "Could not update [[{}]]: {}", note, error.message)
            }
        }
    }
}

/// What a sync pass did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    /// Reciprocal references added.
    pub inserted: usize,
    /// Reciprocal references removed.
    pub removed: usize,
    /// Linked notes that already had the right shape.
    pub unchanged: usize,
    /// Updates skipped because the note was already being processed.
    pub skipped: usize,
    /// Problems worth telling the user about.
    pub notices: Vec<SyncNotice>,
}

impl SyncReport {
    /// A report for a change that was not processed at all.
    pub fn skipped() -> Self {
        Self {
            skipped: 1,
            ..Self::default()
        }
    }

    /// Number of notes written.
    pub fn writes(&self) -> usize {
        self.inserted + self.removed
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: SyncReport) {
        self.inserted += other.inserted;
        self.removed += other.removed;
        self.unchanged += other.unchanged;
        self.skipped += other.skipped;
        self.notices.extend(other.notices);
    }
}

/// Note events waiting to be synced, fed by a store's change notifications.
///
/// Holds at most one event per path; a newer event replaces the queued one.
#[derive(Debug, Clone, Default)]
pub struct ChangeQueue {
    events: Arc<Mutex<VecDeque<NoteEvent>>>,
}

impl ChangeQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `event`, replacing any event already waiting for its path.
    pub fn push(&self, event: NoteEvent) {
        let mut events = self.events.lock().unwrap();
        match events.iter_mut().find(|e| e.path() == event.path()) {
            Some(queued) => *queued = event,
            None => events.push_back(event),
        }
    }

    /// Next event to process.
    pub fn pop(&self) -> Option<NoteEvent> {
        self.events.lock().unwrap().pop_front()
    }

    /// Number of waiting events.
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Whether nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Insert,
    Remove,
}

/// Keeps configured property pairs reciprocal across a [`NoteStore`].
pub struct RelationSync<S: NoteStore> {
    store: S,
    pairs: Vec<PropertyPair>,
    policy: RemovalPolicy,
    snapshots: SnapshotStore,
    in_flight: InFlight,
}

impl<S: NoteStore> RelationSync<S> {
    /// Create an orchestrator using the pairs and policy from `config`.
    pub fn new(store: S, config: &Config) -> Self {
        Self::with_pairs(store, config.property_pairs.clone(), config.removal_policy)
    }

    /// Create an orchestrator with explicit pairs.
    pub fn with_pairs(store: S, pairs: Vec<PropertyPair>, policy: RemovalPolicy) -> Self {
        Self {
            store,
            pairs,
            policy,
            snapshots: SnapshotStore::new(),
            in_flight: InFlight::new(),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Last observed front matter.
    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    /// Shared handle to the in-flight set.
    pub fn in_flight(&self) -> InFlight {
        self.in_flight.clone()
    }

    /// Snapshot every note without writing anything. Returns how many notes
    /// were recorded; notes whose front matter does not parse are left out.
    pub fn prime(&mut self) -> Result<usize> {
        let notes = self.store.list_notes()?;
        let mut count = 0;
        for note in &notes {
            match self.store.get_frontmatter(note) {
                Ok(fm) => {
                    self.snapshots.insert(&note.path, fm);
                    count += 1;
                }
                Err(e) => log::warn!("Not tracking {}: {}", note.path.display(), e),
            }
        }
        log::debug!("Primed {} of {} notes", count, notes.len());
        Ok(count)
    }

    /// React to a change of the note at `path`.
    pub fn handle_change(&mut self, path: &Path) -> Result<SyncReport> {
        let Some(_guard) = self.in_flight.enter(path) else {
            log::debug!("Skipping {}: already being processed", path.display());
            return Ok(SyncReport::skipped());
        };
        let Some(source) = NoteHandle::from_path(path) else {
            return Ok(SyncReport::default());
        };

        let current = match self.store.get_frontmatter(&source) {
            Ok(fm) => fm,
            Err(ReciprocalError::Yaml(e)) => {
                // Keep the old snapshot so nothing looks removed while the
                // note is half edited.
                log::warn!("Front matter of {} does not parse: {}", path.display(), e);
                return Ok(SyncReport::default());
            }
            Err(e) => return Err(e),
        };
        let previous = self.snapshots.get(path).cloned().unwrap_or_default();

        let mut report = SyncReport::default();
        for (own, reciprocal) in self.sides() {
            let before = targets(previous.get(&own));
            let after = targets(current.get(&own));

            for name in after.difference(&before) {
                self.update_companion(&source, name, &reciprocal, Action::Insert, &mut report);
            }
            for name in before.difference(&after) {
                self.update_companion(&source, name, &reciprocal, Action::Remove, &mut report);
            }
        }

        self.snapshots.insert(path, current);
        Ok(report)
    }

    /// Make every existing link reciprocal, then re-snapshot the vault.
    ///
    /// Only inserts; a stale reciprocal whose origin no longer links back is
    /// left alone, since nothing records who added it.
    pub fn reconcile_all(&mut self) -> Result<SyncReport> {
        let notes = self.store.list_notes()?;
        let mut report = SyncReport::default();

        for source in &notes {
            let Some(_guard) = self.in_flight.enter(&source.path) else {
                continue;
            };
            let fm = match self.store.get_frontmatter(source) {
                Ok(fm) => fm,
                Err(e) => {
                    log::warn!("Skipping {}: {}", source.path.display(), e);
                    continue;
                }
            };
            for (own, reciprocal) in self.sides() {
                for name in &targets(fm.get(&own)) {
                    self.update_companion(source, name, &reciprocal, Action::Insert, &mut report);
                }
            }
        }

        self.prime()?;
        Ok(report)
    }

    /// Queue store change notifications into `queue`, dropping the ones
    /// caused by this orchestrator's own writes.
    pub fn subscribe(&self, queue: &ChangeQueue) -> SubscriptionId {
        let in_flight = self.in_flight.clone();
        let queue = queue.clone();
        self.store.on_changed(Arc::new(move |event| {
            if in_flight.contains(event.path()) {
                log::debug!("Ignoring own write to {}", event.path().display());
                return;
            }
            queue.push(event.clone());
        }))
    }

    /// Process everything waiting in `queue`. Errors on one note become
    /// notices and do not stop the rest.
    ///
    /// A deleted note is only forgotten; the notes it linked to keep their
    /// reciprocal references.
    pub fn drain(&mut self, queue: &ChangeQueue) -> SyncReport {
        let mut report = SyncReport::default();
        while let Some(event) = queue.pop() {
            let path = event.path();
            if !event.has_content() {
                if self.snapshots.remove(path) {
                    log::debug!("Forgot deleted note {}", path.display());
                }
                continue;
            }
            match self.handle_change(path) {
                Ok(r) => report.merge(r),
                Err(e) => {
                    log::warn!("Sync of {} failed: {}", path.display(), e);
                    let name = NoteHandle::from_path(path)
                        .map(|n| n.name)
                        .unwrap_or_else(|| path.display().to_string());
                    report.notices.push(SyncNotice::failed(&name, &e));
                }
            }
        }
        report
    }

    fn sides(&self) -> Vec<(String, String)> {
        let mut sides: Vec<(String, String)> = Vec::new();
        for pair in &self.pairs {
            for (own, reciprocal) in pair.sides() {
                let side = (own.to_string(), reciprocal.to_string());
                if !sides.contains(&side) {
                    sides.push(side);
                }
            }
        }
        sides
    }

    fn update_companion(
        &mut self,
        source: &NoteHandle,
        target: &str,
        property: &str,
        action: Action,
        report: &mut SyncReport,
    ) {
        let Some(companion) = self.store.find_note_by_name(target) else {
            log::info!("[[{}]] links to unknown note [[{}]]", source.name, target);
            report.notices.push(SyncNotice::Unresolved {
                source: source.name.clone(),
                target: target.to_string(),
            });
            return;
        };
        if companion.path == source.path {
            log::debug!("[[{}]] links to itself", source.name);
            return;
        }
        let Some(_guard) = self.in_flight.enter(&companion.path) else {
            log::debug!("Skipping {}: already being processed", companion.path.display());
            report.skipped += 1;
            return;
        };

        let op = match action {
            Action::Insert => PatchOp::Insert {
                note: &source.name,
                property,
            },
            Action::Remove => PatchOp::Remove {
                note: &source.name,
                property,
                policy: self.policy,
            },
        };

        match self.patch_companion(&companion, &op) {
            Ok(Patched::Changed(_)) => match action {
                Action::Insert => {
                    log::info!("Added [[{}]] to {} of [[{}]]", source.name, property, companion.name);
                    report.inserted += 1;
                }
                Action::Remove => {
                    log::info!(
                        "Removed [[{}]] from {} of [[{}]]",
                        source.name,
                        property,
                        companion.name
                    );
                    report.removed += 1;
                }
            },
            Ok(Patched::Unchanged) => {
                log::debug!("[[{}]] already up to date", companion.name);
                report.unchanged += 1;
            }
            Err(e) => {
                log::warn!("{}", e);
                report.notices.push(SyncNotice::failed(&companion.name, &e));
            }
        }
    }

    fn patch_companion(&mut self, companion: &NoteHandle, op: &PatchOp<'_>) -> Result<Patched> {
        let content = self.store.read_content(companion)?;
        let patched = patch::apply(op, &content)?;
        if let Patched::Changed(new_content) = &patched {
            self.store.write_content(companion, new_content)?;
            self.absorb_write(companion, op.target().1, new_content);
        }
        Ok(patched)
    }

    /// Record our own edit in the companion's snapshot, so its change
    /// notification does not look like a user edit and bounce back.
    fn absorb_write(&mut self, companion: &NoteHandle, property: &str, content: &str) {
        match frontmatter::parse_or_empty(content) {
            Ok(parsed) => {
                let value = parsed.frontmatter.get(property).cloned();
                self.snapshots.set_property(&companion.path, property, value);
            }
            Err(e) => log::debug!(
                "Written note {} does not parse: {}",
                companion.path.display(),
                e
            ),
        }
    }
}

/// Linked note names in a property value, deduplicated in first-seen order.
fn targets(value: Option<&Value>) -> IndexSet<String> {
    extract_wikilinks(value)
        .iter()
        .map(|name| link_target(name).to_string())
        .filter(|name| !name.is_empty())
        .collect()
}
