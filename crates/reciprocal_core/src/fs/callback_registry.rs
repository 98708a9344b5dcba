//! Callback registry for note event subscriptions.
//!
//! Subscribers receive [`NoteEvent`] notifications when a store writes a note.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use super::events::NoteEvent;

/// A unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Callback function type for note events.
///
/// Callbacks run synchronously on the writing thread and should not block.
pub type EventCallback = Arc<dyn Fn(&NoteEvent) + Send + Sync>;

/// Thread-safe registry of event subscriptions.
///
/// # Example
///
/// ```
/// use reciprocal_core::fs::{CallbackRegistry, NoteEvent};
/// use std::sync::Arc;
///
/// let registry = CallbackRegistry::new();
/// let id = registry.subscribe(Arc::new(|event| {
///     println!("changed: {}", event.path().display());
/// }));
///
/// registry.emit(&NoteEvent::changed("vault/a.md"));
/// assert!(registry.unsubscribe(id));
/// ```
pub struct CallbackRegistry {
    callbacks: RwLock<BTreeMap<SubscriptionId, EventCallback>>,
    next_id: AtomicU64,
}

impl CallbackRegistry {
    /// Create a new empty callback registry.
    pub fn new() -> Self {
        Self {
            callbacks: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribe to note events.
    pub fn subscribe(&self, callback: EventCallback) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.callbacks.write().unwrap().insert(id, callback);
        id
    }

    /// Returns `true` if the subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.callbacks.write().unwrap().remove(&id).is_some()
    }

    /// Emit an event to all registered callbacks, in subscription order.
    ///
    /// The lock is released before callbacks run, so a callback may itself
    /// subscribe or unsubscribe. A panicking callback does not stop the others.
    pub fn emit(&self, event: &NoteEvent) {
        let callbacks: Vec<EventCallback> =
            self.callbacks.read().unwrap().values().cloned().collect();
        for callback in callbacks {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                callback(event);
            }));
            if outcome.is_err() {
                log::warn!("Event callback panicked for {}", event.path().display());
            }
        }
    }

    /// Get the number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.callbacks.read().unwrap().len()
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("subscriber_count", &self.subscriber_count())
            .field("next_id", &self.next_id.load(Ordering::SeqCst))
            .finish()
    }
}
