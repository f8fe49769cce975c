//! Editor adapter
//!
//! Decouples the save engine and the page controller from the concrete
//! block-editing widget. The widget holds one mutable document; the adapter
//! exposes a snapshot read, a whole-document replacement, and a change
//! subscription.
//!
//! Callers must not assume notifications are batched: the save engine does
//! its own coalescing.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::models::Block;

/// Callback fired on every discrete user edit
pub type ChangeCallback = Box<dyn Fn() + Send + Sync>;

/// Contract every editing widget wrapper fulfils
pub trait EditorAdapter: Send + Sync {
    /// Snapshot of the current document (pure read)
    fn get_document(&self) -> Vec<Block>;

    /// Swap the whole visible document
    ///
    /// Must not emit a change notification, otherwise a load would be
    /// saved straight back.
    fn replace_document(&self, blocks: Vec<Block>);

    /// Register a change listener; dropping the returned handle removes it
    fn on_change(&self, callback: ChangeCallback) -> Subscription;
}

/// Handle for a registered change listener
///
/// Unsubscribes on [`Subscription::unsubscribe`] or when dropped.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Create a subscription that runs `cancel` once when released
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Remove the listener now
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Arc<dyn Fn() + Send + Sync>)>,
}

/// In-memory editor document
///
/// Stands in for the widget wherever there is no UI (the CLI, tests).
/// [`DocumentBuffer::apply_edit`] models a user edit and notifies listeners;
/// [`EditorAdapter::replace_document`] never does.
#[derive(Default)]
pub struct DocumentBuffer {
    blocks: Mutex<Vec<Block>>,
    listeners: Arc<Mutex<Listeners>>,
}

impl DocumentBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer holding an initial document
    pub fn with_document(blocks: Vec<Block>) -> Self {
        Self {
            blocks: Mutex::new(blocks),
            listeners: Arc::default(),
        }
    }

    /// Replace the document as a user edit would, then notify listeners
    pub fn apply_edit(&self, blocks: Vec<Block>) {
        *self.blocks.lock() = blocks;
        self.notify();
    }

    /// Mutate the document in place as a user edit, then notify listeners
    pub fn edit<F>(&self, f: F)
    where
        F: FnOnce(&mut Vec<Block>),
    {
        {
            let mut blocks = self.blocks.lock();
            f(&mut *blocks);
        }
        self.notify();
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().entries.len()
    }

    fn notify(&self) {
        // Clone out so listeners run without the lock and may read the document
        let callbacks: Vec<_> = self
            .listeners
            .lock()
            .entries
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for callback in callbacks {
            callback();
        }
    }
}

impl EditorAdapter for DocumentBuffer {
    fn get_document(&self) -> Vec<Block> {
        self.blocks.lock().clone()
    }

    fn replace_document(&self, blocks: Vec<Block>) {
        *self.blocks.lock() = blocks;
    }

    fn on_change(&self, callback: ChangeCallback) -> Subscription {
        let id = {
            let mut listeners = self.listeners.lock();
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.entries.push((id, Arc::from(callback)));
            id
        };

        let weak: Weak<Mutex<Listeners>> = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = weak.upgrade() {
                listeners.lock().entries.retain(|(entry, _)| *entry != id);
            }
        })
    }
}
