//! Snapshot publisher for queue state changes

use crate::queue::task::Task;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{trace, warn};

/// Handle returned by [`UpdateBus::subscribe`], used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&[Task]) + Send + Sync>;

/// Registry of queue-update listeners.
///
/// Every state-affecting mutation of the queue publishes one full snapshot
/// to all registered listeners. Listeners for a given event all see the same
/// snapshot; there is no ordering guarantee between listeners. A listener
/// that panics is logged and skipped, never preventing delivery to the rest.
pub struct UpdateBus {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
}

impl UpdateBus {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Register a listener for queue snapshots.
    pub fn subscribe(&self, listener: impl Fn(&[Task]) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut listeners = self.listeners.lock().expect("listener registry poisoned");
        listeners.push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener; unknown ids are tolerated as a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut listeners = self.listeners.lock().expect("listener registry poisoned");
        listeners.retain(|(registered, _)| *registered != id);
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().expect("listener registry poisoned").len()
    }

    /// Deliver a snapshot to every registered listener.
    ///
    /// The registry lock is released before any listener runs, so listeners
    /// may subscribe or unsubscribe from inside the callback.
    pub fn publish(&self, snapshot: &[Task]) {
        let listeners: Vec<Listener> = {
            let guard = self.listeners.lock().expect("listener registry poisoned");
            guard.iter().map(|(_, l)| Arc::clone(l)).collect()
        };

        trace!("Publishing queue snapshot to {} listeners", listeners.len());

        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(snapshot))).is_err() {
                warn!("Queue listener panicked; continuing with remaining listeners");
            }
        }
    }
}

impl Default for UpdateBus {
    fn default() -> Self {
        Self::new()
    }
}
