//! Change notification: an explicit observer list with synchronous delivery.
//!
//! Subscribers are invoked in subscription order, on the thread performing
//! the mutation, exactly once per successful add or remove. Nothing is
//! persisted or replayed; an observer registered after a mutation never
//! sees it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// What happened to the entity.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChangeAction {
    Added,
    Removed,
}

/// Immutable record of one successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent<E> {
    pub action: ChangeAction,
    pub entity: E,
}

/// Handle identifying one subscription; pass it back to unsubscribe.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type Callback<E> = Arc<dyn Fn(&ChangeEvent<E>) + Send + Sync>;

/// Observer list owned by a repository.
pub(crate) struct ChangeNotifier<E> {
    subscribers: Mutex<Vec<(SubscriberId, Callback<E>)>>,
    next_id: AtomicU64,
}

impl<E> ChangeNotifier<E> {
    pub(crate) fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    pub(crate) fn subscribe(
        &self,
        callback: impl Fn(&ChangeEvent<E>) + Send + Sync + 'static,
    ) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        // If the lock is poisoned the subscription is silently lost; the
        // owning store is already unusable at that point.
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push((id, Arc::new(callback)));
        }
        id
    }

    pub(crate) fn unsubscribe(&self, id: SubscriberId) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|(sid, _)| *sid != id);
        }
    }

    /// Deliver one event to every current subscriber, in order.
    ///
    /// The list is snapshotted first so a callback can re-enter
    /// subscribe/unsubscribe without deadlocking.
    pub(crate) fn emit(&self, event: &ChangeEvent<E>) {
        let snapshot: Vec<Callback<E>> = match self.subscribers.lock() {
            Ok(subscribers) => subscribers.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
            Err(_) => return,
        };

        for callback in snapshot {
            callback(event);
        }
    }
}

impl<E> std::fmt::Debug for ChangeNotifier<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self.subscribers.lock().map(|s| s.len()).unwrap_or(0);
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &len)
            .finish()
    }
}
