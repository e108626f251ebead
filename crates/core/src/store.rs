//! The keyed entity store driving the aspect pipeline.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use crate::aspect::{Aspect, AspectRegistry};
use crate::error::{self, StoreError};
use crate::event::{ChangeAction, ChangeEvent, ChangeNotifier, SubscriberId};
use crate::fallback::MissHandler;

type KeyFn<E, K> = Arc<dyn Fn(&E) -> K + Send + Sync>;

/// Generic, thread-safe, in-memory entity store.
///
/// A repository owns a `{key -> entity}` map, a key-extraction function
/// fixed at construction, an ordered list of [`Aspect`]s, and a change
/// observer list. Every mutation runs the same visible protocol: pre-hooks
/// in registration order, the atomic map mutation, post-hooks in
/// registration order, then one [`ChangeEvent`] to each subscriber.
///
/// The store is a passive object: it owns no threads, and hooks, observers
/// and the optional miss handler all run on the calling thread.
///
/// The key is derived from the entity exactly once per mutation. If an
/// entity's key-relevant fields change after insertion, the stored key goes
/// stale; keeping keys stable is the caller's responsibility.
pub struct Repository<E, K> {
    entities: RwLock<HashMap<K, E>>,
    key_fn: KeyFn<E, K>,
    aspects: AspectRegistry<E>,
    notifier: ChangeNotifier<E>,
    miss_handler: Option<Box<dyn MissHandler<K, E>>>,
}

impl<E, K> Repository<E, K>
where
    E: Clone + Send + Sync + 'static,
    K: Clone + Eq + Hash + Send + Sync + 'static,
{
    /// Create an empty repository keyed by `key_fn`.
    pub fn new(key_fn: impl Fn(&E) -> K + Send + Sync + 'static) -> Self {
        Self::build(Arc::new(key_fn), None)
    }

    /// Create an empty repository that consults `handler` on local misses.
    pub fn with_miss_handler(
        key_fn: impl Fn(&E) -> K + Send + Sync + 'static,
        handler: impl MissHandler<K, E> + 'static,
    ) -> Self {
        Self::build(Arc::new(key_fn), Some(Box::new(handler)))
    }

    fn build(key_fn: KeyFn<E, K>, miss_handler: Option<Box<dyn MissHandler<K, E>>>) -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
            key_fn,
            aspects: AspectRegistry::new(),
            notifier: ChangeNotifier::new(),
            miss_handler,
        }
    }

    /// Number of currently stored entities.
    pub fn len(&self) -> usize {
        self.entities.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look an entity up by key.
    ///
    /// On a local miss the miss handler (if any) is consulted; its result is
    /// returned without being cached locally. A failing lookup is reported
    /// to every aspect's error hook and yields `None` instead of
    /// propagating.
    pub fn get(&self, key: &K) -> Option<E> {
        let local = match self.entities.read() {
            Ok(map) => map.get(key).cloned(),
            Err(_) => {
                self.report_error(error::GET_FAILED, &StoreError::Poisoned);
                return None;
            }
        };
        if local.is_some() {
            return local;
        }

        match &self.miss_handler {
            Some(handler) => match handler.fetch(key) {
                Ok(found) => found,
                Err(err) => {
                    tracing::warn!("miss handler failed: {err}");
                    self.report_error(error::GET_FAILED, &err);
                    None
                }
            },
            None => None,
        }
    }

    /// Insert a new entity. Returns whether it was newly inserted.
    ///
    /// Protocol: every aspect's pre-add hook runs first (all of them see the
    /// attempt; the AND of their answers decides). On agreement the key is
    /// computed and the entity inserted only if the key is vacant; exactly
    /// one of any number of concurrent adds for the same key wins. A
    /// successful insertion runs the post-add hooks in registration order
    /// and then emits one `Added` event.
    pub fn add(&self, entity: E) -> bool {
        let aspects = self.aspects.snapshot();

        let mut allowed = true;
        for aspect in &aspects {
            if !aspect.before_add(&entity) {
                allowed = false;
            }
        }
        if !allowed {
            tracing::debug!("add vetoed by an aspect");
            return false;
        }

        let key = (self.key_fn)(&entity);
        let inserted = match self.entities.write() {
            Ok(mut map) => match map.entry(key) {
                Entry::Occupied(_) => false,
                Entry::Vacant(slot) => {
                    slot.insert(entity.clone());
                    true
                }
            },
            Err(_) => {
                self.report_error_to(&aspects, error::ADD_FAILED, &StoreError::Poisoned);
                return false;
            }
        };
        if !inserted {
            tracing::debug!("add skipped, key already present");
            return false;
        }

        for aspect in &aspects {
            aspect.after_add(&entity);
        }
        self.notifier.emit(&ChangeEvent {
            action: ChangeAction::Added,
            entity,
        });
        true
    }

    /// Remove an entity. Returns whether anything was removed.
    ///
    /// The key is recomputed from the entity; pre-remove hooks run before
    /// the removal, post-remove hooks and one `Removed` event after it.
    pub fn remove(&self, entity: &E) -> bool {
        let aspects = self.aspects.snapshot();

        let mut allowed = true;
        for aspect in &aspects {
            if !aspect.before_remove(entity) {
                allowed = false;
            }
        }
        if !allowed {
            tracing::debug!("remove vetoed by an aspect");
            return false;
        }

        let key = (self.key_fn)(entity);
        let removed = match self.entities.write() {
            Ok(mut map) => map.remove(&key),
            Err(_) => {
                self.report_error_to(&aspects, error::REMOVE_FAILED, &StoreError::Poisoned);
                return false;
            }
        };
        let Some(removed) = removed else {
            return false;
        };

        for aspect in &aspects {
            aspect.after_remove(&removed);
        }
        self.notifier.emit(&ChangeEvent {
            action: ChangeAction::Removed,
            entity: removed,
        });
        true
    }

    /// Remove by key: looks the entity up first, then delegates to
    /// [`remove`](Repository::remove). An absent key returns `false` with
    /// no hooks invoked.
    pub fn remove_by_key(&self, key: &K) -> bool {
        let entity = match self.entities.read() {
            Ok(map) => map.get(key).cloned(),
            Err(_) => {
                self.report_error(error::REMOVE_FAILED, &StoreError::Poisoned);
                return false;
            }
        };
        match entity {
            Some(entity) => self.remove(&entity),
            None => false,
        }
    }

    /// In-place update is a deliberate capability gap.
    ///
    /// Always returns [`StoreError::UpdateUnsupported`]; it neither no-ops
    /// nor touches the map.
    pub fn update(&self, _entity: &E) -> Result<bool, StoreError> {
        Err(StoreError::UpdateUnsupported)
    }

    /// Stable snapshot of the current entities.
    ///
    /// Each call takes a fresh snapshot; mutations after the call are not
    /// reflected in an already-returned vector. Iteration order is
    /// unspecified.
    pub fn snapshot(&self) -> Vec<E> {
        match self.entities.read() {
            Ok(map) => map.values().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Register an aspect. Idempotent by identity.
    pub fn add_aspect(&self, aspect: Arc<dyn Aspect<E>>) {
        self.aspects.add(aspect);
    }

    /// Remove an aspect by identity. No-op if absent.
    pub fn remove_aspect(&self, aspect: &Arc<dyn Aspect<E>>) {
        self.aspects.remove(aspect);
    }

    /// Ordered view of the current aspect registrations.
    pub fn aspects(&self) -> Vec<Arc<dyn Aspect<E>>> {
        self.aspects.snapshot()
    }

    /// Subscribe to change events. The callback runs synchronously on the
    /// mutating thread, once per successful add or remove.
    pub fn subscribe(
        &self,
        callback: impl Fn(&ChangeEvent<E>) + Send + Sync + 'static,
    ) -> SubscriberId {
        self.notifier.subscribe(callback)
    }

    /// Drop a change subscription. No-op for unknown ids.
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.notifier.unsubscribe(id)
    }

    fn report_error(&self, message: &str, err: &StoreError) {
        self.report_error_to(&self.aspects.snapshot(), message, err);
    }

    fn report_error_to(&self, aspects: &[Arc<dyn Aspect<E>>], message: &str, err: &StoreError) {
        tracing::warn!("{message}: {err}");
        for aspect in aspects {
            aspect.on_error(message, err);
        }
    }
}

impl<E, K> std::fmt::Debug for Repository<E, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self.entities.read().map(|map| map.len()).unwrap_or(0);
        f.debug_struct("Repository")
            .field("entities", &len)
            .field("aspects", &self.aspects)
            .field("has_miss_handler", &self.miss_handler.is_some())
            .finish()
    }
}
