//! Aspect contract and the ordered registry the store drives.

use std::sync::{Arc, Mutex};

use crate::error::StoreError;

/// Cross-cutting hook points around store mutations.
///
/// Aspects let callers attach logging, validation, auditing or metrics to a
/// repository without modifying the store or the entities. Every hook has a
/// safe default: pre-hooks allow, post-hooks and the error hook do nothing.
/// Implementations are shared with the store as `Arc<dyn Aspect<E>>` and may
/// hold their own state (a message sink, a counter).
///
/// Hooks are parameterized once, by the store's entity type; an aspect
/// registered with a `Repository<E, K>` sees exactly that `E`.
pub trait Aspect<E>: Send + Sync {
    /// Called before an entity is inserted. Returning `false` vetoes the add.
    fn before_add(&self, _entity: &E) -> bool {
        true
    }

    /// Called after an entity was inserted.
    fn after_add(&self, _entity: &E) {}

    /// Called before an entity is removed. Returning `false` vetoes the removal.
    fn before_remove(&self, _entity: &E) -> bool {
        true
    }

    /// Called after an entity was removed.
    fn after_remove(&self, _entity: &E) {}

    /// Called when an operation fails internally. `message` is the fixed
    /// per-operation description; `error` carries the detail.
    fn on_error(&self, _message: &str, _error: &StoreError) {}
}

/// Ordered, identity-deduped collection of aspects.
///
/// Registration order is invocation order. The registry lock is only held
/// for list maintenance; hook invocation works off a per-operation
/// [`snapshot`](AspectRegistry::snapshot), so registering or removing an
/// aspect mid-operation never skips or doubles a hook within that operation.
pub struct AspectRegistry<E> {
    inner: Mutex<Vec<Arc<dyn Aspect<E>>>>,
}

impl<E> AspectRegistry<E> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
        }
    }

    /// Register an aspect. Idempotent by identity: adding the same `Arc`
    /// twice keeps a single registration.
    pub fn add(&self, aspect: Arc<dyn Aspect<E>>) {
        if let Ok(mut aspects) = self.inner.lock() {
            if !aspects.iter().any(|a| Arc::ptr_eq(a, &aspect)) {
                aspects.push(aspect);
            }
        }
    }

    /// Remove an aspect by identity. No-op if it was never registered.
    pub fn remove(&self, aspect: &Arc<dyn Aspect<E>>) {
        if let Ok(mut aspects) = self.inner.lock() {
            aspects.retain(|a| !Arc::ptr_eq(a, aspect));
        }
    }

    /// Ordered snapshot of the current registrations.
    pub fn snapshot(&self) -> Vec<Arc<dyn Aspect<E>>> {
        self.inner.lock().map(|a| a.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E> Default for AspectRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for AspectRegistry<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AspectRegistry")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl Aspect<String> for Noop {}

    #[test]
    fn add_is_idempotent_by_identity() {
        let registry: AspectRegistry<String> = AspectRegistry::new();
        let aspect: Arc<dyn Aspect<String>> = Arc::new(Noop);

        registry.add(aspect.clone());
        registry.add(aspect.clone());

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn distinct_instances_are_distinct_registrations() {
        let registry: AspectRegistry<String> = AspectRegistry::new();
        registry.add(Arc::new(Noop));
        registry.add(Arc::new(Noop));

        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn remove_is_idempotent() {
        let registry: AspectRegistry<String> = AspectRegistry::new();
        let aspect: Arc<dyn Aspect<String>> = Arc::new(Noop);

        registry.add(aspect.clone());
        registry.remove(&aspect);
        registry.remove(&aspect);

        assert!(registry.is_empty());
    }

    #[test]
    fn snapshot_preserves_registration_order() {
        struct Tagged(u8);
        impl Aspect<String> for Tagged {}

        let registry: AspectRegistry<String> = AspectRegistry::new();
        let first: Arc<dyn Aspect<String>> = Arc::new(Tagged(1));
        let second: Arc<dyn Aspect<String>> = Arc::new(Tagged(2));
        registry.add(first.clone());
        registry.add(second.clone());

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(Arc::ptr_eq(&snapshot[0], &first));
        assert!(Arc::ptr_eq(&snapshot[1], &second));
    }
}
