//! Extension seam for resolving local misses.

use std::sync::Arc;

use crate::error::StoreError;

/// Resolves a key the local map does not contain.
///
/// A repository built with a miss handler consults it whenever `get` finds
/// nothing locally. `Ok(None)` is a normal miss; `Err` is routed to the
/// error hook of every registered aspect by the calling store. Whatever the
/// handler returns is handed to the caller as-is and never written back
/// into the local map.
pub trait MissHandler<K, E>: Send + Sync {
    fn fetch(&self, key: &K) -> Result<Option<E>, StoreError>;
}

impl<K, E, H> MissHandler<K, E> for Arc<H>
where
    H: MissHandler<K, E> + ?Sized,
{
    fn fetch(&self, key: &K) -> Result<Option<E>, StoreError> {
        (**self).fetch(key)
    }
}
