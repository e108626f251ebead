//! `stowage-core` — generic, thread-safe, in-memory entity store.
//!
//! A [`Repository`] keeps a keyed collection of caller-chosen entities,
//! exposes CRUD-style operations, and drives an extensible interception
//! pipeline ([`Aspect`]) plus synchronous change notification
//! ([`ChangeEvent`]). The [`MissHandler`] seam lets specializations (such as
//! `stowage-rest`) resolve local misses elsewhere.

pub mod aspect;
pub mod error;
pub mod event;
pub mod fallback;
pub mod store;

pub use aspect::{Aspect, AspectRegistry};
pub use error::StoreError;
pub use event::{ChangeAction, ChangeEvent, SubscriberId};
pub use fallback::MissHandler;
pub use store::Repository;
