//! `stowage-rest` — REST-backed miss resolution for `stowage-core`.
//!
//! A repository wired with a [`RestMissHandler`] resolves local misses with
//! `GET {endpoint}/{key}` against an external collaborator and hands back
//! whatever entity the response body deserializes to.

pub mod handler;

pub use handler::{RestConfig, RestMissHandler, rest_repository};
