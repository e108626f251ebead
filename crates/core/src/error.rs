//! Store error model.

use thiserror::Error;

/// Fixed descriptions handed to aspect error hooks, one per operation.
pub(crate) const GET_FAILED: &str = "Could not get the entity from the repository";
pub(crate) const ADD_FAILED: &str = "Could not add the entity into the repository";
pub(crate) const REMOVE_FAILED: &str = "Could not remove the entity from the repository";

/// Operational failure inside the store pipeline.
///
/// `get`/`add`/`remove` never return these to the caller: failures are routed
/// to the error hook of every registered aspect and the operation returns its
/// "did not happen" sentinel (`None`/`false`). Diagnostic visibility is an
/// explicit opt-in via aspect registration. `update` is the one exception:
/// the capability gap is surfaced directly at the call site.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// `update` is a documented capability gap, not a data-dependent outcome.
    #[error("update is not implemented")]
    UpdateUnsupported,

    /// An internal lock was poisoned by a panicking writer.
    #[error("internal lock poisoned")]
    Poisoned,

    /// The miss handler failed while resolving a local miss.
    #[error("miss handler failed: {0}")]
    Fallback(String),
}
