//! External mirrors of the store's contents.
//!
//! A persistent deployment copies every mutation into independent external
//! stores (for example one relational table and one document collection).
//! Writes to the mirrors are best-effort: they happen after the in-memory
//! mutation has committed, a failing mirror is only logged, and nothing
//! reconciles mirrors that drift apart.

use crate::types::{Status, Todo};

/// A committed mutation, in the order the store applied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorEvent {
    Inserted(Todo),
    StatusChanged { id: u64, status: Status },
    Removed { id: u64 },
}

#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    #[error("mirror unavailable: {0}")]
    Unavailable(String),

    #[error("mirror rejected write: {0}")]
    Rejected(String),
}

/// Sink that receives every committed store mutation.
///
/// `apply` is called while the store's write lock is held, so
/// implementations must not call back into the store.
pub trait TodoMirror: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &str;

    fn apply(&self, event: &MirrorEvent) -> Result<(), MirrorError>;
}
