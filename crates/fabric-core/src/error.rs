use thiserror::Error;

use crate::family::{SurfaceId, Tag};

/// Why a commit did not install a new revision. Only `StaleRevision` is part
/// of normal operation: the caller recomputes against the current revision.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    #[error("surface {surface_id}: commit based on revision {base} but revision {current} is current")]
    StaleRevision {
        surface_id: SurfaceId,
        base: u64,
        current: u64,
    },
    #[error("surface {0}: commit cancelled by its transaction")]
    Cancelled(SurfaceId),
    #[error("surface {0} is stopped")]
    Stopped(SurfaceId),
    #[error("surface {surface_id}: commit still stale after {attempts} attempts")]
    RetryLimitExceeded { surface_id: SurfaceId, attempts: usize },
}

/// A mutation that the stub host hierarchy refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StubViewTreeError {
    #[error("create: view {0} already exists")]
    AlreadyExists(Tag),
    #[error("view {0} does not exist")]
    Missing(Tag),
    #[error("delete: view {0} is still attached to {1}")]
    DeleteAttached(Tag, Tag),
    #[error("insert: view {child} is already attached to {parent}")]
    AlreadyAttached { child: Tag, parent: Tag },
    #[error("insert: index {index} is out of bounds for {parent} with {len} children")]
    InsertOutOfBounds { parent: Tag, index: usize, len: usize },
    #[error("remove: expected {child} at index {index} of {parent}, found {found:?}")]
    RemoveMismatch {
        parent: Tag,
        child: Tag,
        index: usize,
        found: Option<Tag>,
    },
}
