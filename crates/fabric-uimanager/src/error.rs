use fabric_core::{CommitError, SurfaceId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UIManagerError {
    #[error("component {0:?} is not registered")]
    UnknownComponent(String),
    #[error("surface {0} is not running")]
    SurfaceNotRunning(SurfaceId),
    #[error("surface {0} is already running")]
    SurfaceAlreadyRunning(SurfaceId),
    #[error(transparent)]
    Commit(#[from] CommitError),
    #[error("state update for a node that no longer exists")]
    StateFamilyGone,
}
