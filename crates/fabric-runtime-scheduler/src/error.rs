use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("the runtime has been torn down")]
    RuntimeTornDown,
    #[error("the runtime is already in use on this thread")]
    ReentrantAccess,
}
