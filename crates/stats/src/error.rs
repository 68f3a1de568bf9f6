use index::IndexError;
use submission::{StoreError, TaskId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("task {0} has no indexed submissions")]
    NoSubmissions(TaskId),
    /// `From(task)` named a task the sweep does not know.
    #[error("task {0} is not in the sweep's task list")]
    UnknownStartTask(TaskId),
    #[error("invalid suspicion config: {0}")]
    InvalidSuspicionConfig(String),
    #[error("statistics snapshot lock is poisoned")]
    Poisoned,
}

impl StatsError {
    /// The task has nothing to compute, as opposed to a failed computation.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            StatsError::NoSubmissions(_) | StatsError::Index(IndexError::TaskNotFound(_))
        )
    }
}
