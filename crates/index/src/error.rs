use submission::{SubmissionId, TaskId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("task {0} has no indexed submissions")]
    TaskNotFound(TaskId),
    #[error("submission {submission} is not indexed in task {task}")]
    SubmissionNotFound {
        task: TaskId,
        submission: SubmissionId,
    },
    #[error("submission {submission} is already indexed in task {task}")]
    AlreadyIndexed {
        task: TaskId,
        submission: SubmissionId,
    },
    /// A writer panicked while holding the shard lock.
    #[error("index shard for task {0} is poisoned")]
    Poisoned(TaskId),
}

impl IndexError {
    /// "Nothing to report" rather than "index broken".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            IndexError::TaskNotFound(_) | IndexError::SubmissionNotFound { .. }
        )
    }
}
