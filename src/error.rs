use detector::DetectError;
use index::IndexError;
use stats::StatsError;
use submission::{IntakeError, StoreError};
use thiserror::Error;

use crate::config::ConfigLoadError;

/// Errors surfaced by [`AntiPlagiarism`](crate::AntiPlagiarism).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigLoadError),

    #[error("rejected submission: {0}")]
    Intake(#[from] IntakeError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("statistics error: {0}")]
    Stats(#[from] StatsError),

    #[error("detector error: {0}")]
    Detect(#[from] DetectError),

    #[error("invalid last_n {value}: expected a value between 1 and {max}")]
    InvalidLastSubmissionsCount { value: usize, max: usize },
}

impl ServiceError {
    /// The request named something that does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            ServiceError::Store(e) => e.is_not_found(),
            ServiceError::Index(e) => e.is_not_found(),
            ServiceError::Stats(StatsError::Store(e)) => e.is_not_found(),
            ServiceError::Stats(StatsError::Index(e)) => e.is_not_found(),
            ServiceError::Stats(StatsError::UnknownStartTask(_)) => true,
            _ => false,
        }
    }

    /// The caller sent something invalid; retrying unchanged will not help.
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            ServiceError::Intake(_) | ServiceError::InvalidLastSubmissionsCount { .. }
        )
    }
}
