use bincode::error::{DecodeError, EncodeError};
use thiserror::Error;
use tokenize::TokenizeError;

use crate::model::SubmissionId;

/// Storage-level failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("serialization encode error: {0}")]
    Encode(String),
    #[error("serialization decode error: {0}")]
    Decode(String),
    #[error("compression error: {0}")]
    Zstd(String),
    #[error("malformed key {0:?}")]
    MalformedKey(String),
    #[error("submission {0} not found")]
    SubmissionNotFound(SubmissionId),
}

impl From<EncodeError> for StoreError {
    fn from(e: EncodeError) -> Self {
        StoreError::Encode(e.to_string())
    }
}

impl From<DecodeError> for StoreError {
    fn from(e: DecodeError) -> Self {
        StoreError::Decode(e.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Zstd(e.to_string())
    }
}

impl StoreError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }

    /// Whether the error means "nothing there" rather than a broken store.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::SubmissionNotFound(_))
    }
}

/// Rejections of a new submission before anything is stored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntakeError {
    #[error(transparent)]
    UnsupportedLanguage(#[from] TokenizeError),
    #[error("code is too long: {length} chars, maximum is {max}")]
    CodeTooLong { length: usize, max: usize },
    #[error("invalid config: max_code_length must be >= 1")]
    InvalidMaxCodeLength,
}
