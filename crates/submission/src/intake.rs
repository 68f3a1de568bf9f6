//! Validation of new submissions before they are stored.

use serde::{Deserialize, Serialize};
use tokenize::Language;

use crate::error::IntakeError;
use crate::model::{AuthorId, NewSubmission, TaskId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Longest accepted source text, in chars.
    #[serde(default = "default_max_code_length")]
    pub max_code_length: usize,
}

fn default_max_code_length() -> usize {
    60_000
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_code_length: default_max_code_length(),
        }
    }
}

impl IntakeConfig {
    pub fn validate(&self) -> Result<(), IntakeError> {
        if self.max_code_length == 0 {
            return Err(IntakeError::InvalidMaxCodeLength);
        }
        Ok(())
    }
}

/// A new submission that passed intake, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedSubmission {
    pub task_id: TaskId,
    pub author_id: AuthorId,
    pub language: Language,
    pub code: String,
    pub tokens_count: usize,
    pub additional_info: Option<String>,
}

/// Check size and language, then count tokens.
pub fn prepare(new: NewSubmission, cfg: &IntakeConfig) -> Result<PreparedSubmission, IntakeError> {
    let length = new.code.chars().count();
    if length > cfg.max_code_length {
        return Err(IntakeError::CodeTooLong {
            length,
            max: cfg.max_code_length,
        });
    }
    let language: Language = new.language.parse()?;
    let tokens_count = tokenize::tokens_count(&new.code, language);

    Ok(PreparedSubmission {
        task_id: new.task_id,
        author_id: new.author_id,
        language,
        code: new.code,
        tokens_count,
        additional_info: new.additional_info,
    })
}
