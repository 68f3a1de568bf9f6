//! Response shapes of the service operations. All of them serialize to the
//! JSON the CLI prints.

use chrono::{DateTime, Utc};
use detector::PlagiarismMatch;
use serde::{Deserialize, Serialize};
use stats::{SuspicionLevels, TaskStatistics};
use submission::{AuthorId, Submission, SubmissionId, TaskId};
use tokenize::{CodeUnit, Language, TokenPosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddedSubmission {
    pub submission_id: SubmissionId,
    pub tokens_count: usize,
}

/// A stored submission as reported back to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionInfo {
    pub id: SubmissionId,
    pub task_id: TaskId,
    pub author_id: AuthorId,
    pub language: Language,
    pub code: String,
    pub tokens_count: usize,
    pub added_at: DateTime<Utc>,
    pub additional_info: Option<String>,
}

impl From<&Submission> for SubmissionInfo {
    fn from(s: &Submission) -> Self {
        Self {
            id: s.id,
            task_id: s.task_id,
            author_id: s.author_id,
            language: s.language,
            code: s.code.clone(),
            tokens_count: s.tokens_count,
            added_at: s.added_at,
            additional_info: s.additional_info.clone(),
        }
    }
}

/// A code unit the detector looked at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedCodeUnit {
    pub name: String,
    pub first_token_index: usize,
    pub tokens_count: usize,
}

impl From<&CodeUnit> for AnalyzedCodeUnit {
    fn from(unit: &CodeUnit) -> Self {
        Self {
            name: unit.path.to_string(),
            first_token_index: unit.first_token_index,
            tokens_count: unit.len(),
        }
    }
}

/// One submission checked against its task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchedSubmission {
    pub submission: SubmissionInfo,
    pub plagiarisms: Vec<PlagiarismMatch>,
    pub tokens_positions: Vec<TokenPosition>,
    pub analyzed_code_units: Vec<AnalyzedCodeUnit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionPlagiarisms {
    Checked {
        suspicion_levels: SuspicionLevels,
        #[serde(flatten)]
        researched: ResearchedSubmission,
    },
    /// The task has no statistics yet.
    InsufficientData { submission: SubmissionInfo },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuthorPlagiarisms {
    Checked {
        suspicion_levels: SuspicionLevels,
        /// Newest submission first.
        researched_submissions: Vec<ResearchedSubmission>,
    },
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebuildReport {
    pub task_id: TaskId,
    pub submission_ids: Vec<SubmissionId>,
    /// `None` when the task has nothing indexed after the rebuild.
    pub statistics: Option<TaskStatistics>,
}
