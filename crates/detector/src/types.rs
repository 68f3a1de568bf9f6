use index::IndexError;
use serde::{Deserialize, Serialize};
use snippets::SnippetError;
use stats::{SearchPolicy, SuspicionLevel};
use submission::{AuthorId, SubmissionId};
use thiserror::Error;

/// Detector tuning, shared by every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Maximum number of matches returned per submission.
    #[serde(default = "DetectorConfig::default_max_results")]
    pub max_results: usize,
    /// Which fingerprints take part in the search. Must equal the policy
    /// the statistics were computed with.
    #[serde(flatten)]
    pub search: SearchPolicy,
}

impl DetectorConfig {
    pub(crate) fn default_max_results() -> usize {
        20
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_search(mut self, search: SearchPolicy) -> Self {
        self.search = search;
        self
    }

    pub fn validate(&self) -> Result<(), DetectError> {
        if self.max_results == 0 {
            return Err(DetectError::InvalidConfig(
                "max_results must be at least 1".into(),
            ));
        }
        if self.search.max_snippet_authors == Some(0) {
            return Err(DetectError::InvalidConfig(
                "max_snippet_authors must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_results: Self::default_max_results(),
            search: SearchPolicy::default(),
        }
    }
}

/// Half-open range `[start, end)` of token indices within a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenRange {
    pub start: usize,
    pub end: usize,
}

impl TokenRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A submission that shares enough rare snippets with the checked one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlagiarismMatch {
    pub submission_id: SubmissionId,
    pub matched_submission_id: SubmissionId,
    pub matched_author_id: AuthorId,
    pub weight: f64,
    pub suspicion: SuspicionLevel,
    /// Distinct fingerprints both submissions contain.
    pub shared_fingerprints: usize,
    /// Merged ranges of the checked submission covered by shared snippets.
    pub matched_token_ranges: Vec<TokenRange>,
    /// The same, inside the matched submission.
    pub matched_token_ranges_in_other: Vec<TokenRange>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectError {
    #[error("invalid detector config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Snippet(#[from] SnippetError),
    #[error(transparent)]
    Index(#[from] IndexError),
}
