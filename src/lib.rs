//! # antiplag
//!
//! Source-code plagiarism detection for programming courses.
//!
//! Submissions are grouped by task. Each one is split into code units,
//! tokenized, and cut into fixed-length token windows whose fingerprints go
//! into a task-sharded index. A fingerprint weighs more the fewer authors
//! share it; summing the weights of shared fingerprints ranks candidate
//! sources, and per-task statistics of those sums decide which matches are
//! faintly or strongly suspicious.
//!
//! [`AntiPlagiarism`] wires the component crates together:
//!
//! - `tokenize`: languages, tokens and code units
//! - `snippets`: token windows and fingerprints
//! - `submission`: intake validation and storage
//! - `index`: task-sharded fingerprint occurrences
//! - `stats`: rarity weights, task statistics and suspicion levels
//! - `detector`: ranked matches with token ranges
//!
//! ```
//! use antiplag::{AntiPlagiarism, AuthorId, NewSubmission, SubmissionPlagiarisms, TaskId};
//!
//! let service = AntiPlagiarism::in_memory().unwrap();
//! let task = TaskId::new_random();
//! let added = service
//!     .add_submission(NewSubmission {
//!         task_id: task,
//!         author_id: AuthorId::new_random(),
//!         language: "python".into(),
//!         code: "def add(a, b):\n    return a + b\n".into(),
//!         additional_info: None,
//!     })
//!     .unwrap();
//! service.index_submission(added.submission_id).unwrap();
//!
//! // No statistics for the task yet.
//! let report = service.get_submission_plagiarisms(added.submission_id).unwrap();
//! assert!(matches!(report, SubmissionPlagiarisms::InsufficientData { .. }));
//! ```

pub mod config;
mod error;
mod report;
mod service;

pub use crate::config::{
    AntiplagConfig, AuthorPlagiarismsConfig, ConfigLoadError, LoggingConfig, StorageConfig,
};
pub use crate::error::ServiceError;
pub use crate::report::{
    AddedSubmission, AnalyzedCodeUnit, AuthorPlagiarisms, RebuildReport, ResearchedSubmission,
    SubmissionInfo, SubmissionPlagiarisms,
};
pub use crate::service::AntiPlagiarism;

pub use detector::{DetectorConfig, PlagiarismMatch, SuspicionLevel, SuspicionLevels, TokenRange};
pub use stats::{SuspicionOutcome, SweepReport, SweepSelection, TaskStatistics};
pub use submission::{AuthorId, NewSubmission, Submission, SubmissionId, TaskId};
pub use tokenize::Language;
