//! # Plagiarism detector (`detector`)
//!
//! Given a stored submission and its task's [`SuspicionLevels`], the
//! [`PlagiarismDetector`] re-extracts the submission's snippets, looks every
//! selected fingerprint up in the task shard of the shared
//! [`SnippetIndex`](index::SnippetIndex) and sums the rarity weights per
//! other-author submission. Candidates below the faint threshold are
//! dropped; the rest come back strongest first as [`PlagiarismMatch`]es
//! with merged token ranges on both sides, ready for highlighting.
//!
//! Submissions by the checked submission's own author are never
//! candidates, so resubmissions do not look like copies.
//!
//! ## Observability
//!
//! Install a [`DetectorMetrics`] implementation via [`set_detector_metrics`]
//! to record per-check latency, candidate and match counts.

mod engine;
mod metrics;
mod types;

pub use crate::engine::{AnalyzedSubmission, PlagiarismDetector};
pub use crate::metrics::{set_detector_metrics, DetectorMetrics};
pub use crate::types::{DetectError, DetectorConfig, PlagiarismMatch, TokenRange};
pub use stats::{SuspicionLevel, SuspicionLevels};
