//! # Task statistics
//!
//! Every fingerprint of a task weighs `1 / distinct authors` holding it.
//! The pair weight of two submissions by different authors is the sum of
//! weights over the distinct fingerprints they share, and a submission's
//! risk score is its largest pair weight. [`StatisticsEngine`] computes the
//! scores of a task, keeps their population mean and deviation in
//! [`StatisticsSnapshots`], and [`SuspicionPolicy`] turns those into the
//! faint/strong thresholds used to flag matches.
//!
//! ```
//! use std::sync::Arc;
//! use index::SnippetIndex;
//! use stats::{SearchPolicy, StatisticsEngine, StatisticsSnapshots, SuspicionConfig};
//! use submission::TaskId;
//!
//! let engine = StatisticsEngine::new(
//!     Arc::new(SnippetIndex::new()),
//!     Arc::new(StatisticsSnapshots::in_memory()),
//!     SearchPolicy::default(),
//! );
//! let task = TaskId::new_random();
//! // Nothing indexed yet: no statistics, so no thresholds either.
//! assert!(engine.recalculate_task(task).unwrap_err().is_skip());
//! let policy = SuspicionConfig::default().validate().unwrap();
//! let snapshot = engine.snapshots().get(task).unwrap();
//! assert!(policy.levels(snapshot.as_deref()).levels().is_none());
//! ```

mod engine;
mod error;
mod snapshot;
pub mod suspicion;
mod weights;

pub use crate::engine::{
    mean_and_deviation, StatisticsEngine, SweepReport, SweepSelection, TaskFailure, TaskStatistics,
};
pub use crate::error::StatsError;
pub use crate::snapshot::{StatisticsSnapshots, TaskStatisticsParameters};
pub use crate::suspicion::{
    LevelBounds, SuspicionConfig, SuspicionLevel, SuspicionLevels, SuspicionOutcome, SuspicionPolicy,
};
pub use crate::weights::{accumulate_pair_weights, fingerprint_weight, SearchPolicy, WeightedFingerprint};
