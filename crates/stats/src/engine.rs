use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use hashbrown::HashMap;
use index::SnippetIndex;
use serde::{Deserialize, Serialize};
use submission::TaskId;
use tracing::{info, info_span, warn};

use crate::error::StatsError;
use crate::snapshot::{StatisticsSnapshots, TaskStatisticsParameters};
use crate::weights::{accumulate_pair_weights, SearchPolicy};

/// Result of recalculating one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatistics {
    pub task_id: TaskId,
    pub mean: f64,
    pub deviation: f64,
    /// Risk score of every indexed submission, ascending.
    pub scores: Vec<f64>,
}

/// Which tasks a sweep visits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepSelection {
    All,
    Single(TaskId),
    /// Resume: the named task and everything after it in the task order.
    From(TaskId),
    Tasks(Vec<TaskId>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    pub task_id: TaskId,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub completed: Vec<TaskStatistics>,
    /// Tasks with no indexed submissions.
    pub skipped: Vec<TaskId>,
    pub failed: Vec<TaskFailure>,
    /// The sweep stopped before visiting every selected task.
    pub cancelled: bool,
}

/// Population mean and standard deviation; `(0, 0)` for no values.
pub fn mean_and_deviation(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Computes per-task score distributions from the snippet index.
#[derive(Debug, Clone)]
pub struct StatisticsEngine {
    index: Arc<SnippetIndex>,
    snapshots: Arc<StatisticsSnapshots>,
    policy: SearchPolicy,
}

impl StatisticsEngine {
    pub fn new(
        index: Arc<SnippetIndex>,
        snapshots: Arc<StatisticsSnapshots>,
        policy: SearchPolicy,
    ) -> Self {
        Self {
            index,
            snapshots,
            policy,
        }
    }

    pub fn snapshots(&self) -> &Arc<StatisticsSnapshots> {
        &self.snapshots
    }

    pub fn policy(&self) -> SearchPolicy {
        self.policy
    }

    /// Risk score of every submission of the task, in submission id order.
    ///
    /// Runs under the shard's read lock, so the scores describe one state of
    /// the task.
    pub fn task_scores(&self, task: TaskId) -> Result<Vec<f64>, StatsError> {
        let scores = self.index.with_task(task, |shard| {
            let mut acc = HashMap::new();
            let mut scores = Vec::with_capacity(shard.len());
            for (id, entry) in shard.submissions() {
                acc.clear();
                let selected =
                    self.policy
                        .select(shard, entry.author_id, entry.fingerprints.iter().copied());
                accumulate_pair_weights(shard, id, entry.author_id, &selected, &mut acc);
                scores.push(acc.values().copied().fold(0.0, f64::max));
            }
            scores
        })?;
        if scores.is_empty() {
            return Err(StatsError::NoSubmissions(task));
        }
        Ok(scores)
    }

    /// Recompute and publish the task's statistics.
    pub fn recalculate_task(&self, task: TaskId) -> Result<TaskStatistics, StatsError> {
        let started = Instant::now();
        let mut scores = self.task_scores(task)?;
        let (mean, deviation) = mean_and_deviation(&scores);
        scores.sort_unstable_by(f64::total_cmp);

        self.snapshots.replace(TaskStatisticsParameters {
            task_id: task,
            mean,
            deviation,
            submissions_count: scores.len(),
            computed_at: Utc::now(),
        })?;

        info!(
            task_id = %task,
            submissions = scores.len(),
            mean,
            deviation,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "task_statistics_recalculated"
        );
        Ok(TaskStatistics {
            task_id: task,
            mean,
            deviation,
            scores,
        })
    }

    /// Recalculate a selection of `tasks` (the full task list, in order).
    ///
    /// `cancel` is checked before each task. One task failing does not stop
    /// the others.
    pub fn sweep(
        &self,
        tasks: &[TaskId],
        selection: SweepSelection,
        cancel: &AtomicBool,
    ) -> Result<SweepReport, StatsError> {
        let selected: Vec<TaskId> = match selection {
            SweepSelection::All => tasks.to_vec(),
            SweepSelection::Single(task) => vec![task],
            SweepSelection::From(task) => {
                let start = tasks
                    .iter()
                    .position(|t| *t == task)
                    .ok_or(StatsError::UnknownStartTask(task))?;
                tasks[start..].to_vec()
            }
            SweepSelection::Tasks(list) => list,
        };

        let span = info_span!("statistics_sweep", tasks = selected.len());
        let _guard = span.enter();

        let mut report = SweepReport::default();
        let total = selected.len();
        for (i, task) in selected.into_iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                info!(processed = i, total, "statistics_sweep_cancelled");
                report.cancelled = true;
                break;
            }
            match self.recalculate_task(task) {
                Ok(stats) => report.completed.push(stats),
                Err(e) if e.is_skip() => report.skipped.push(task),
                Err(e) => {
                    warn!(task_id = %task, error = %e, "task_statistics_failed");
                    report.failed.push(TaskFailure {
                        task_id: task,
                        error: e.to_string(),
                    });
                }
            }
        }
        info!(
            completed = report.completed.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            cancelled = report.cancelled,
            "statistics_sweep_finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests;
