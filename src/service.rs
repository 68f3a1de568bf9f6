use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use detector::PlagiarismDetector;
use index::{IndexError, SnippetIndex, TaskEntry};
use rayon::prelude::*;
use stats::{
    StatisticsEngine, StatisticsSnapshots, SuspicionLevels, SuspicionOutcome, SuspicionPolicy,
    SweepReport, SweepSelection,
};
use submission::{
    prepare, AuthorId, NewSubmission, StorageBackend, Submission, SubmissionId,
    SubmissionRepository, TaskId,
};
use tokenize::positions_of;
use tracing::{debug, info, info_span};

use crate::config::AntiplagConfig;
use crate::error::ServiceError;
use crate::report::{
    AddedSubmission, AnalyzedCodeUnit, AuthorPlagiarisms, RebuildReport, ResearchedSubmission,
    SubmissionInfo, SubmissionPlagiarisms,
};

/// The anti-plagiarism service: storage, index, statistics and detector
/// wired together.
///
/// All operations take `&self`; the service can be shared across threads
/// behind an `Arc`.
pub struct AntiPlagiarism {
    config: AntiplagConfig,
    repository: SubmissionRepository,
    index: Arc<SnippetIndex>,
    engine: StatisticsEngine,
    detector: PlagiarismDetector,
    suspicion: SuspicionPolicy,
}

impl AntiPlagiarism {
    /// Build the storage backend, reload statistics snapshots and index
    /// every stored submission.
    pub fn open(config: AntiplagConfig) -> Result<Self, ServiceError> {
        config.validate()?;
        let suspicion = config.statistics.validate()?;
        let backend: Arc<dyn StorageBackend> = Arc::from(config.storage.backend.build()?);
        let compression = config.storage.compression();

        let repository = SubmissionRepository::open(Arc::clone(&backend), compression)?;
        let snapshots = Arc::new(StatisticsSnapshots::open(backend, compression)?);
        let index = Arc::new(SnippetIndex::new());
        let detector = PlagiarismDetector::new(
            Arc::clone(&index),
            config.snippets.clone(),
            config.detector,
        )?;
        let engine = StatisticsEngine::new(Arc::clone(&index), snapshots, config.detector.search);

        let service = Self {
            config,
            repository,
            index,
            engine,
            detector,
            suspicion,
        };

        let span = info_span!("reindex_on_open");
        let _guard = span.enter();
        let mut submissions = 0;
        let tasks = service.repository.task_ids()?;
        for task in &tasks {
            submissions += service.reindex_task(*task)?.len();
        }
        info!(tasks = tasks.len(), submissions, "service_opened");
        Ok(service)
    }

    /// Open with the default configuration: in-memory storage.
    pub fn in_memory() -> Result<Self, ServiceError> {
        Self::open(AntiplagConfig::default())
    }

    pub fn config(&self) -> &AntiplagConfig {
        &self.config
    }

    pub fn repository(&self) -> &SubmissionRepository {
        &self.repository
    }

    pub fn index(&self) -> &Arc<SnippetIndex> {
        &self.index
    }

    pub fn detector(&self) -> &PlagiarismDetector {
        &self.detector
    }

    /// Validate and store a submission. It is not indexed yet.
    pub fn add_submission(&self, new: NewSubmission) -> Result<AddedSubmission, ServiceError> {
        let prepared = prepare(new, &self.config.submissions)?;
        let stored = self.repository.add(prepared)?;
        info!(
            submission_id = %stored.id,
            task_id = %stored.task_id,
            author_id = %stored.author_id,
            language = %stored.language,
            tokens = stored.tokens_count,
            "submission_added"
        );
        Ok(AddedSubmission {
            submission_id: stored.id,
            tokens_count: stored.tokens_count,
        })
    }

    /// Extract and index the snippets of a stored submission.
    pub fn index_submission(&self, id: SubmissionId) -> Result<usize, ServiceError> {
        let submission = self.repository.get(id)?;
        self.index_submission_record(&submission)
    }

    /// Returns the number of distinct fingerprints indexed.
    ///
    /// A submission the task shard already holds, e.g. one picked up by the
    /// reindex in [`Self::open`], is left as is and reported again.
    pub fn index_submission_record(&self, submission: &Submission) -> Result<usize, ServiceError> {
        let analyzed = self.detector.analyze(&submission.code, submission.language)?;
        let inserted = self.index.insert(
            submission.task_id,
            submission.id,
            submission.author_id,
            &analyzed.snippets,
        );
        let distinct = match inserted {
            Ok(distinct) => distinct,
            Err(IndexError::AlreadyIndexed { submission: id, .. }) if id == submission.id => {
                let distinct = self.index.with_task(submission.task_id, |shard| {
                    shard.submission(id).map_or(0, |entry| entry.fingerprints.len())
                })?;
                debug!(
                    submission_id = %submission.id,
                    task_id = %submission.task_id,
                    "submission_already_indexed"
                );
                return Ok(distinct);
            }
            Err(e) => return Err(e.into()),
        };
        info!(
            submission_id = %submission.id,
            task_id = %submission.task_id,
            snippets = analyzed.snippets.len(),
            distinct_fingerprints = distinct,
            "submission_indexed"
        );
        Ok(distinct)
    }

    // Storage is read under the shard write lock, so a concurrent
    // `index_submission` is either part of the stored set or lands after
    // the swap.
    fn reindex_task(&self, task: TaskId) -> Result<Vec<SubmissionId>, ServiceError> {
        let mut ids = Vec::new();
        self.index.rebuild_task_with(task, || {
            let submissions = self.repository.submissions_by_task(task)?;
            let entries = submissions
                .iter()
                .map(|s| -> Result<TaskEntry, ServiceError> {
                    let analyzed = self.detector.analyze(&s.code, s.language)?;
                    Ok(TaskEntry {
                        submission_id: s.id,
                        author_id: s.author_id,
                        snippets: analyzed.snippets,
                    })
                })
                .collect::<Result<Vec<_>, ServiceError>>()?;
            ids = entries.iter().map(|e| e.submission_id).collect();
            Ok::<_, ServiceError>(entries)
        })?;
        Ok(ids)
    }

    /// Re-extract every stored submission of the task, replace its index
    /// shard and recalculate its statistics.
    pub fn rebuild_task_snippets(&self, task: TaskId) -> Result<RebuildReport, ServiceError> {
        let span = info_span!("rebuild_task_snippets", task_id = %task);
        let _guard = span.enter();

        let submission_ids = self.reindex_task(task)?;
        let statistics = match self.engine.recalculate_task(task) {
            Ok(stats) => Some(stats),
            Err(e) if e.is_skip() => None,
            Err(e) => return Err(e.into()),
        };
        info!(
            task_id = %task,
            submissions = submission_ids.len(),
            "task_snippets_rebuilt"
        );
        Ok(RebuildReport {
            task_id: task,
            submission_ids,
            statistics,
        })
    }

    /// Recalculate statistics for the selected tasks, in stored task order.
    pub fn recalculate_task_statistics(
        &self,
        selection: SweepSelection,
        cancel: &AtomicBool,
    ) -> Result<SweepReport, ServiceError> {
        let tasks = self.repository.task_ids()?;
        Ok(self.engine.sweep(&tasks, selection, cancel)?)
    }

    /// Current thresholds of the task.
    pub fn suspicion_levels(&self, task: TaskId) -> Result<SuspicionOutcome, ServiceError> {
        let snapshot = self.engine.snapshots().get(task)?;
        Ok(self.suspicion.levels(snapshot.as_deref()))
    }

    fn research(
        &self,
        submission: &Submission,
        levels: &SuspicionLevels,
    ) -> Result<ResearchedSubmission, ServiceError> {
        let analyzed = self.detector.analyze(&submission.code, submission.language)?;
        let plagiarisms = self
            .detector
            .get_plagiarisms_analyzed(submission, &analyzed, levels)?;
        Ok(ResearchedSubmission {
            submission: SubmissionInfo::from(submission),
            plagiarisms,
            tokens_positions: positions_of(&analyzed.units),
            analyzed_code_units: analyzed.units.iter().map(AnalyzedCodeUnit::from).collect(),
        })
    }

    /// Matches of one stored submission within its task.
    pub fn get_submission_plagiarisms(
        &self,
        id: SubmissionId,
    ) -> Result<SubmissionPlagiarisms, ServiceError> {
        let submission = self.repository.get(id)?;
        match self.suspicion_levels(submission.task_id)? {
            SuspicionOutcome::InsufficientData => Ok(SubmissionPlagiarisms::InsufficientData {
                submission: SubmissionInfo::from(&submission),
            }),
            SuspicionOutcome::Levels(levels) => Ok(SubmissionPlagiarisms::Checked {
                suspicion_levels: levels,
                researched: self.research(&submission, &levels)?,
            }),
        }
    }

    /// Matches of the author's `last_n` latest submissions to the task.
    pub fn get_author_plagiarisms(
        &self,
        author: AuthorId,
        task: TaskId,
        last_n: usize,
    ) -> Result<AuthorPlagiarisms, ServiceError> {
        let max = self.config.author_plagiarisms.max_last_submissions;
        if last_n == 0 || last_n > max {
            return Err(ServiceError::InvalidLastSubmissionsCount { value: last_n, max });
        }

        let levels = match self.suspicion_levels(task)? {
            SuspicionOutcome::Levels(levels) => levels,
            SuspicionOutcome::InsufficientData => return Ok(AuthorPlagiarisms::InsufficientData),
        };
        let submissions = self.repository.last_by_author(task, author, last_n)?;
        let researched_submissions = submissions
            .par_iter()
            .map(|s| self.research(s, &levels))
            .collect::<Result<Vec<_>, ServiceError>>()?;

        info!(
            author_id = %author,
            task_id = %task,
            submissions = researched_submissions.len(),
            "author_plagiarisms_checked"
        );
        Ok(AuthorPlagiarisms::Checked {
            suspicion_levels: levels,
            researched_submissions,
        })
    }
}
