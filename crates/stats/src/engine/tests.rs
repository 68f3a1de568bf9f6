use super::*;
use snippets::{extract_snippets, SnippetConfig};
use std::sync::Mutex;
use submission::{AuthorId, CompressionConfig, InMemoryBackend, StorageBackend, StoreError, SubmissionId};
use tokenize::{extract_code_units, Language};

use crate::suspicion::SuspicionConfig;

const COPY: &str = "a b c d e f";
const LOOP: &str = "while i < 10: i += 1";

fn index_code(index: &SnippetIndex, task: TaskId, id: u64, author: AuthorId, code: &str) {
    let units = extract_code_units(code, Language::Python);
    let cfg = SnippetConfig::default().with_window(5);
    let snippets = extract_snippets(&units, &cfg).unwrap();
    index.insert(task, SubmissionId(id), author, &snippets).unwrap();
}

fn engine(index: Arc<SnippetIndex>) -> StatisticsEngine {
    StatisticsEngine::new(index, Arc::new(StatisticsSnapshots::in_memory()), SearchPolicy::default())
}

#[test]
fn population_mean_and_deviation() {
    assert_eq!(mean_and_deviation(&[]), (0.0, 0.0));
    let (mean, dev) = mean_and_deviation(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
    assert_eq!(mean, 5.0);
    assert_eq!(dev, 2.0);
}

#[test]
fn copies_raise_scores_and_publish_snapshot() {
    let index = Arc::new(SnippetIndex::new());
    let task = TaskId::new_random();
    index_code(&index, task, 1, AuthorId::new_random(), COPY);
    index_code(&index, task, 2, AuthorId::new_random(), COPY);
    index_code(&index, task, 3, AuthorId::new_random(), LOOP);
    let engine = engine(index);

    let stats = engine.recalculate_task(task).unwrap();
    // two exact windows plus one structure window (all identifiers look
    // alike), each held by two authors
    assert_eq!(stats.scores, vec![0.0, 1.5, 1.5]);
    assert!((stats.mean - 1.0).abs() < 1e-12);
    assert!((stats.deviation - 0.5f64.sqrt()).abs() < 1e-12);

    let snapshot = engine.snapshots().get(task).unwrap().unwrap();
    assert_eq!(snapshot.submissions_count, 3);
    assert_eq!(snapshot.mean, stats.mean);
}

#[test]
fn same_author_resubmission_scores_zero() {
    let index = Arc::new(SnippetIndex::new());
    let task = TaskId::new_random();
    let author = AuthorId::new_random();
    index_code(&index, task, 1, author, COPY);
    index_code(&index, task, 2, author, COPY);

    let stats = engine(index).recalculate_task(task).unwrap();
    assert_eq!(stats.scores, vec![0.0, 0.0]);
}

#[test]
fn dissimilar_submissions_put_thresholds_at_minimum() {
    let index = Arc::new(SnippetIndex::new());
    let task = TaskId::new_random();
    index_code(&index, task, 1, AuthorId::new_random(), COPY);
    index_code(&index, task, 2, AuthorId::new_random(), LOOP);
    index_code(&index, task, 3, AuthorId::new_random(), "return x * 2 if y else z - 4");
    let engine = engine(index);

    let stats = engine.recalculate_task(task).unwrap();
    assert_eq!(stats.mean, 0.0);

    let policy = SuspicionConfig::default().validate().unwrap();
    let snapshot = engine.snapshots().get(task).unwrap();
    let levels = policy.levels(snapshot.as_deref()).levels().unwrap();
    assert_eq!(levels.faint, policy.config().faint.min);
    assert_eq!(levels.strong, policy.config().strong.min);
}

#[test]
fn recalculation_is_repeatable() {
    let index = Arc::new(SnippetIndex::new());
    let task = TaskId::new_random();
    for (i, code) in [COPY, COPY, LOOP, COPY].iter().enumerate() {
        index_code(&index, task, i as u64 + 1, AuthorId::new_random(), code);
    }
    let engine = engine(index);
    let first = engine.recalculate_task(task).unwrap();
    let second = engine.recalculate_task(task).unwrap();
    assert_eq!(first, second);
}

#[test]
fn unknown_task_is_skipped_by_sweep() {
    let engine = engine(Arc::new(SnippetIndex::new()));
    let task = TaskId::new_random();
    let err = engine.recalculate_task(task).unwrap_err();
    assert!(err.is_skip());

    let report = engine
        .sweep(&[], SweepSelection::Single(task), &AtomicBool::new(false))
        .unwrap();
    assert_eq!(report.skipped, vec![task]);
    assert!(report.completed.is_empty());
}

#[test]
fn sweep_from_resumes_in_task_order() {
    let index = Arc::new(SnippetIndex::new());
    let tasks: Vec<TaskId> = (0..3).map(|_| TaskId::new_random()).collect();
    for task in &tasks {
        index_code(&index, *task, 1, AuthorId::new_random(), COPY);
    }
    let engine = engine(index);

    let report = engine
        .sweep(&tasks, SweepSelection::From(tasks[1]), &AtomicBool::new(false))
        .unwrap();
    let done: Vec<TaskId> = report.completed.iter().map(|s| s.task_id).collect();
    assert_eq!(done, vec![tasks[1], tasks[2]]);

    let err = engine
        .sweep(&tasks, SweepSelection::From(TaskId::new_random()), &AtomicBool::new(false))
        .unwrap_err();
    assert!(matches!(err, StatsError::UnknownStartTask(_)));
}

#[test]
fn cancelled_sweep_stops_before_next_task() {
    let index = Arc::new(SnippetIndex::new());
    let task = TaskId::new_random();
    index_code(&index, task, 1, AuthorId::new_random(), COPY);
    let engine = engine(index);

    let report = engine
        .sweep(&[task], SweepSelection::All, &AtomicBool::new(true))
        .unwrap();
    assert!(report.cancelled);
    assert!(report.completed.is_empty());
    assert!(engine.snapshots().get(task).unwrap().is_none());
}

/// Refuses writes for one task's statistics.
struct FailingBackend {
    inner: InMemoryBackend,
    poisoned_key: Mutex<String>,
}

impl StorageBackend for FailingBackend {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        if *self.poisoned_key.lock().unwrap() == key {
            return Err(StoreError::backend("disk full"));
        }
        self.inner.put(key, value)
    }
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get(key)
    }
    fn batch_put(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), StoreError> {
        self.inner.batch_put(entries)
    }
    fn scan_prefix(
        &self,
        prefix: &str,
        visitor: &mut dyn FnMut(&str, &[u8]) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        self.inner.scan_prefix(prefix, visitor)
    }
}

#[test]
fn failing_task_is_recorded_and_sweep_continues() {
    let index = Arc::new(SnippetIndex::new());
    let tasks: Vec<TaskId> = (0..3).map(|_| TaskId::new_random()).collect();
    for task in &tasks {
        index_code(&index, *task, 1, AuthorId::new_random(), COPY);
    }
    let backend = Arc::new(FailingBackend {
        inner: InMemoryBackend::new(),
        poisoned_key: Mutex::new(format!("stats/{}", tasks[1])),
    });
    let snapshots = StatisticsSnapshots::open(backend, CompressionConfig::default()).unwrap();
    let engine = StatisticsEngine::new(index, Arc::new(snapshots), SearchPolicy::default());

    let report = engine
        .sweep(&tasks, SweepSelection::All, &AtomicBool::new(false))
        .unwrap();
    assert_eq!(report.completed.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].task_id, tasks[1]);
    assert!(report.failed[0].error.contains("disk full"));
    assert!(engine.snapshots().get(tasks[1]).unwrap().is_none());
    assert!(engine.snapshots().get(tasks[2]).unwrap().is_some());
}
