//! # Snippet Index
//!
//! Content-addressed occurrence store, partitioned by task.
//!
//! Each task owns one [`TaskShard`] behind its own `RwLock`, held in a
//! concurrent map keyed by [`TaskId`]. The partitioning is structural:
//!
//! - Writes to one task never block reads or writes on another.
//! - Within a task, [`SnippetIndex::rebuild_task`] swaps in a freshly built
//!   shard under the write lock, so queries see either the old or the new
//!   occurrences, never a mix.
//! - Occurrences are only appended per submission or removed as a whole.
//!
//! ```
//! use index::SnippetIndex;
//! use snippets::{extract_snippets, SnippetConfig};
//! use submission::{AuthorId, SubmissionId, TaskId};
//! use tokenize::{extract_code_units, Language};
//!
//! let index = SnippetIndex::new();
//! let task = TaskId::new_random();
//! let cfg = SnippetConfig::default().with_window(5);
//! let units = extract_code_units("a b c d e f", Language::Python);
//! let snippets = extract_snippets(&units, &cfg).unwrap();
//!
//! index.insert(task, SubmissionId(1), AuthorId::new_random(), &snippets).unwrap();
//! index.insert(task, SubmissionId(2), AuthorId::new_random(), &snippets).unwrap();
//!
//! let hits = index.query(task, snippets[0].fingerprint, SubmissionId(1)).unwrap();
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].submission_id, SubmissionId(2));
//! ```

mod error;
mod shard;

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use dashmap::DashMap;
use snippets::{Fingerprint, Snippet};
use submission::{AuthorId, SubmissionId, TaskId};
use tracing::debug;

pub use crate::error::IndexError;
pub use crate::shard::{IndexedSubmission, Posting, SnippetOccurrence, TaskShard};

/// One submission's snippets, as fed to [`SnippetIndex::rebuild_task`].
#[derive(Debug, Clone)]
pub struct TaskEntry {
    pub submission_id: SubmissionId,
    pub author_id: AuthorId,
    pub snippets: Vec<Snippet>,
}

#[derive(Debug, Default)]
pub struct SnippetIndex {
    shards: DashMap<TaskId, Arc<RwLock<TaskShard>>>,
}

impl SnippetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    // The map guard is dropped before the shard lock is taken.
    fn shard(&self, task: TaskId) -> Result<Arc<RwLock<TaskShard>>, IndexError> {
        self.shards
            .get(&task)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(IndexError::TaskNotFound(task))
    }

    fn shard_or_create(&self, task: TaskId) -> Arc<RwLock<TaskShard>> {
        Arc::clone(
            self.shards
                .entry(task)
                .or_insert_with(|| Arc::new(RwLock::new(TaskShard::new(task))))
                .value(),
        )
    }

    fn read(
        shard: &RwLock<TaskShard>,
        task: TaskId,
    ) -> Result<RwLockReadGuard<'_, TaskShard>, IndexError> {
        shard.read().map_err(|_| IndexError::Poisoned(task))
    }

    fn write(
        shard: &RwLock<TaskShard>,
        task: TaskId,
    ) -> Result<RwLockWriteGuard<'_, TaskShard>, IndexError> {
        shard.write().map_err(|_| IndexError::Poisoned(task))
    }

    /// Append the occurrences of one submission. Returns the number of
    /// distinct fingerprints indexed.
    pub fn insert(
        &self,
        task: TaskId,
        submission: SubmissionId,
        author: AuthorId,
        snippets: &[Snippet],
    ) -> Result<usize, IndexError> {
        let shard = self.shard_or_create(task);
        let distinct = Self::write(&shard, task)?.insert(submission, author, snippets)?;
        debug!(
            task_id = %task,
            submission_id = %submission,
            snippets = snippets.len(),
            distinct_fingerprints = distinct,
            "snippets_inserted"
        );
        Ok(distinct)
    }

    /// Remove every occurrence of `submission`.
    pub fn remove_submission(&self, task: TaskId, submission: SubmissionId) -> Result<(), IndexError> {
        let shard = self.shard(task)?;
        let removed = Self::write(&shard, task)?.remove(submission);
        match removed {
            Some(_) => {
                debug!(task_id = %task, submission_id = %submission, "submission_unindexed");
                Ok(())
            }
            None => Err(IndexError::SubmissionNotFound { task, submission }),
        }
    }

    /// Occurrences of `fingerprint` in the task, minus those of `exclude`.
    pub fn query(
        &self,
        task: TaskId,
        fingerprint: Fingerprint,
        exclude: SubmissionId,
    ) -> Result<Vec<SnippetOccurrence>, IndexError> {
        let shard = self.shard(task)?;
        let guard = Self::read(&shard, task)?;
        Ok(guard
            .postings(fingerprint)
            .iter()
            .filter(|p| p.submission_id != exclude)
            .map(|p| SnippetOccurrence {
                fingerprint,
                task_id: task,
                submission_id: p.submission_id,
                author_id: p.author_id,
                token_offset: p.token_offset,
                tokens_count: p.tokens_count,
            })
            .collect())
    }

    /// Replace everything known about `task` with `entries`.
    ///
    /// On error the old shard is left untouched.
    pub fn rebuild_task(&self, task: TaskId, entries: Vec<TaskEntry>) -> Result<(), IndexError> {
        self.rebuild_task_with(task, || Ok::<_, IndexError>(entries))
    }

    /// Replace the task's shard with the entries `load` returns.
    ///
    /// `load` runs while the shard's write lock is held: an insert into the
    /// task either lands before the lock, and must then be visible to
    /// `load` through whatever store it reads, or waits for the new shard.
    /// `load` must not call back into this index for the same task.
    pub fn rebuild_task_with<E, F>(&self, task: TaskId, load: F) -> Result<(), E>
    where
        E: From<IndexError>,
        F: FnOnce() -> Result<Vec<TaskEntry>, E>,
    {
        let shard = self.shard_or_create(task);
        let mut guard = Self::write(&shard, task)?;

        let mut fresh = TaskShard::new(task);
        for entry in load()? {
            fresh.insert(entry.submission_id, entry.author_id, &entry.snippets)?;
        }
        *guard = fresh;
        debug!(
            task_id = %task,
            submissions = guard.len(),
            fingerprints = guard.fingerprints_count(),
            "task_rebuilt"
        );
        Ok(())
    }

    /// Drop the task's shard. Returns whether it existed.
    pub fn remove_task(&self, task: TaskId) -> bool {
        self.shards.remove(&task).is_some()
    }

    /// Tasks with a shard, sorted.
    pub fn task_ids(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self.shards.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn contains(&self, task: TaskId, submission: SubmissionId) -> Result<bool, IndexError> {
        match self.shard(task) {
            Ok(shard) => Ok(Self::read(&shard, task)?.contains(submission)),
            Err(IndexError::TaskNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn distinct_authors(&self, task: TaskId, fingerprint: Fingerprint) -> Result<usize, IndexError> {
        self.with_task(task, |shard| shard.distinct_authors(fingerprint))
    }

    /// Run `f` against the task's shard under its read lock.
    ///
    /// Batch computations use this to see one consistent state of the task
    /// for their whole run.
    pub fn with_task<R>(&self, task: TaskId, f: impl FnOnce(&TaskShard) -> R) -> Result<R, IndexError> {
        let shard = self.shard(task)?;
        let guard = Self::read(&shard, task)?;
        Ok(f(&guard))
    }

    /// Sorted dump of every occurrence in the task.
    pub fn task_occurrences(&self, task: TaskId) -> Result<Vec<SnippetOccurrence>, IndexError> {
        self.with_task(task, TaskShard::occurrences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snippets::{extract_snippets, SnippetConfig};
    use tokenize::{extract_code_units, Language};

    fn snippets_of(text: &str) -> Vec<Snippet> {
        let units = extract_code_units(text, Language::Python);
        extract_snippets(&units, &SnippetConfig::default().with_window(3)).unwrap()
    }

    #[test]
    fn query_excludes_the_querying_submission() {
        let index = SnippetIndex::new();
        let task = TaskId::new_random();
        let snippets = snippets_of("a b c d");
        index.insert(task, SubmissionId(1), AuthorId::new_random(), &snippets).unwrap();

        let own = index.query(task, snippets[0].fingerprint, SubmissionId(1)).unwrap();
        assert!(own.is_empty());
        let other = index.query(task, snippets[0].fingerprint, SubmissionId(99)).unwrap();
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn tasks_are_isolated() {
        let index = SnippetIndex::new();
        let t1 = TaskId::new_random();
        let t2 = TaskId::new_random();
        let snippets = snippets_of("a b c d");
        index.insert(t1, SubmissionId(1), AuthorId::new_random(), &snippets).unwrap();
        index.insert(t2, SubmissionId(2), AuthorId::new_random(), &snippets).unwrap();

        let hits = index.query(t1, snippets[0].fingerprint, SubmissionId(0)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].task_id, t1);
        assert_eq!(index.task_ids().len(), 2);
    }

    #[test]
    fn not_found_is_distinguished() {
        let index = SnippetIndex::new();
        let task = TaskId::new_random();
        let err = index.query(task, Fingerprint(1), SubmissionId(1)).unwrap_err();
        assert_eq!(err, IndexError::TaskNotFound(task));
        assert!(err.is_not_found());

        index.insert(task, SubmissionId(1), AuthorId::new_random(), &[]).unwrap();
        let err = index.remove_submission(task, SubmissionId(2)).unwrap_err();
        assert!(matches!(err, IndexError::SubmissionNotFound { .. }));
        assert!(!index.contains(TaskId::new_random(), SubmissionId(1)).unwrap());
    }

    #[test]
    fn already_indexed_never_overwrites() {
        let index = SnippetIndex::new();
        let task = TaskId::new_random();
        let author = AuthorId::new_random();
        index.insert(task, SubmissionId(1), author, &snippets_of("a b c d")).unwrap();
        let before = index.task_occurrences(task).unwrap();
        let err = index
            .insert(task, SubmissionId(1), author, &snippets_of("x y z w"))
            .unwrap_err();
        assert!(matches!(err, IndexError::AlreadyIndexed { .. }));
        assert_eq!(index.task_occurrences(task).unwrap(), before);
    }

    #[test]
    fn rebuild_replaces_the_shard() {
        let index = SnippetIndex::new();
        let task = TaskId::new_random();
        let a = AuthorId::new_random();
        let b = AuthorId::new_random();
        index.insert(task, SubmissionId(1), a, &snippets_of("old old old old")).unwrap();

        let entries = vec![
            TaskEntry {
                submission_id: SubmissionId(2),
                author_id: a,
                snippets: snippets_of("a b c d"),
            },
            TaskEntry {
                submission_id: SubmissionId(3),
                author_id: b,
                snippets: snippets_of("a b c d"),
            },
        ];
        index.rebuild_task(task, entries.clone()).unwrap();
        let first = index.task_occurrences(task).unwrap();
        assert!(first.iter().all(|o| o.submission_id != SubmissionId(1)));
        assert!(!index.contains(task, SubmissionId(1)).unwrap());

        index.rebuild_task(task, entries).unwrap();
        assert_eq!(index.task_occurrences(task).unwrap(), first);
        let fp = first[0].fingerprint;
        assert_eq!(index.distinct_authors(task, fp).unwrap(), 2);
    }

    #[test]
    fn failed_rebuild_keeps_old_state() {
        let index = SnippetIndex::new();
        let task = TaskId::new_random();
        let author = AuthorId::new_random();
        index.insert(task, SubmissionId(1), author, &snippets_of("a b c d")).unwrap();
        let before = index.task_occurrences(task).unwrap();

        let duplicate = TaskEntry {
            submission_id: SubmissionId(5),
            author_id: author,
            snippets: Vec::new(),
        };
        let err = index
            .rebuild_task(task, vec![duplicate.clone(), duplicate])
            .unwrap_err();
        assert!(matches!(err, IndexError::AlreadyIndexed { .. }));
        assert_eq!(index.task_occurrences(task).unwrap(), before);
    }

    #[test]
    fn insert_during_rebuild_lands_in_new_shard() {
        let index = Arc::new(SnippetIndex::new());
        let task = TaskId::new_random();
        let author = AuthorId::new_random();
        let (loading_tx, loading_rx) = std::sync::mpsc::channel();

        let rebuild = {
            let index = Arc::clone(&index);
            std::thread::spawn(move || {
                index.rebuild_task_with(task, move || {
                    loading_tx.send(()).unwrap();
                    std::thread::sleep(std::time::Duration::from_millis(50));
                    Ok::<_, IndexError>(vec![TaskEntry {
                        submission_id: SubmissionId(1),
                        author_id: author,
                        snippets: snippets_of("a b c d"),
                    }])
                })
            })
        };

        loading_rx.recv().unwrap();
        index
            .insert(task, SubmissionId(2), AuthorId::new_random(), &snippets_of("a b c d"))
            .unwrap();
        rebuild.join().unwrap().unwrap();

        assert!(index.contains(task, SubmissionId(1)).unwrap());
        assert!(index.contains(task, SubmissionId(2)).unwrap());
    }

    #[test]
    fn failed_load_keeps_old_state() {
        let index = SnippetIndex::new();
        let task = TaskId::new_random();
        index.insert(task, SubmissionId(1), AuthorId::new_random(), &snippets_of("a b c d")).unwrap();
        let before = index.task_occurrences(task).unwrap();

        let err = index
            .rebuild_task_with(task, || Err(IndexError::TaskNotFound(task)))
            .unwrap_err();
        assert_eq!(err, IndexError::TaskNotFound(task));
        assert_eq!(index.task_occurrences(task).unwrap(), before);
    }

    #[test]
    fn remove_task_forgets_everything() {
        let index = SnippetIndex::new();
        let task = TaskId::new_random();
        index.insert(task, SubmissionId(1), AuthorId::new_random(), &snippets_of("a b c")).unwrap();
        assert!(index.remove_task(task));
        assert!(!index.remove_task(task));
        assert!(index.task_ids().is_empty());
    }
}
