use std::collections::BTreeMap;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use snippets::{Fingerprint, Snippet};
use submission::{AuthorId, SubmissionId, TaskId};

use crate::error::IndexError;

/// One occurrence of a fingerprint inside a task shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Posting {
    pub submission_id: SubmissionId,
    pub author_id: AuthorId,
    pub token_offset: usize,
    pub tokens_count: usize,
}

/// A fingerprint occurrence with its full coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnippetOccurrence {
    pub fingerprint: Fingerprint,
    pub task_id: TaskId,
    pub submission_id: SubmissionId,
    pub author_id: AuthorId,
    pub token_offset: usize,
    pub tokens_count: usize,
}

/// What the shard remembers about one indexed submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedSubmission {
    pub author_id: AuthorId,
    /// Distinct fingerprints, in first-seen order.
    pub fingerprints: Vec<Fingerprint>,
}

/// All occurrences of one task.
///
/// Invariant: `authors[f]` counts, per author, the indexed submissions that
/// contain `f` at least once; it is empty exactly when `postings[f]` is.
#[derive(Debug)]
pub struct TaskShard {
    task_id: TaskId,
    postings: HashMap<Fingerprint, Vec<Posting>>,
    authors: HashMap<Fingerprint, HashMap<AuthorId, u32>>,
    submissions: BTreeMap<SubmissionId, IndexedSubmission>,
}

impl TaskShard {
    pub(crate) fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            postings: HashMap::new(),
            authors: HashMap::new(),
            submissions: BTreeMap::new(),
        }
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub(crate) fn insert(
        &mut self,
        submission: SubmissionId,
        author: AuthorId,
        snippets: &[Snippet],
    ) -> Result<usize, IndexError> {
        if self.submissions.contains_key(&submission) {
            return Err(IndexError::AlreadyIndexed {
                task: self.task_id,
                submission,
            });
        }

        let mut distinct = Vec::new();
        for snippet in snippets {
            let postings = self.postings.entry(snippet.fingerprint).or_default();
            let first_in_submission = postings
                .last()
                .map_or(true, |p| p.submission_id != submission);
            postings.push(Posting {
                submission_id: submission,
                author_id: author,
                token_offset: snippet.token_offset,
                tokens_count: snippet.tokens_count,
            });
            if first_in_submission {
                distinct.push(snippet.fingerprint);
                *self
                    .authors
                    .entry(snippet.fingerprint)
                    .or_default()
                    .entry(author)
                    .or_insert(0) += 1;
            }
        }

        let count = distinct.len();
        self.submissions.insert(
            submission,
            IndexedSubmission {
                author_id: author,
                fingerprints: distinct,
            },
        );
        Ok(count)
    }

    pub(crate) fn remove(&mut self, submission: SubmissionId) -> Option<IndexedSubmission> {
        let entry = self.submissions.remove(&submission)?;
        for fingerprint in &entry.fingerprints {
            if let Some(postings) = self.postings.get_mut(fingerprint) {
                postings.retain(|p| p.submission_id != submission);
                if postings.is_empty() {
                    self.postings.remove(fingerprint);
                }
            }
            if let Some(counts) = self.authors.get_mut(fingerprint) {
                if let Some(count) = counts.get_mut(&entry.author_id) {
                    *count -= 1;
                    if *count == 0 {
                        counts.remove(&entry.author_id);
                    }
                }
                if counts.is_empty() {
                    self.authors.remove(fingerprint);
                }
            }
        }
        Some(entry)
    }

    /// Every occurrence of `fingerprint` in the task.
    pub fn postings(&self, fingerprint: Fingerprint) -> &[Posting] {
        self.postings
            .get(&fingerprint)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct authors with `fingerprint` in the task.
    pub fn distinct_authors(&self, fingerprint: Fingerprint) -> usize {
        self.authors.get(&fingerprint).map_or(0, |counts| counts.len())
    }

    /// Whether `author` has any indexed submission containing `fingerprint`.
    pub fn has_author(&self, fingerprint: Fingerprint, author: AuthorId) -> bool {
        self.authors
            .get(&fingerprint)
            .is_some_and(|counts| counts.contains_key(&author))
    }

    pub fn submission(&self, id: SubmissionId) -> Option<&IndexedSubmission> {
        self.submissions.get(&id)
    }

    /// Indexed submissions in id order.
    pub fn submissions(&self) -> impl Iterator<Item = (SubmissionId, &IndexedSubmission)> {
        self.submissions.iter().map(|(&id, entry)| (id, entry))
    }

    pub fn contains(&self, id: SubmissionId) -> bool {
        self.submissions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.submissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty()
    }

    pub fn fingerprints_count(&self) -> usize {
        self.postings.len()
    }

    /// Full dump, sorted, for comparing two shards.
    pub fn occurrences(&self) -> Vec<SnippetOccurrence> {
        let task_id = self.task_id;
        let mut out: Vec<SnippetOccurrence> = self
            .postings
            .iter()
            .flat_map(|(&fingerprint, postings)| {
                postings.iter().map(move |p| SnippetOccurrence {
                    fingerprint,
                    task_id,
                    submission_id: p.submission_id,
                    author_id: p.author_id,
                    token_offset: p.token_offset,
                    tokens_count: p.tokens_count,
                })
            })
            .collect();
        out.sort_unstable();
        out
    }
}
