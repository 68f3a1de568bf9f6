use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::backend::StorageBackend;
use crate::codec::CompressionConfig;
use crate::error::StoreError;
use crate::intake::PreparedSubmission;
use crate::model::{AuthorId, Submission, SubmissionId, TaskId};

const SUBMISSION_PREFIX: &str = "sub/";
const SUBMISSION_BY_ID_PREFIX: &str = "sub-id/";
const AUTHOR_PREFIX: &str = "author/";
const TASK_PREFIX: &str = "task/";

fn submission_key(task: TaskId, id: SubmissionId) -> String {
    format!("{SUBMISSION_PREFIX}{task}/{:020}", id.0)
}

fn submission_by_id_key(id: SubmissionId) -> String {
    format!("{SUBMISSION_BY_ID_PREFIX}{:020}", id.0)
}

fn author_key(task: TaskId, author: AuthorId, id: SubmissionId) -> String {
    format!("{AUTHOR_PREFIX}{task}/{author}/{:020}", id.0)
}

fn task_key(task: TaskId) -> String {
    format!("{TASK_PREFIX}{task}")
}

fn trailing_id(key: &str) -> Result<SubmissionId, StoreError> {
    key.rsplit('/')
        .next()
        .and_then(|tail| tail.parse().ok())
        .map(SubmissionId)
        .ok_or_else(|| StoreError::MalformedKey(key.to_string()))
}

/// Submissions stored in a [`StorageBackend`].
///
/// Key layout:
///
/// - `sub/{task}/{id:020}`: the encoded submission (ordered by id per task)
/// - `sub-id/{id:020}`: task of the submission, for lookup by id
/// - `author/{task}/{author}/{id:020}`: per-author listing
/// - `task/{task}`: every task that ever had a submission
pub struct SubmissionRepository {
    backend: Arc<dyn StorageBackend>,
    compression: CompressionConfig,
    next_id: AtomicU64,
}

impl SubmissionRepository {
    /// Open a repository, resuming id assignment after the largest stored id.
    pub fn open(
        backend: Arc<dyn StorageBackend>,
        compression: CompressionConfig,
    ) -> Result<Self, StoreError> {
        let mut last = 0u64;
        backend.scan_prefix(SUBMISSION_BY_ID_PREFIX, &mut |key, _| {
            last = last.max(trailing_id(key)?.0);
            Ok(())
        })?;
        Ok(Self {
            backend,
            compression,
            next_id: AtomicU64::new(last + 1),
        })
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Assign an id and timestamp, then persist.
    pub fn add(&self, prepared: PreparedSubmission) -> Result<Submission, StoreError> {
        let id = SubmissionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let submission = Submission {
            id,
            task_id: prepared.task_id,
            author_id: prepared.author_id,
            language: prepared.language,
            code: prepared.code,
            tokens_count: prepared.tokens_count,
            added_at: Utc::now(),
            additional_info: prepared.additional_info,
        };
        self.insert(&submission)?;
        Ok(submission)
    }

    /// Persist a fully formed submission under its own id.
    pub fn insert(&self, submission: &Submission) -> Result<(), StoreError> {
        let payload = self.compression.encode_record(submission)?;
        let task = submission.task_id;
        let id = submission.id;
        self.backend.batch_put(vec![
            (submission_key(task, id), payload),
            (submission_by_id_key(id), task.to_string().into_bytes()),
            (author_key(task, submission.author_id, id), Vec::new()),
            (task_key(task), Vec::new()),
        ])?;
        self.next_id.fetch_max(id.0 + 1, Ordering::SeqCst);
        debug!(submission_id = %id, task_id = %task, "submission_stored");
        Ok(())
    }

    pub fn find(&self, id: SubmissionId) -> Result<Option<Submission>, StoreError> {
        let Some(task_bytes) = self.backend.get(&submission_by_id_key(id))? else {
            return Ok(None);
        };
        let task_str = String::from_utf8(task_bytes)
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        let task: TaskId = task_str
            .parse()
            .map_err(|e: uuid::Error| StoreError::Decode(e.to_string()))?;
        match self.backend.get(&submission_key(task, id))? {
            Some(data) => Ok(Some(self.compression.decode_record(&data)?)),
            None => Ok(None),
        }
    }

    pub fn get(&self, id: SubmissionId) -> Result<Submission, StoreError> {
        self.find(id)?.ok_or(StoreError::SubmissionNotFound(id))
    }

    /// Visit a task's submissions one at a time, in id order.
    pub fn for_each_in_task(
        &self,
        task: TaskId,
        visitor: &mut dyn FnMut(Submission) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let prefix = format!("{SUBMISSION_PREFIX}{task}/");
        self.backend.scan_prefix(&prefix, &mut |_, data| {
            let submission: Submission = self.compression.decode_record(data)?;
            visitor(submission)
        })
    }

    pub fn submissions_by_task(&self, task: TaskId) -> Result<Vec<Submission>, StoreError> {
        let mut out = Vec::new();
        self.for_each_in_task(task, &mut |submission| {
            out.push(submission);
            Ok(())
        })?;
        Ok(out)
    }

    /// The author's `count` latest submissions to the task, newest first.
    pub fn last_by_author(
        &self,
        task: TaskId,
        author: AuthorId,
        count: usize,
    ) -> Result<Vec<Submission>, StoreError> {
        let prefix = format!("{AUTHOR_PREFIX}{task}/{author}/");
        let mut ids = Vec::new();
        self.backend.scan_prefix(&prefix, &mut |key, _| {
            ids.push(trailing_id(key)?);
            Ok(())
        })?;

        ids.iter()
            .rev()
            .take(count)
            .map(|&id| self.get(id))
            .collect()
    }

    /// Every task with at least one stored submission, in key order.
    pub fn task_ids(&self) -> Result<Vec<TaskId>, StoreError> {
        let mut out = Vec::new();
        self.backend.scan_prefix(TASK_PREFIX, &mut |key, _| {
            let task: TaskId = key[TASK_PREFIX.len()..]
                .parse()
                .map_err(|_| StoreError::MalformedKey(key.to_string()))?;
            out.push(task);
            Ok(())
        })?;
        Ok(out)
    }
}
