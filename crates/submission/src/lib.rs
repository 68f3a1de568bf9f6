//! # Submissions
//!
//! The submission model, intake validation and the ordered key-value storage
//! shared by the anti-plagiarism service.
//!
//! - [`prepare`] validates a [`NewSubmission`] (size, language) and counts
//!   its tokens. Nothing is indexed here.
//! - [`SubmissionRepository`] assigns monotonic ids and persists submissions
//!   through a [`StorageBackend`] as bincode records, zstd-compressed.
//! - [`StorageBackend`] has an in-memory implementation for tests and a
//!   redb implementation (feature `backend-redb`, on by default).
//!
//! ```
//! use std::sync::Arc;
//! use submission::{
//!     prepare, AuthorId, CompressionConfig, InMemoryBackend, IntakeConfig, NewSubmission,
//!     SubmissionRepository, TaskId,
//! };
//!
//! let repo = SubmissionRepository::open(
//!     Arc::new(InMemoryBackend::new()),
//!     CompressionConfig::default(),
//! )
//! .unwrap();
//! let new = NewSubmission {
//!     task_id: TaskId::new_random(),
//!     author_id: AuthorId::new_random(),
//!     language: "csharp".into(),
//!     code: "var x = 1;".into(),
//!     additional_info: None,
//! };
//! let stored = repo.add(prepare(new, &IntakeConfig::default()).unwrap()).unwrap();
//! assert_eq!(stored.tokens_count, 5);
//! ```

mod backend;
mod codec;
mod error;
mod intake;
mod model;
mod repository;

#[cfg(feature = "backend-redb")]
pub use crate::backend::RedbBackend;
pub use crate::backend::{BackendConfig, InMemoryBackend, StorageBackend};
pub use crate::codec::{CompressionCodec, CompressionConfig};
pub use crate::error::{IntakeError, StoreError};
pub use crate::intake::{prepare, IntakeConfig, PreparedSubmission};
pub use crate::model::{AuthorId, NewSubmission, Submission, SubmissionId, TaskId};
pub use crate::repository::SubmissionRepository;
