use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use submission::{CompressionConfig, StorageBackend, StoreError, TaskId};
use tracing::debug;

use crate::error::StatsError;

const STATS_PREFIX: &str = "stats/";

fn stats_key(task: TaskId) -> String {
    format!("{STATS_PREFIX}{task}")
}

/// Distribution of risk scores for one task at the time it was computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatisticsParameters {
    pub task_id: TaskId,
    pub mean: f64,
    /// Population standard deviation.
    pub deviation: f64,
    pub submissions_count: usize,
    pub computed_at: DateTime<Utc>,
}

/// Latest statistics per task.
///
/// Readers get an `Arc` to a complete snapshot; a recalculation swaps the
/// whole entry. With a backend attached, snapshots are written through
/// before they become visible and reloaded by [`StatisticsSnapshots::open`].
pub struct StatisticsSnapshots {
    current: RwLock<HashMap<TaskId, Arc<TaskStatisticsParameters>>>,
    backend: Option<Arc<dyn StorageBackend>>,
    compression: CompressionConfig,
}

impl std::fmt::Debug for StatisticsSnapshots {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticsSnapshots")
            .field("persistent", &self.backend.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for StatisticsSnapshots {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl StatisticsSnapshots {
    pub fn in_memory() -> Self {
        Self {
            current: RwLock::new(HashMap::new()),
            backend: None,
            compression: CompressionConfig::default(),
        }
    }

    /// Load every stored snapshot from `backend`.
    pub fn open(
        backend: Arc<dyn StorageBackend>,
        compression: CompressionConfig,
    ) -> Result<Self, StatsError> {
        let mut current = HashMap::new();
        backend.scan_prefix(STATS_PREFIX, &mut |key, data| {
            let params: TaskStatisticsParameters = compression.decode_record(data)?;
            if stats_key(params.task_id) != key {
                return Err(StoreError::MalformedKey(key.to_string()));
            }
            current.insert(params.task_id, Arc::new(params));
            Ok(())
        })?;
        debug!(tasks = current.len(), "statistics_snapshots_loaded");
        Ok(Self {
            current: RwLock::new(current),
            backend: Some(backend),
            compression,
        })
    }

    pub fn get(&self, task: TaskId) -> Result<Option<Arc<TaskStatisticsParameters>>, StatsError> {
        let guard = self.current.read().map_err(|_| StatsError::Poisoned)?;
        Ok(guard.get(&task).cloned())
    }

    /// Persist, then publish. A failed write leaves the old snapshot visible.
    ///
    /// The write guard is held across both steps, so concurrent replaces of
    /// one task publish in the same order they persist.
    pub fn replace(
        &self,
        params: TaskStatisticsParameters,
    ) -> Result<Arc<TaskStatisticsParameters>, StatsError> {
        let mut guard = self.current.write().map_err(|_| StatsError::Poisoned)?;
        if let Some(backend) = &self.backend {
            let payload = self.compression.encode_record(&params)?;
            backend.put(&stats_key(params.task_id), &payload)?;
        }
        let params = Arc::new(params);
        guard.insert(params.task_id, Arc::clone(&params));
        Ok(params)
    }

    pub fn len(&self) -> Result<usize, StatsError> {
        Ok(self.current.read().map_err(|_| StatsError::Poisoned)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StatsError> {
        Ok(self.len()? == 0)
    }
}
