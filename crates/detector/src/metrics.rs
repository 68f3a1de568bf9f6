// Callers install a global `DetectorMetrics` implementation via
// [`set_detector_metrics`]; every `PlagiarismDetector::get_plagiarisms` call
// then reports its latency and match count.
use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::OnceCell;
use submission::TaskId;

/// Metrics observer for plagiarism checks.
pub trait DetectorMetrics: Send + Sync {
    /// `candidates` counts other-author submissions sharing any fingerprint;
    /// `matches` is what was returned after thresholding and truncation.
    fn record_check(&self, task_id: TaskId, latency: Duration, candidates: usize, matches: usize);
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn DetectorMetrics>>> {
    static METRICS: OnceCell<RwLock<Option<Arc<dyn DetectorMetrics>>>> = OnceCell::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn DetectorMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the global detector metrics recorder.
pub fn set_detector_metrics(recorder: Option<Arc<dyn DetectorMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}
