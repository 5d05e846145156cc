// Metrics hooks for the matcher.
//
// Callers install a global `MatchMetrics` implementation via
// [`set_match_metrics`]; the search engine then reports latency and totals
// per search and every fallback it takes. No backend is assumed here.
use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::OnceCell;

use crate::types::{MatchSource, SearchMode};

/// Metrics observer for match operations.
pub trait MatchMetrics: Send + Sync {
    /// `mode` is what the caller asked for, `source` the matcher that
    /// answered and `total` the reported match count.
    fn record_match(&self, mode: SearchMode, source: MatchSource, latency: Duration, total: u64);

    /// A matcher gave way to another one.
    fn record_fallback(&self, from: MatchSource, to: MatchSource, reason: &'static str);
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn MatchMetrics>>> {
    static METRICS: OnceCell<RwLock<Option<Arc<dyn MatchMetrics>>>> = OnceCell::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn MatchMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

pub(crate) fn record_fallback(from: MatchSource, to: MatchSource, reason: &'static str) {
    if let Some(recorder) = metrics_recorder() {
        recorder.record_fallback(from, to, reason);
    }
}

/// Install or clear the global match metrics recorder.
pub fn set_match_metrics(recorder: Option<Arc<dyn MatchMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}
