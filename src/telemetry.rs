use std::sync::Arc;
use std::time::Duration;

use matcher::{set_match_metrics, MatchMetrics, MatchSource, SearchMode};

/// [`MatchMetrics`] backed by the `metrics` facade.
///
/// Emits `fraudlens_searches_total{mode,source}`,
/// `fraudlens_search_latency_seconds{mode}`,
/// `fraudlens_search_results_total{source}` and
/// `fraudlens_search_fallbacks_total{from,to,reason}`. No exporter is
/// installed here; the host process chooses one.
#[derive(Debug, Default, Clone, Copy)]
pub struct FacadeMetrics;

impl MatchMetrics for FacadeMetrics {
    fn record_match(&self, mode: SearchMode, source: MatchSource, latency: Duration, total: u64) {
        metrics::counter!(
            "fraudlens_searches_total",
            "mode" => mode.as_str(),
            "source" => source.as_str(),
        )
        .increment(1);
        metrics::histogram!("fraudlens_search_latency_seconds", "mode" => mode.as_str())
            .record(latency.as_secs_f64());
        metrics::counter!("fraudlens_search_results_total", "source" => source.as_str())
            .increment(total);
    }

    fn record_fallback(&self, from: MatchSource, to: MatchSource, reason: &'static str) {
        metrics::counter!(
            "fraudlens_search_fallbacks_total",
            "from" => from.as_str(),
            "to" => to.as_str(),
            "reason" => reason,
        )
        .increment(1);
    }
}

/// Route matcher observations to the `metrics` facade.
pub fn install_metrics() {
    set_match_metrics(Some(Arc::new(FacadeMetrics)));
}
