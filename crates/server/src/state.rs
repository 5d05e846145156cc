use crate::config::ServerConfig;
use crate::error::ServerResult;
use dashmap::DashMap;
use fraudlens::{FraudlensConfig, SearchPipeline};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Fixed one-minute windows per client key.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: DashMap<String, Window>,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    opened: Instant,
    hits: u32,
}

const WINDOW: Duration = Duration::from_secs(60);

impl RateLimiter {
    /// Count one hit for `key`; false once `limit` hits landed in the
    /// current window.
    pub fn allow(&self, key: &str, limit: u32) -> bool {
        let now = Instant::now();
        let mut window = self.windows.entry(key.to_owned()).or_insert(Window { opened: now, hits: 0 });
        if now.duration_since(window.opened) >= WINDOW {
            *window = Window { opened: now, hits: 0 };
        }
        if window.hits >= limit {
            return false;
        }
        window.hits += 1;
        true
    }

    /// Drop windows that have expired.
    pub fn prune(&self) {
        let now = Instant::now();
        self.windows.retain(|_, w| now.duration_since(w.opened) < WINDOW);
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<ServerConfig>,
    pub rate_limiter: Arc<RateLimiter>,
    /// Search pipeline (shared across requests)
    pub pipeline: SearchPipeline,
    /// Prometheus renderer, when a recorder was installed
    pub metrics: Option<PrometheusHandle>,
}

impl ServerState {
    /// State around an already built pipeline
    pub fn new(config: ServerConfig, pipeline: SearchPipeline) -> Self {
        Self {
            config: Arc::new(config),
            rate_limiter: Arc::new(RateLimiter::default()),
            pipeline,
            metrics: None,
        }
    }

    /// Load the pipeline YAML named by the config, or the defaults, and
    /// build the pipeline from it
    pub async fn from_config(config: ServerConfig) -> ServerResult<Self> {
        let pipeline_config = match &config.pipeline_config {
            Some(path) => FraudlensConfig::from_file(path)
                .map_err(|e| crate::error::ServerError::Internal(format!("{path}: {e}")))?,
            None => FraudlensConfig::default(),
        };
        let pipeline = SearchPipeline::from_config(&pipeline_config).await?;
        Ok(Self::new(config, pipeline))
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Count a request from `key` against the per-minute limit.
    pub fn check_rate_limit(&self, key: &str) -> bool {
        self.rate_limiter.allow(key, self.config.rate_limit_per_minute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::InMemoryStore;

    fn state(limit: u32) -> ServerState {
        let config = ServerConfig {
            rate_limit_per_minute: limit,
            ..ServerConfig::default()
        };
        ServerState::new(
            config,
            SearchPipeline::in_memory(Arc::new(InMemoryStore::new())),
        )
    }

    #[test]
    fn rate_limit_counts_per_key() {
        let state = state(2);
        assert!(state.check_rate_limit("a"));
        assert!(state.check_rate_limit("a"));
        assert!(!state.check_rate_limit("a"));
        assert!(state.check_rate_limit("b"));

        state.rate_limiter.prune();
        assert_eq!(state.rate_limiter.tracked_clients(), 2);
    }

    #[tokio::test]
    async fn from_default_config() {
        let state = ServerState::from_config(ServerConfig::default()).await.unwrap();
        assert!(state.metrics.is_none());
        assert!(state.config.auth.role_for_key("anything").is_none());
    }
}
