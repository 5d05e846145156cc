use crate::state::ServerState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

static STARTED_AT: once_cell::sync::Lazy<DateTime<Utc>> = once_cell::sync::Lazy::new(Utc::now);

#[derive(Debug, Serialize)]
struct HealthReport {
    status: &'static str,
    service: &'static str,
    timestamp: DateTime<Utc>,
    uptime_seconds: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<SearchSettings>,
}

#[derive(Debug, Serialize)]
struct SearchSettings {
    default_limit: u32,
    max_limit: u32,
    deterministic_masking: bool,
}

impl HealthReport {
    fn new(status: &'static str) -> Self {
        let now = Utc::now();
        Self {
            status,
            service: "fraudlens-server",
            timestamp: now,
            uptime_seconds: (now - *STARTED_AT).num_seconds().max(0),
            search: None,
        }
    }
}

/// Liveness: the process is up and serving.
pub async fn health_check() -> impl IntoResponse {
    Json(HealthReport::new("healthy"))
}

/// Readiness, with the limits and masking mode the pipeline runs with.
pub async fn readiness_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let limits = state.pipeline.limits();
    Json(HealthReport {
        search: Some(SearchSettings {
            default_limit: limits.default_limit,
            max_limit: limits.max_limit,
            deterministic_masking: state.pipeline.disclosure().mapping_table().is_some(),
        }),
        ..HealthReport::new("ready")
    })
}

pub async fn metrics(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        ),
    }
}
