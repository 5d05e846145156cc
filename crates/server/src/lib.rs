//! HTTP front end for fraudlens report search.
//!
//! Every request to the search routes first passes [`middleware::resolve_caller`],
//! which turns an API key (`x-api-key` or `Authorization: Bearer`) or, when
//! [`AuthConfig::trust_role_header`] is set, the gateway's `x-user-role`
//! header into a [`fraudlens::Caller`]. The handler then runs the shared
//! [`fraudlens::SearchPipeline`], which masks each result for that caller.
//!
//! | Route | Purpose |
//! |---|---|
//! | `GET /search`, `GET /api/v1/search` | report search |
//! | `GET /health` | liveness |
//! | `GET /ready` | readiness and effective search limits |
//! | `GET /metrics` | Prometheus text |
//! | `GET /` | service description |
//!
//! Failures use one body, `{error, message, details?}`, where `error` is one
//! of `validation_error`, `unauthorized`, `rate_limit_exceeded`, `not_found`
//! or `internal_error`.
//!
//! ```rust,no_run
//! # async fn run() -> anyhow::Result<()> {
//! let config = server::ServerConfig::load()?;
//! server::start_server(config).await
//! # }
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{AuthConfig, ServerConfig};
pub use error::{ErrorResponse, ServerError, ServerResult};
pub use server::{build_router, init_tracing, start_server};
pub use state::ServerState;
