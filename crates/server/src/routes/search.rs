use crate::error::ServerResult;
use crate::state::ServerState;
use axum::extract::{Query, State};
use axum::Extension;
use axum::Json;
use fraudlens::{Caller, SearchParams, SearchResponse};
use std::sync::Arc;

/// Search approved fraud reports.
///
/// `GET /search?q=...&mode=auto|exact|fuzzy|semantic&fields=&country=&fraud_type=`
/// `&date_from=&date_to=&amount_min=&amount_max=&limit=&offset=&sort=&order=`
///
/// Every parameter is validated before any store access; failures come back
/// as a `validation_error` with per-parameter messages. Personal fields in
/// the results are masked for the caller's role.
pub async fn search_reports(
    State(state): State<Arc<ServerState>>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<SearchParams>,
) -> ServerResult<Json<SearchResponse>> {
    let response = state.pipeline.search_params(&params, &caller).await?;
    Ok(Json(response))
}
