use crate::error::ServerError;
use crate::state::ServerState;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use fraudlens::{Caller, Role};
use sha2::{Digest, Sha256};
use std::sync::Arc;

const ANONYMOUS_CLIENT: &str = "anonymous";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Resolve the caller's role and apply the rate limit.
///
/// In order of precedence: an API key (`X-API-Key` or
/// `Authorization: Bearer <key>`) mapped to its configured role, the
/// gateway's `x-user-role` / `x-user-id` headers when trusted, else an
/// anonymous BASIC caller. An unknown API key is rejected.
pub async fn resolve_caller(
    State(state): State<Arc<ServerState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let headers = request.headers();
    let api_key = header(headers, "x-api-key")
        .or_else(|| header(headers, AUTHORIZATION.as_str()))
        .map(|s| s.strip_prefix("Bearer ").unwrap_or(s).to_string());

    let (caller, client_key) = match api_key {
        Some(key) => {
            let Some(role) = state.config.auth.role_for_key(&key) else {
                return Err(ServerError::Authentication("Invalid API key".to_string()));
            };
            let caller = Caller::new(role, None);
            (caller, key_fingerprint(&key))
        }
        None if state.config.auth.trust_role_header => {
            let role = header(headers, "x-user-role")
                .map(Role::from_label)
                .unwrap_or_default();
            let user_id = header(headers, "x-user-id").map(str::to_string);
            let client_key = match &user_id {
                Some(id) => format!("user:{id}"),
                None => client_addr(headers),
            };
            (Caller::new(role, user_id), client_key)
        }
        None => (Caller::anonymous(), client_addr(headers)),
    };

    if !state.check_rate_limit(&client_key) {
        tracing::warn!(client = %client_key, "rate limit exceeded");
        return Err(ServerError::RateLimitExceeded);
    }

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

/// Rate-limit key for an API key caller. Only a digest prefix is kept, so
/// the key itself never reaches the limiter map or the logs.
pub fn key_fingerprint(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("key:{}", hex::encode(&digest[..8]))
}

fn client_addr(headers: &HeaderMap) -> String {
    let addr = header(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .unwrap_or(ANONYMOUS_CLIENT);
    format!("addr:{addr}")
}

/// Request ID injection middleware
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Request id carried in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Logging middleware
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = std::time::Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();

    tracing::info!(
        method = %method,
        path = %path,
        request_id = %request_id,
        "Request started"
    );

    let response = next.run(request).await;
    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        path = %path,
        status = %status,
        duration_ms = %duration.as_millis(),
        request_id = %request_id,
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_fingerprint_hides_the_key() {
        let print = key_fingerprint("sk-live-standard-0001");
        assert!(!print.contains("sk-live"));
        assert_eq!(print.len(), "key:".len() + 16);
        assert_eq!(print, key_fingerprint("sk-live-standard-0001"));
        assert_ne!(print, key_fingerprint("sk-live-standard-0002"));
    }
}
