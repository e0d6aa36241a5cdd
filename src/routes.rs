use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    handler::HandlerWithoutStateExt,
    http::{header, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::Path;
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::error::{epoch_seconds, TranslateError};
use crate::state::AppState;
use crate::translate::TranslationResult;

pub fn create_routes(state: AppState) -> Router {
    let router = Router::new()
        // Health check
        .route("/api/health", get(health_check).fallback(method_not_allowed))
        // Strict variants require a JSON content type
        .route("/api/translate", post(api_translate).fallback(method_not_allowed))
        .route("/api/retranslate", post(api_retranslate).fallback(method_not_allowed))
        .route("/translate", post(translate).fallback(method_not_allowed))
        .route("/retranslate", post(retranslate).fallback(method_not_allowed));

    // Playground page
    let router = match state.config.server.static_dir.as_deref() {
        Some(dir) if Path::new(dir).is_dir() => {
            info!("Serving static files from {}", dir);
            router.fallback_service(ServeDir::new(dir).not_found_service(not_found.into_service()))
        }
        _ => router.fallback(not_found),
    };

    router.with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let cache_backend = if !state.store.is_configured() {
        "not_configured"
    } else {
        match state.store.ping().await {
            Ok(()) => "connected",
            Err(e) => {
                warn!("Store ping failed: {}", e);
                "disconnected"
            }
        }
    };
    let translator = state.service.translator();
    let upstream = if translator.is_configured() { "configured" } else { "not_configured" };
    let limits = &state.config.limits;

    Json(json!({
        "status": "healthy",
        "cacheBackend": cache_backend,
        "store": state.store.backend_name(),
        "upstream": upstream,
        "model": translator.model(),
        "limits": {
            "max_text_length": limits.max_text_length,
            "rate_limit_seconds": limits.rate_limit_interval().as_secs_f64(),
            "max_tokens_per_request": state.config.upstream.max_tokens_per_request,
            "token_budget": limits.token_budget,
        },
        "timestamp": epoch_seconds(),
    }))
}

async fn api_translate(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TranslationResult>, TranslateError> {
    handle_translate(state, peer, headers, body, true, false).await
}

async fn api_retranslate(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TranslationResult>, TranslateError> {
    handle_translate(state, peer, headers, body, true, true).await
}

async fn translate(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TranslationResult>, TranslateError> {
    handle_translate(state, peer, headers, body, false, false).await
}

async fn retranslate(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TranslationResult>, TranslateError> {
    handle_translate(state, peer, headers, body, false, true).await
}

async fn handle_translate(
    state: AppState,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
    require_json: bool,
    force_refresh: bool,
) -> Result<Json<TranslationResult>, TranslateError> {
    if require_json && !is_json(&headers) {
        return Err(TranslateError::validation(
            "Request must be JSON format",
            "Set Content-Type header to application/json",
        ));
    }

    let caller = caller_identity(&headers, peer.map(|ConnectInfo(addr)| addr));
    let request = state.validator.validate(&body, caller, force_refresh)?;

    // Detached so a dropped connection can't cancel an in-flight upstream
    // call or the cache write that follows it.
    let service = state.service.clone();
    let result = tokio::spawn(async move { service.process(request).await })
        .await
        .map_err(|e| TranslateError::Processing {
            details: format!("Unexpected error during translation: {}", e),
        })??;

    Ok(Json(result))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

/// First `X-Forwarded-For` hop, else the peer address.
pub fn caller_identity(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match (forwarded, peer) {
        (Some(hop), _) => hop.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => "unknown".to_string(),
    }
}

async fn not_found() -> TranslateError {
    TranslateError::NotFound
}

async fn method_not_allowed() -> TranslateError {
    TranslateError::MethodNotAllowed
}
