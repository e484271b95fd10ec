//! HTTP routes and handlers

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, DefaultBodyLimit, State},
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use spamcheck_core::{PredictionResult, RawText, ValidationError};
use spamcheck_telemetry::{HistoryEntry, NewClassification};
use std::any::Any;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::state::AppState;

pub const SERVICE_NAME: &str = "ML Spam Classification Service";

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/api/ml/classify/", post(classify))
        .route("/api/ml/health/", get(ml_health))
        .route("/api/ml/history/", get(history))
        .fallback(fallback)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

/// Classify one message
async fn classify(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResult>, AppError> {
    metrics::counter!("spamcheck_requests_total", "endpoint" => "classify").increment(1);

    let client_ip = connect_info.map(|ConnectInfo(addr)| addr.ip());
    if !state
        .rate_limiter
        .check(client_ip.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)))
    {
        warn!("Rate limit exceeded for client");
        metrics::counter!("spamcheck_rate_limited_total").increment(1);
        return Err(AppError::RateLimited);
    }

    if !state.service.is_ready() {
        return Err(AppError::Unavailable);
    }

    let Json(body) = payload.map_err(|rejection| AppError::InvalidBody(rejection.body_text()))?;
    let text = RawText::parse(text_field(&body)?, state.service.max_text_chars())?;
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let request_id = uuid::Uuid::new_v4();
    debug!(%request_id, chars = text.as_str().chars().count(), "Classifying message");

    let worker = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        let result = worker.service.predict(&text)?;
        record(&worker, text, &result, client_ip, user_agent);
        Ok::<_, spamcheck_core::Error>(result)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    info!(%request_id, prediction = %result.label, "Classified message");
    Ok(Json(result))
}

/// The `text` member of the request body; numbers are accepted as text
fn text_field(body: &Value) -> Result<Option<String>, ValidationError> {
    match body.get("text") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(ValidationError::NotAString),
    }
}

/// Store the classification; failures are logged and never reach the caller
fn record(
    state: &AppState,
    text: RawText,
    result: &PredictionResult,
    client_ip: Option<IpAddr>,
    user_agent: String,
) {
    let mut new = NewClassification::new(text.into_inner(), result.label, result.confidence)
        .with_user_agent(user_agent);
    if let Some(ip) = client_ip {
        new = new.with_client_ip(ip);
    }

    if let Err(e) = state.history.record(new) {
        warn!("Failed to save classification to history: {}", e);
        metrics::counter!("spamcheck_errors_total", "kind" => "history_write").increment(1);
    }
}

/// Model availability
async fn ml_health(State(state): State<AppState>) -> Response {
    let loaded = state.service.is_ready();
    let status = if loaded {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = json!({
        "status": if loaded { "healthy" } else { "unhealthy" },
        "model_loaded": loaded,
        "service": SERVICE_NAME,
    });

    (status, Json(body)).into_response()
}

/// Recent classifications, anonymized
async fn history(State(state): State<AppState>) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    metrics::counter!("spamcheck_requests_total", "endpoint" => "history").increment(1);

    let entries = tokio::task::spawn_blocking(move || state.recent_history())
        .await
        .map_err(|e| AppError::History(e.to_string()))?;

    Ok(Json(entries.as_ref().clone()))
}

async fn fallback() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

fn handle_panic(_err: Box<dyn Any + Send + 'static>) -> Response {
    AppError::Internal("request handler panicked".to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_field() {
        assert_eq!(text_field(&json!({})), Ok(None));
        assert_eq!(text_field(&json!({ "text": null })), Ok(None));
        assert_eq!(text_field(&json!({ "text": "Hi" })), Ok(Some("Hi".to_string())));
        assert_eq!(text_field(&json!({ "text": 42 })), Ok(Some("42".to_string())));
        assert_eq!(
            text_field(&json!({ "text": ["a"] })),
            Err(ValidationError::NotAString)
        );
        assert_eq!(text_field(&json!("just a string")), Ok(None));
    }
}
