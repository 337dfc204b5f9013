use axum::{Json, response::IntoResponse};
use chrono::{SecondsFormat, Utc};
use serde_json::json;

/// Liveness probe; never touches the upstream provider.
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "OK",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}
