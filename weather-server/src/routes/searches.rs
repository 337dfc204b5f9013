use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde_json::{Value, json};
use weather_core::{NewSearch, SearchHistoryEntry};

use crate::{error::AppError, state::AppState};

/// `GET /api/searches`: newest first.
pub async fn list_searches(State(state): State<AppState>) -> Json<Vec<SearchHistoryEntry>> {
    Json(state.history.list())
}

/// `POST /api/search` (standalone) and `POST /api/searches` (route handler).
pub async fn log_search(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let search = NewSearch::from_json(&body)?;
    let entry = state.history.append(search);

    Ok(Json(json!({
        "message": "Search logged successfully",
        "search": entry,
    })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::Value;

    use crate::Deployment;
    use crate::routes::test_helpers::*;

    #[tokio::test]
    async fn logged_search_is_listed_first() {
        let (app, _) = app_with(StubReply::Missing, Deployment::Standalone);

        post_json(app.clone(), "/api/search", r#"{"city":"Oslo"}"#).await;
        let (status, json) = post_json(
            app.clone(),
            "/api/search",
            r#"{"city":"Bergen","country":"NO","temperature":7.5,"timestamp":"1999-01-01T00:00:00.000Z"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Search logged successfully");
        assert_eq!(json["search"]["city"], "Bergen");
        assert_ne!(json["search"]["timestamp"], "1999-01-01T00:00:00.000Z");

        let (_, list) = get_json(app, "/api/searches").await;
        let cities: Vec<&str> =
            list.as_array().unwrap().iter().map(|e| e["city"].as_str().unwrap()).collect();
        assert_eq!(cities, ["Bergen", "Oslo"]);
    }

    #[tokio::test]
    async fn defaults_apply_to_optional_fields() {
        let (app, _) = app_with(StubReply::Missing, Deployment::Standalone);

        let (status, json) =
            post_json(app, "/api/search", r#"{"city":"Lima","country":null,"temperature":"hot"}"#)
                .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["search"]["country"], "");
        assert_eq!(json["search"]["temperature"], Value::Null);
    }

    #[tokio::test]
    async fn missing_city_is_rejected() {
        let (app, h) = app_with(StubReply::Missing, Deployment::Standalone);

        let (status, json) = post_json(app, "/api/search", r#"{"country":"FR"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "City is required");
        assert!(h.history.is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let (app, _) = app_with(StubReply::Missing, Deployment::Standalone);

        let (status, json) = post_json(app, "/api/search", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn history_is_bounded_to_ten() {
        let (app, h) = app_with(StubReply::Missing, Deployment::RouteHandler);

        for i in 0..15 {
            let body = format!(r#"{{"city":"City {i}"}}"#);
            let (status, _) = post_json(app.clone(), "/api/searches", &body).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, list) = get_json(app, "/api/searches").await;
        let list = list.as_array().unwrap();
        assert_eq!(list.len(), 10);
        assert_eq!(list[0]["city"], "City 14");
        assert_eq!(list[9]["city"], "City 5");
        assert_eq!(h.history.len(), 10);
    }

    #[tokio::test]
    async fn empty_history_is_an_empty_array() {
        let (app, _) = app_with(StubReply::Missing, Deployment::Standalone);
        let (status, json) = get_json(app, "/api/searches").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!([]));
    }
}
