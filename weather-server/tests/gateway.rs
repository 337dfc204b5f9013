//! End-to-end tests: router + real providers against a mock upstream.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use weather_core::provider::{openweather::OpenWeatherProvider, weatherapi::WeatherApiProvider};
use weather_server::{AppState, Deployment, create_router};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn city_lookup_is_recorded_in_search_history() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "London"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "London",
            "sys": {"country": "GB", "sunrise": 1, "sunset": 2},
            "main": {"temp": 11.3, "feels_like": 10.1, "humidity": 80, "pressure": 1009}
        })))
        .mount(&upstream)
        .await;

    let provider = OpenWeatherProvider::new(Some("KEY".into())).with_base_url(upstream.uri());
    let app = create_router(AppState::new(Arc::new(provider)), Deployment::Standalone);

    let (status, raw) = get(&app, "/api/weather?city=London").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(raw["name"], "London");

    let (status, searches) = get(&app, "/api/searches").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(searches[0]["city"], "London");
    assert_eq!(searches[0]["country"], "GB");
    assert_eq!(searches[0]["temperature"], 11.3);
}

#[tokio::test]
async fn weather_api_shape_is_logged_from_location() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/current.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "location": {"name": "Paris", "country": "France", "lat": 48.87, "lon": 2.33},
            "current": {"temp_c": 18.0, "condition": {"text": "Sunny", "icon": "//cdn/113.png"}}
        })))
        .mount(&upstream)
        .await;

    let provider = WeatherApiProvider::new(Some("KEY".into())).with_base_url(upstream.uri());
    let app = create_router(AppState::new(Arc::new(provider)), Deployment::Standalone);

    get(&app, "/api/weather?city=Paris").await;
    let (_, searches) = get(&app, "/api/searches").await;
    assert_eq!(searches[0]["city"], "Paris");
    assert_eq!(searches[0]["country"], "France");
}

#[tokio::test]
async fn upstream_failure_maps_to_500_without_key() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/current.json"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 2008, "message": "API key has been disabled."}
        })))
        .mount(&upstream)
        .await;

    let provider =
        WeatherApiProvider::new(Some("SECRET_KEY".into())).with_base_url(upstream.uri());
    let app = create_router(AppState::new(Arc::new(provider)), Deployment::RouteHandler);

    let (status, body) = get(&app, "/api/weather?lat=10&lon=20").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "API key has been disabled.");
    assert!(!body.to_string().contains("SECRET_KEY"));
}

#[tokio::test]
async fn missing_key_never_reaches_upstream() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let provider = WeatherApiProvider::new(None).with_base_url(upstream.uri());
    let app = create_router(AppState::new(Arc::new(provider)), Deployment::Standalone);

    let (status, body) = get(&app, "/api/weather/current?lat=1&lon=2").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Weather API key not configured");
}
