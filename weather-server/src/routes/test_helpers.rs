//! Shared test utilities for route handler tests.
//!
//! Imported in each route module's `#[cfg(test)]` block via
//! `use crate::routes::test_helpers::*;`

#![allow(clippy::unwrap_used, clippy::missing_panics_doc, clippy::panic)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use weather_core::{GatewayError, ProviderId, RecencyLog, WeatherProvider, WeatherQuery};

use crate::{Deployment, routes::create_router, state::AppState};

#[derive(Debug, Clone)]
pub enum StubReply {
    Payload(Value),
    Missing,
    Upstream(String),
}

/// Provider answering every lookup with a canned reply.
#[derive(Debug)]
pub struct StubProvider {
    reply: StubReply,
    queries: Mutex<Vec<WeatherQuery>>,
}

impl StubProvider {
    pub fn queries(&self) -> Vec<WeatherQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WeatherProvider for StubProvider {
    fn id(&self) -> ProviderId {
        ProviderId::WeatherApi
    }

    fn is_configured(&self) -> bool {
        !matches!(self.reply, StubReply::Missing)
    }

    async fn fetch_weather(&self, query: &WeatherQuery) -> Result<Value, GatewayError> {
        self.queries.lock().unwrap().push(query.clone());
        match &self.reply {
            StubReply::Payload(raw) => Ok(raw.clone()),
            StubReply::Missing => Err(GatewayError::Configuration { provider: self.id() }),
            StubReply::Upstream(msg) => Err(GatewayError::upstream(Some(400), msg.clone())),
        }
    }
}

pub struct Harness {
    pub stub: Arc<StubProvider>,
    pub history: Arc<RecencyLog>,
}

pub fn app_with(reply: StubReply, deployment: Deployment) -> (Router, Harness) {
    let stub = Arc::new(StubProvider { reply, queries: Mutex::new(Vec::new()) });
    let state = AppState::new(stub.clone());
    let history = state.history.clone();
    (create_router(state, deployment), Harness { stub, history })
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.expect("failed to get response");
    let status = resp.status();
    let body = resp.into_body().collect().await.expect("failed to collect body").to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).expect("failed to build request");
    send(app, req).await
}

pub async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request");
    send(app, req).await
}
