mod health;
mod searches;
mod weather;

#[cfg(test)]
pub(crate) mod test_helpers;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use crate::{Deployment, state::AppState};

pub fn create_router(state: AppState, deployment: Deployment) -> Router {
    let api = match deployment {
        Deployment::Standalone => Router::new()
            .route("/weather", get(weather::city_weather))
            .route("/weather/current", get(weather::current_weather))
            .route("/search", post(searches::log_search))
            .route("/searches", get(searches::list_searches)),
        Deployment::RouteHandler => Router::new()
            .route("/weather", get(weather::weather))
            .route("/searches", get(searches::list_searches).post(searches::log_search)),
    }
    .route("/health", get(health::health));

    Router::new().nest("/api", api).layer(CorsLayer::permissive()).with_state(state)
}
