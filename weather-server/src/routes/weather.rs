use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};
use weather_core::{GatewayError, NewSearch, WeatherQuery, normalize};

use crate::{error::AppError, state::AppState};

/// Raw query string; blank values count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct WeatherParams {
    city: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
}

impl WeatherParams {
    fn city(&self) -> Option<&str> {
        self.city.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    /// Both coordinates, if present and numeric.
    fn coordinates(&self) -> Option<(f64, f64)> {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<f64>().ok());
        Some((parse(&self.lat)?, parse(&self.lon)?))
    }
}

/// Standalone failures are prefixed the way the standalone server reports them.
fn standalone_error(err: GatewayError) -> AppError {
    match err {
        GatewayError::Upstream { message, .. } => {
            AppError::Internal(format!("Weather data fetch failed: {message}"))
        }
        other => other.into(),
    }
}

/// `GET /api/weather?city=` (standalone). Logs successful lookups.
pub async fn city_weather(
    State(state): State<AppState>,
    Query(params): Query<WeatherParams>,
) -> Result<Json<Value>, AppError> {
    let city = params
        .city()
        .ok_or_else(|| AppError::BadRequest("City parameter is required".to_string()))?;

    let raw = state
        .provider
        .fetch_weather(&WeatherQuery::City(city.to_string()))
        .await
        .map_err(standalone_error)?;

    match NewSearch::from_record(&normalize(&raw)) {
        Some(search) => {
            let entry = state.history.append(search);
            info!(city = %entry.city, country = %entry.country, "city lookup logged");
        }
        None => warn!(query = city, "upstream response has no city name; search not logged"),
    }

    Ok(Json(raw))
}

/// `GET /api/weather/current?lat=&lon=` (standalone). Never logs.
pub async fn current_weather(
    State(state): State<AppState>,
    Query(params): Query<WeatherParams>,
) -> Result<Json<Value>, AppError> {
    let (lat, lon) = params.coordinates().ok_or_else(|| {
        AppError::BadRequest("Latitude and longitude parameters are required".to_string())
    })?;

    let raw = state
        .provider
        .fetch_weather(&WeatherQuery::Coordinates { lat, lon })
        .await
        .map_err(standalone_error)?;

    Ok(Json(raw))
}

/// `GET /api/weather?city=` or `?lat=&lon=` (route handler). Never logs.
///
/// A missing API key is reported before the parameters are validated.
pub async fn weather(
    State(state): State<AppState>,
    Query(params): Query<WeatherParams>,
) -> Result<Json<Value>, AppError> {
    if !state.provider.is_configured() {
        return Err(GatewayError::Configuration { provider: state.provider.id() }.into());
    }

    let (lat, lon) = params.coordinates().unzip();
    let query = WeatherQuery::from_parts(params.city(), lat, lon)?;

    let raw = state.provider.fetch_weather(&query).await?;
    Ok(Json(raw))
}
