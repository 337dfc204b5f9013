use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::{GatewayError, WeatherQuery};

use super::{ProviderId, WeatherProvider, get_json};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// OpenWeather current weather, requested in metric units.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: Option<String>,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self { api_key, base_url: DEFAULT_BASE_URL.to_string(), http: Client::new() }
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_weather(&self, query: &WeatherQuery) -> Result<Value, GatewayError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GatewayError::Configuration { provider: self.id() })?;

        let url = format!("{}/weather", self.base_url);

        // OpenWeather takes coordinates as separate parameters.
        let mut params = match query {
            WeatherQuery::City(city) => vec![("q", city.clone())],
            WeatherQuery::Coordinates { lat, lon } => {
                vec![("lat", lat.to_string()), ("lon", lon.to_string())]
            }
        };
        params.push(("appid", api_key.to_string()));
        params.push(("units", "metric".to_string()));

        get_json(&self.http, self.id(), &url, &params).await
    }
}
