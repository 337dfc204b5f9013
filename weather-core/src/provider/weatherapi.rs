use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::{GatewayError, WeatherQuery};

use super::{ProviderId, WeatherProvider, get_json};

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";

/// WeatherAPI.com current conditions (`location` / `current` payload).
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: Option<String>,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self { api_key, base_url: DEFAULT_BASE_URL.to_string(), http: Client::new() }
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::WeatherApi
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_weather(&self, query: &WeatherQuery) -> Result<Value, GatewayError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GatewayError::Configuration { provider: self.id() })?;

        let url = format!("{}/current.json", self.base_url);
        let params = [("key", api_key.to_string()), ("q", query.as_q_param())];

        get_json(&self.http, self.id(), &url, &params).await
    }
}
