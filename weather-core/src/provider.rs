use crate::{
    Config, GatewayError, WeatherQuery, WeatherRecord,
    error::GENERIC_UPSTREAM_MESSAGE,
    normalize::normalize,
    provider::{openweather::OpenWeatherProvider, weatherapi::WeatherApiProvider},
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::{convert::TryFrom, fmt::Debug};
use tracing::{debug, warn};

pub mod openweather;
pub mod weatherapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    WeatherApi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::WeatherApi => "weatherapi",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::WeatherApi]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "weatherapi" => Ok(ProviderId::WeatherApi),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, weatherapi."
            )),
        }
    }
}

/// The weather gateway: one outbound lookup against one upstream provider,
/// returning the provider's JSON untouched.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    /// Whether an API key is available. Lookups fail without one.
    fn is_configured(&self) -> bool;

    async fn fetch_weather(&self, query: &WeatherQuery) -> Result<Value, GatewayError>;
}

/// Fetch and normalize in one step.
pub async fn lookup(
    provider: &dyn WeatherProvider,
    query: &WeatherQuery,
) -> Result<WeatherRecord, GatewayError> {
    let raw = provider.fetch_weather(query).await?;
    Ok(normalize(&raw))
}

/// Construct a provider from config and explicit ProviderId.
///
/// A missing API key is not an error here; the provider reports
/// [`GatewayError::Configuration`] on every lookup instead.
pub fn provider_from_config(id: ProviderId, config: &Config) -> Box<dyn WeatherProvider> {
    let api_key = config.provider_api_key(id).map(str::to_owned);
    if api_key.is_none() {
        warn!(provider = %id, "no API key configured; lookups will fail");
    }
    let base_url = config.provider_base_url(id);

    match id {
        ProviderId::OpenWeather => {
            let provider = OpenWeatherProvider::new(api_key);
            Box::new(match base_url {
                Some(url) => provider.with_base_url(url),
                None => provider,
            })
        }
        ProviderId::WeatherApi => {
            let provider = WeatherApiProvider::new(api_key);
            Box::new(match base_url {
                Some(url) => provider.with_base_url(url),
                None => provider,
            })
        }
    }
}

/// Construct the default provider from config, or `fallback` when
/// `default_provider` is not set.
pub fn default_provider_from_config(
    config: &Config,
    fallback: ProviderId,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let id = config.effective_provider_id(fallback)?;
    Ok(provider_from_config(id, config))
}

/// Single GET shared by both providers. `params` must never end up in an
/// error message: they carry the API key.
async fn get_json(
    http: &Client,
    provider: ProviderId,
    url: &str,
    params: &[(&str, String)],
) -> Result<Value, GatewayError> {
    debug!(%provider, url, "requesting current conditions");

    let res = http.get(url).query(params).send().await.map_err(|err| {
        warn!(%provider, "upstream request failed: {}", err.without_url());
        GatewayError::upstream(None, GENERIC_UPSTREAM_MESSAGE)
    })?;

    let status = res.status();
    let body = res.text().await.map_err(|err| {
        warn!(%provider, "failed to read upstream body: {}", err.without_url());
        GatewayError::upstream(Some(status.as_u16()), GENERIC_UPSTREAM_MESSAGE)
    })?;

    if !status.is_success() {
        warn!(%provider, %status, body = %truncate_body(&body), "upstream request rejected");
        return Err(GatewayError::upstream(Some(status.as_u16()), upstream_message(&body)));
    }

    serde_json::from_str(&body).map_err(|err| {
        warn!(%provider, "upstream returned invalid JSON: {err}");
        GatewayError::upstream(Some(status.as_u16()), GENERIC_UPSTREAM_MESSAGE)
    })
}

/// Human-readable reason from an upstream error body: WeatherAPI nests it
/// under `error.message`, OpenWeather puts it in `message`.
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("message"))
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| GENERIC_UPSTREAM_MESSAGE.to_string())
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
