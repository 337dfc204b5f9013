use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::provider::ProviderId;

pub const DEFAULT_ICON_TEMPLATE: &str = "https://openweathermap.org/img/wn/{code}@2x.png";

/// Environment variable selecting the provider.
pub const ENV_PROVIDER: &str = "WEATHER_PROVIDER";
/// Environment variable holding the API key of the effective provider.
pub const ENV_API_KEY: &str = "WEATHER_API_KEY";
/// Environment variable overriding the base URL of the effective provider.
pub const ENV_API_BASE: &str = "WEATHER_API_BASE";

/// Configuration for a single provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,

    /// Overrides the provider's public endpoint, e.g. for a local mock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default provider id, e.g. "openweather" or "weatherapi".
    pub default_provider: Option<String>,

    /// Icon URL template for short provider icon codes; `{code}` is replaced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_template: Option<String>,

    /// Example TOML:
    /// [providers.weatherapi]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        let s = self.default_provider.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "No default provider configured.\n\
                 Hint: run `weather configure <provider>` (e.g. `weather configure weatherapi`) first."
            )
        })?;

        ProviderId::try_from(s.as_str())
    }

    /// The configured default provider, or `fallback` when none is set.
    pub fn effective_provider_id(&self, fallback: ProviderId) -> Result<ProviderId> {
        match self.default_provider {
            Some(_) => self.default_provider_id(),
            None => Ok(fallback),
        }
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    pub fn icon_template(&self) -> &str {
        self.icon_template.as_deref().unwrap_or(DEFAULT_ICON_TEMPLATE)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Convenience helper: set/replace a provider API key and optionally set default provider.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.entry(provider_id.as_str().to_string()).or_default().api_key = api_key;

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    pub fn set_provider_base_url(&mut self, provider_id: ProviderId, base_url: String) {
        self.providers.entry(provider_id.as_str().to_string()).or_default().base_url =
            Some(base_url);
    }

    /// Returns API key for a provider, if present and non-empty.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id)
            .map(|cfg| cfg.api_key.as_str())
            .filter(|key| !key.trim().is_empty())
    }

    pub fn provider_base_url(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id).and_then(|cfg| cfg.base_url.as_deref())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }

    /// Apply `WEATHER_PROVIDER`, `WEATHER_API_KEY` and `WEATHER_API_BASE`
    /// from the process environment.
    pub fn apply_env_overrides(&mut self, fallback: ProviderId) -> Result<()> {
        self.apply_overrides_from(fallback, |name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable source. Key and base URL target the
    /// provider that is effective after `WEATHER_PROVIDER` is applied.
    pub fn apply_overrides_from<F>(&mut self, fallback: ProviderId, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(provider) = var(ENV_PROVIDER) {
            let id = ProviderId::try_from(provider.as_str())
                .with_context(|| format!("Invalid {ENV_PROVIDER}"))?;
            self.set_default_provider(id);
        }

        let id = self.effective_provider_id(fallback)?;

        if let Some(api_key) = var(ENV_API_KEY) {
            self.providers.entry(id.as_str().to_string()).or_default().api_key = api_key;
        }
        if let Some(base_url) = var(ENV_API_BASE) {
            self.set_provider_base_url(id, base_url);
        }

        Ok(())
    }
}
