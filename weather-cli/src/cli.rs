use anyhow::{Context, bail};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, PasswordDisplayMode};
use tracing::{debug, warn};
use weather_core::{
    Config, LocalHistory, NewSearch, ProviderId, WeatherQuery,
    history::MERGED_HISTORY_LIMIT,
    local_store::FileStore,
    merge_remote_and_local,
    provider::{self, default_provider_from_config, provider_from_config},
    remote::HistoryClient,
};

use crate::display;

/// Provider used when neither the config nor the environment names one.
const FALLBACK_PROVIDER: ProviderId = ProviderId::WeatherApi;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "weatherapi".
        provider: String,
    },

    /// Show current weather for a city or a coordinate pair.
    Show {
        /// City name.
        city: Option<String>,

        /// Latitude, used when no city is given.
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude, used when no city is given.
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Override the configured provider.
        #[arg(long)]
        provider: Option<String>,

        /// Also log the search to a running weather server.
        #[arg(long)]
        server: Option<String>,

        /// Print the normalized record as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show recent searches.
    History {
        /// Merge in the history of a running weather server.
        #[arg(long)]
        server: Option<String>,

        /// Maximum number of entries shown.
        #[arg(long, default_value_t = MERGED_HISTORY_LIMIT)]
        limit: usize,

        /// Remove all locally stored searches.
        #[arg(long)]
        clear: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Show { city, lat, lon, provider, server, json } => {
                let query = WeatherQuery::from_parts(city.as_deref(), lat, lon)?;
                show(query, provider.as_deref(), server.as_deref(), json).await
            }
            Command::History { server, limit, clear } => {
                if clear {
                    local_history()?.clear()?;
                    println!("Search history cleared.");
                    Ok(())
                } else {
                    history(server.as_deref(), limit).await
                }
            }
        }
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut cfg = Config::load()?;

    let api_key = Password::new(&format!("API key for {id}:"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    cfg.upsert_provider_api_key(id, api_key);

    if cfg.default_provider_id().ok() != Some(id) {
        let make_default = Confirm::new(&format!("Make {id} the default provider?"))
            .with_default(true)
            .prompt()
            .context("Failed to read answer")?;
        if make_default {
            cfg.set_default_provider(id);
        }
    }

    cfg.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(
    query: WeatherQuery,
    provider_name: Option<&str>,
    server: Option<&str>,
    as_json: bool,
) -> anyhow::Result<()> {
    let mut cfg = Config::load()?;
    cfg.apply_env_overrides(FALLBACK_PROVIDER)?;

    let gateway = match provider_name {
        Some(name) => provider_from_config(ProviderId::try_from(name)?, &cfg),
        None => default_provider_from_config(&cfg, FALLBACK_PROVIDER)?,
    };
    debug!(provider = %gateway.id(), kind = query.kind(), "looking up weather");

    let record = provider::lookup(gateway.as_ref(), &query).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print!("{}", display::render_card(&record, cfg.icon_template(), &Local));
    }

    let Some(search) = NewSearch::from_record(&record) else {
        warn!("response carried no city name; search not recorded");
        return Ok(());
    };

    if let Err(err) = local_history().and_then(|h| Ok(h.record(search.clone())?)) {
        warn!("failed to save search locally: {err:#}");
    }

    if let Some(url) = server {
        if let Err(err) = HistoryClient::new(url).log(&search).await {
            warn!("failed to log search to {url}: {err:#}");
        }
    }

    Ok(())
}

async fn history(server: Option<&str>, limit: usize) -> anyhow::Result<()> {
    let local = local_history()?.entries();

    let remote = match server {
        Some(url) => HistoryClient::new(url).list().await.unwrap_or_else(|err| {
            warn!("falling back to local history: {err:#}");
            Vec::new()
        }),
        None => Vec::new(),
    };

    let merged = merge_remote_and_local(&remote, &local, limit);
    print!("{}", display::render_history(&merged, Utc::now()));
    Ok(())
}

fn local_history() -> anyhow::Result<LocalHistory<FileStore>> {
    Ok(LocalHistory::new(FileStore::in_data_dir()?))
}
