//! HTTP surface of the weather gateway.
//!
//! Two deployment variants share one [`AppState`]:
//! - [`Deployment::Standalone`]: separate city and coordinate endpoints; a
//!   successful city lookup is logged to the search history.
//! - [`Deployment::RouteHandler`]: a single lookup endpoint taking a city or
//!   coordinates; history is only written through `POST /api/searches`.

pub mod error;
pub mod routes;
pub mod state;

use anyhow::Context;
use weather_core::{Config, ProviderId, config::ENV_PROVIDER};

pub use error::AppError;
pub use routes::create_router;
pub use state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Deployment {
    #[default]
    Standalone,
    RouteHandler,
}

impl Deployment {
    /// Provider used when the configuration names none.
    pub fn default_provider(&self) -> ProviderId {
        match self {
            Deployment::Standalone => ProviderId::WeatherApi,
            Deployment::RouteHandler => ProviderId::OpenWeather,
        }
    }
}

/// Layer startup overrides onto a loaded config.
///
/// An explicit `provider` wins over both the config file and
/// `WEATHER_PROVIDER`; key and base URL variables then target it.
pub fn apply_startup_overrides<F>(
    cfg: &mut Config,
    provider: Option<&str>,
    deployment: Deployment,
    lookup: F,
) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let explicit = provider
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(ProviderId::try_from)
        .transpose()
        .context("Invalid --provider")?;

    if let Some(id) = explicit {
        cfg.set_default_provider(id);
    }

    cfg.apply_overrides_from(deployment.default_provider(), |name| {
        if explicit.is_some() && name == ENV_PROVIDER { None } else { lookup(name) }
    })
}
