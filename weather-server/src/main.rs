use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use weather_core::{Config, provider::default_provider_from_config};
use weather_server::{AppState, Deployment, apply_startup_overrides, create_router};

#[derive(Debug, Parser)]
#[command(name = "weather-server", version, about = "Weather lookup gateway")]
struct Args {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// HTTP surface to expose.
    #[arg(long, env = "WEATHER_VARIANT", value_enum, default_value_t = Deployment::Standalone)]
    variant: Deployment,

    /// Upstream provider, e.g. "openweather" or "weatherapi".
    #[arg(long, env = "WEATHER_PROVIDER")]
    provider: Option<String>,

    /// Config file; defaults to the platform config directory.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is normal outside development.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "weather_server=info,weather_core=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    apply_startup_overrides(&mut cfg, args.provider.as_deref(), args.variant, |name| {
        std::env::var(name).ok()
    })?;

    let provider = default_provider_from_config(&cfg, args.variant.default_provider())?;
    tracing::info!(
        provider = %provider.id(),
        variant = ?args.variant,
        api_key_configured = cfg.is_provider_configured(provider.id()),
        "starting weather gateway"
    );

    let state = AppState::new(Arc::from(provider));
    let app = create_router(state, args.variant).layer(
        // Header capture stays off so API keys in future auth headers never hit the logs.
        TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::new().include_headers(false)),
    );

    let addr = format!("{}:{}", args.host, args.port);
    let listener =
        TcpListener::bind(&addr).await.with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("listening on {addr}");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for ctrl_c: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::warn!("failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
