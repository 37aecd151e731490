mod client;
mod config;
mod errors;
mod render;
mod routes;
mod state;
mod tagline;
mod wizard;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::client::HttpTaglineClient;
use crate::config::Config;
use crate::render::CardRenderer;
use crate::routes::build_router;
use crate::state::AppState;
use crate::tagline::service::{TaglineGenerator, TaglineService};
use crate::wizard::session::{spawn_eviction, SessionStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CozyCard API v{}", env!("CARGO_PKG_VERSION"));

    let generator = Arc::new(TaglineGenerator::new());

    // The wizard talks to a remote tagline service when one is configured
    let tagline_service: Arc<dyn TaglineService> = match &config.tagline_service_url {
        Some(url) => {
            let client = HttpTaglineClient::new(url, config.tagline_timeout())?;
            info!("Wizard taglines via {}", client.endpoint());
            Arc::new(client)
        }
        None => {
            info!("Wizard taglines generated in-process");
            generator.clone()
        }
    };

    let renderer = CardRenderer::new(config.export_scale)?;
    let (width, height) = renderer.dimensions();
    info!("Card export at {width}x{height} (scale {})", renderer.scale());

    let cors = cors_layer(&config.allowed_origins)?;

    let sessions = Arc::new(SessionStore::new(config.session_idle_ttl()));
    spawn_eviction(sessions.clone());
    info!("Idle sessions evicted after {}s", config.session_idle_secs);

    let state = AppState {
        config: config.clone(),
        generator,
        tagline_service,
        sessions,
        renderer,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Allows the configured front-end origins, with credentials.
fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("Invalid origin in ALLOWED_ORIGINS: '{o}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true))
}
