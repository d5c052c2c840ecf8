mod config;
mod document;
mod editor;
mod errors;
mod export;
mod layout;
mod preview;
mod routes;
mod session;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::export::{AssetLoader, HttpFetcher};
use crate::layout::default_page_config;
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cvkit v{}", env!("CARGO_PKG_VERSION"));

    // Asset loader for export resources (the header photo)
    let asset_timeout = Duration::from_secs(config.asset_timeout_secs);
    let fetcher = HttpFetcher::new(asset_timeout)?;
    let assets = Arc::new(AssetLoader::new(Arc::new(fetcher), asset_timeout));
    info!("Asset loader initialized (timeout: {}s)", config.asset_timeout_secs);

    // A4 export surface at the configured scale
    let page_config = default_page_config().with_scale(config.export_scale);
    info!(
        "Export page config: {}x{}pt, scale {}",
        page_config.page_width_pt, page_config.page_height_pt, page_config.scale
    );

    // Session store, swept for idle sessions
    let idle_timeout = Duration::from_secs(config.session_idle_secs);
    let sessions = SessionStore::new(config.max_sessions, idle_timeout);
    sessions.spawn_idle_sweeper(idle_timeout / 4);
    info!(
        "Session store ready (max: {}, idle timeout: {}s)",
        config.max_sessions, config.session_idle_secs
    );

    // Build app state
    let state = AppState {
        sessions,
        config: config.clone(),
        page_config,
        assets,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the editor front end has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
