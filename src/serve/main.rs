//! HTTP server for address → nearby detections queries.
//!
//! Loads the tile catalog and the detection dataset once at startup, then
//! answers queries against them until shut down.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use panomapper::config::Config;
use panomapper::geocode::Geocoder;
use panomapper::Session;

mod handlers;
use handlers::{detections_handler, health_handler, neighborhood_handler, tile_handler, AppState};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "serve")]
#[command(about = "Serve detections around geocoded addresses")]
struct Args {
    /// TOML configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides [server].listen
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }

    info!("PanoMapper detection server");

    let session = Session::load(&config)
        .await
        .context("Cannot start without tile catalog and detections")?;

    let geocoder = Geocoder::new(
        &config.geocoder.url,
        &config.geocoder.user_agent,
        config.geocoder.timeout(),
    )?;

    let state = Arc::new(AppState {
        session,
        geocoder,
        name_property: config.catalog.name_property.clone(),
    });

    let app = build_router(state);

    info!("Starting server on {}", config.server.listen);

    let listener = tokio::net::TcpListener::bind(&config.server.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/detections", get(detections_handler))
        .route("/v1/neighborhood", get(neighborhood_handler))
        .route("/v1/tiles/{name}", get(tile_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
