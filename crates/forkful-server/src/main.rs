//! # forkful-server
//!
//! HTTP backend for Forkful, a personal restaurant collection.
//!
//! This binary provides:
//! - **REST API** (axum) for restaurants, their tags, dishes and photos,
//!   user dashboards and shared collections
//! - **Image storage** on local disk, served back under `/images`
//! - **Change streams** (server-sent events) for the single-restaurant view
//! - **Places lookups** to prefill the add-restaurant form

mod api;
mod auth;
mod config;
mod error;
mod image_store;
mod places;
mod realtime;
mod restaurants;

use std::sync::Arc;
use std::time::Duration;

use forkful_shared::constants::REALTIME_CHANNEL_CAPACITY;
use forkful_store::Database;
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::auth::HostedIdentity;
use crate::config::ServerConfig;
use crate::image_store::ImageStore;
use crate::places::PlacesClient;
use crate::realtime::RealtimeHub;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,forkful_server=debug")),
        )
        .init();

    info!("Starting Forkful server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(
        instance = %config.instance_name,
        addr = %config.http_addr,
        public_base_url = %config.public_base_url,
        places_enabled = config.places_api_key.is_some(),
        "Loaded configuration"
    );

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let db = match &config.database_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };

    let images = Arc::new(
        ImageStore::new(
            config.image_storage_path.clone(),
            config.max_image_size,
            config.public_base_url.clone(),
        )
        .await?,
    );

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .user_agent(concat!("forkful-server/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let identity = Arc::new(HostedIdentity::new(
        http.clone(),
        config.auth_url.clone(),
        config.auth_api_key.clone(),
    ));

    let places = config.places_api_key.as_ref().map(|key| {
        Arc::new(PlacesClient::new(
            http.clone(),
            config.places_base_url.clone(),
            key.clone(),
            config.places_country.clone(),
        ))
    });

    let http_addr = config.http_addr;
    let app_state = AppState {
        db: Arc::new(Mutex::new(db)),
        images,
        identity,
        realtime: RealtimeHub::new(REALTIME_CHANNEL_CAPACITY),
        places,
        config: Arc::new(config),
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server until it fails or Ctrl+C arrives
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
