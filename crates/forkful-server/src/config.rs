//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use forkful_shared::constants::{APP_NAME, DEFAULT_HTTP_PORT, MAX_IMAGE_SIZE};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `None` (platform data directory).
    pub database_path: Option<PathBuf>,

    /// Directory where uploaded restaurant images are written.
    /// Env: `IMAGE_STORAGE_PATH`
    /// Default: `./images`
    pub image_storage_path: PathBuf,

    /// Maximum upload size in bytes.
    /// Env: `MAX_IMAGE_SIZE`
    /// Default: 10 MiB
    pub max_image_size: usize,

    /// Externally visible base URL, used to build image and share links.
    /// Env: `PUBLIC_BASE_URL`
    /// Default: `http://localhost:8080`
    pub public_base_url: String,

    /// Human-readable name for this instance.
    /// Env: `INSTANCE_NAME`
    pub instance_name: String,

    /// Base URL of the hosted identity provider.
    /// Env: `AUTH_URL`
    /// Default: `http://localhost:9999`
    pub auth_url: String,

    /// Project key sent to the identity provider as `apikey`.
    /// Env: `AUTH_API_KEY`
    pub auth_api_key: String,

    /// Places API key. Places lookups are disabled while unset.
    /// Env: `PLACES_API_KEY`
    pub places_api_key: Option<String>,

    /// Env: `PLACES_BASE_URL`
    pub places_base_url: String,

    /// ISO country code restricting place predictions.
    /// Env: `PLACES_COUNTRY`
    /// Default: `sg`
    pub places_country: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: None,
            image_storage_path: PathBuf::from("./images"),
            max_image_size: MAX_IMAGE_SIZE,
            public_base_url: format!("http://localhost:{DEFAULT_HTTP_PORT}"),
            instance_name: APP_NAME.to_string(),
            auth_url: "http://localhost:9999".to_string(),
            auth_api_key: String::new(),
            places_api_key: None,
            places_base_url: "https://maps.googleapis.com/maps/api/place".to_string(),
            places_country: "sg".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            match addr.parse::<SocketAddr>() {
                Ok(parsed) => config.http_addr = parsed,
                Err(_) => tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default"),
            }
        }

        if let Some(path) = lookup("DATABASE_PATH").filter(|p| !p.is_empty()) {
            config.database_path = Some(PathBuf::from(path));
        }

        if let Some(path) = lookup("IMAGE_STORAGE_PATH") {
            config.image_storage_path = PathBuf::from(path);
        }

        if let Some(val) = lookup("MAX_IMAGE_SIZE") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_image_size = n,
                _ => tracing::warn!(value = %val, "Invalid MAX_IMAGE_SIZE, using default"),
            }
        }

        if let Some(url) = lookup("PUBLIC_BASE_URL") {
            config.public_base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(name) = lookup("INSTANCE_NAME") {
            config.instance_name = name;
        }

        if let Some(url) = lookup("AUTH_URL") {
            config.auth_url = url.trim_end_matches('/').to_string();
        }

        if let Some(key) = lookup("AUTH_API_KEY") {
            config.auth_api_key = key;
        }

        config.places_api_key = lookup("PLACES_API_KEY").filter(|k| !k.is_empty());

        if let Some(url) = lookup("PLACES_BASE_URL") {
            config.places_base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(country) = lookup("PLACES_COUNTRY") {
            config.places_country = country.to_lowercase();
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }

    /// Public link to a user's shared collection.
    pub fn share_url(&self, user: &forkful_shared::UserId) -> String {
        format!("{}{}", self.public_base_url, user.share_path())
    }
}
