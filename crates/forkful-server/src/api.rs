use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{HeaderMap, Method},
    routing::{get, post, put},
    Json, Router,
};
use forkful_shared::{filter_with, RestaurantWithImages, SearchFields, User, UserId};
use forkful_store::{Database, LabelSuggestions};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::{authenticate, IdentityProvider};
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::image_store::ImageStore;
use crate::places::{PlaceDetails, PlacePrediction, PlacesClient};
use crate::realtime::RealtimeHub;
use crate::restaurants;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub images: Arc<ImageStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub realtime: RealtimeHub,
    /// `None` while no places API key is configured.
    pub places: Option<Arc<PlacesClient>>,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    // Room for multipart framing around a maximum-size image
    let body_limit = state.images.max_size() + 64 * 1024;

    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route(
            "/restaurants",
            get(list_restaurants).post(restaurants::create_restaurant),
        )
        .route(
            "/restaurants/{id}",
            get(restaurants::get_restaurant).delete(restaurants::delete_restaurant),
        )
        .route(
            "/restaurants/{id}/tags",
            put(restaurants::replace_tags).post(restaurants::add_tag),
        )
        .route(
            "/restaurants/{id}/dishes",
            put(restaurants::replace_dishes).post(restaurants::add_dish),
        )
        .route(
            "/restaurants/{id}/images",
            post(restaurants::upload_restaurant_image),
        )
        .route("/restaurants/{id}/events", get(restaurants::restaurant_events))
        .route("/uploads", post(restaurants::upload_image))
        .route("/images/{name}", get(restaurants::serve_image))
        .route("/me", get(me))
        .route("/me/restaurants", get(my_restaurants))
        .route("/me/suggestions", get(my_suggestions))
        .route("/users/{id}", get(user_profile))
        .route("/users/{id}/restaurants", get(user_restaurants))
        .route("/places/search", get(places_search))
        .route("/places/{place_id}", get(place_details))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ServerInfoResponse {
    name: String,
    version: &'static str,
    places_enabled: bool,
}

#[derive(Serialize)]
struct MeResponse {
    #[serde(flatten)]
    user: User,
    share_url: String,
}

/// Public view of a user; no email.
#[derive(Serialize)]
struct ProfileResponse {
    id: UserId,
    display_name: Option<String>,
    share_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    #[serde(default)]
    search: String,
    #[serde(default)]
    fields: SearchFields,
}

impl ListParams {
    fn apply(&self, records: &[RestaurantWithImages]) -> Vec<RestaurantWithImages> {
        filter_with(records, &self.search, self.fields)
            .into_iter()
            .cloned()
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
struct PlacesQuery {
    #[serde(default)]
    q: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn server_info(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    Json(ServerInfoResponse {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        places_enabled: state.places.is_some(),
    })
}

/// Public feed: every restaurant, those with photos first.
async fn list_restaurants(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<RestaurantWithImages>>, ServerError> {
    let mut records = state.db.lock().await.list_restaurants()?;
    forkful_shared::order_images_first(&mut records);
    Ok(Json(params.apply(&records)))
}

async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, ServerError> {
    let auth = authenticate(&state, &headers).await?;
    let user = state.db.lock().await.get_user(&auth.user_id)?;
    Ok(Json(MeResponse {
        share_url: state.config.share_url(&user.id),
        user,
    }))
}

async fn my_restaurants(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<RestaurantWithImages>>, ServerError> {
    let auth = authenticate(&state, &headers).await?;
    let records = state
        .db
        .lock()
        .await
        .list_restaurants_for_user(&auth.user_id)?;
    Ok(Json(params.apply(&records)))
}

async fn my_suggestions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<LabelSuggestions>, ServerError> {
    let auth = authenticate(&state, &headers).await?;
    let suggestions = state.db.lock().await.label_suggestions(&auth.user_id)?;
    Ok(Json(suggestions))
}

async fn user_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProfileResponse>, ServerError> {
    let user = state.db.lock().await.get_user(&UserId(id))?;
    Ok(Json(ProfileResponse {
        share_url: state.config.share_url(&user.id),
        id: user.id,
        display_name: user.display_name,
    }))
}

/// A shared collection, newest first.
async fn user_restaurants(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<RestaurantWithImages>>, ServerError> {
    let records = state
        .db
        .lock()
        .await
        .list_restaurants_for_user(&UserId(id))?;
    Ok(Json(params.apply(&records)))
}

fn places_client(state: &AppState) -> Result<&PlacesClient, ServerError> {
    state.places.as_deref().ok_or(ServerError::PlacesDisabled)
}

async fn places_search(
    State(state): State<AppState>,
    Query(query): Query<PlacesQuery>,
) -> Result<Json<Vec<PlacePrediction>>, ServerError> {
    let predictions = places_client(&state)?.search(&query.q).await?;
    Ok(Json(predictions))
}

async fn place_details(
    State(state): State<AppState>,
    Path(place_id): Path<String>,
) -> Result<Json<PlaceDetails>, ServerError> {
    let details = places_client(&state)?.details(&place_id).await?;
    Ok(Json(details))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
