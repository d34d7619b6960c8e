//! Restaurant, label, image and change-stream handlers.

use std::convert::Infallible;

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use forkful_shared::{LabelList, Restaurant, RestaurantForm, RestaurantImage, RestaurantWithImages};
use forkful_store::Database;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::AppState;
use crate::auth::{authenticate, AuthContext};
use crate::error::ServerError;
use crate::image_store::StoredImage;
use crate::realtime::ChangeKind;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

pub async fn create_restaurant(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<RestaurantForm>,
) -> Result<(StatusCode, Json<RestaurantWithImages>), ServerError> {
    let auth = authenticate(&state, &headers).await?;
    let new = form.validate().map_err(|e| {
        debug!(field = e.field(), error = %e, "Rejected restaurant form");
        e
    })?;
    let restaurant = new.into_restaurant(auth.user_id);
    let id = restaurant.id;

    let db = state.db.lock().await;
    db.create_restaurant(&restaurant)?;

    // The restaurant row stays even if an image insert fails below
    for url in form.image_urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty()) {
        db.add_image(&RestaurantImage::new(id, url)).map_err(|e| {
            warn!(restaurant = %id, error = %e, "Image insert failed after create");
            e
        })?;
    }

    let record = db.get_restaurant_with_images(id)?;
    info!(
        restaurant = %id,
        name = %record.restaurant.name,
        images = record.images.len(),
        "Restaurant created"
    );
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn get_restaurant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RestaurantWithImages>, ServerError> {
    let record = state.db.lock().await.get_restaurant_with_images(id)?;
    Ok(Json(record))
}

pub async fn delete_restaurant(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    let auth = authenticate(&state, &headers).await?;
    {
        let db = state.db.lock().await;
        owned_restaurant(&db, &auth, id)?;
        db.delete_restaurant(id)?;
    }

    state.realtime.publish(id, ChangeKind::Deleted);
    info!(restaurant = %id, "Restaurant deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn owned_restaurant(db: &Database, auth: &AuthContext, id: Uuid) -> Result<Restaurant, ServerError> {
    let restaurant = db.get_restaurant(id)?;
    auth.require_owner(&restaurant)?;
    Ok(restaurant)
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum LabelField {
    Tags,
    Dishes,
}

impl LabelField {
    fn name(self) -> &'static str {
        match self {
            LabelField::Tags => "tags",
            LabelField::Dishes => "recommended_dishes",
        }
    }

    fn of(self, restaurant: &mut Restaurant) -> &mut LabelList {
        match self {
            LabelField::Tags => &mut restaurant.tags,
            LabelField::Dishes => &mut restaurant.recommended_dishes,
        }
    }

    fn write(self, db: &Database, id: Uuid, labels: &LabelList) -> forkful_store::Result<bool> {
        match self {
            LabelField::Tags => db.replace_tags(id, labels),
            LabelField::Dishes => db.replace_dishes(id, labels),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddLabel {
    pub label: String,
}

/// Load the record, apply `edit` to one label list and write the whole
/// list back if it changed.
async fn update_labels<F>(
    state: &AppState,
    headers: &HeaderMap,
    id: Uuid,
    field: LabelField,
    edit: F,
) -> Result<Json<RestaurantWithImages>, ServerError>
where
    F: FnOnce(&mut LabelList) -> bool,
{
    let auth = authenticate(state, headers).await?;

    let (record, changed) = {
        let db = state.db.lock().await;
        let mut restaurant = owned_restaurant(&db, &auth, id)?;
        let labels = field.of(&mut restaurant);
        let changed = edit(labels);
        if changed && !field.write(&db, id, labels)? {
            return Err(ServerError::NotFound(format!("Restaurant {id}")));
        }
        (db.get_restaurant_with_images(id)?, changed)
    };

    if changed {
        state.realtime.publish(id, ChangeKind::LabelsUpdated);
        info!(restaurant = %id, field = field.name(), "Labels updated");
    }
    Ok(Json(record))
}

fn replace_with(new: LabelList) -> impl FnOnce(&mut LabelList) -> bool {
    move |labels| {
        if *labels == new {
            return false;
        }
        *labels = new;
        true
    }
}

pub async fn replace_tags(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(tags): Json<LabelList>,
) -> Result<Json<RestaurantWithImages>, ServerError> {
    update_labels(&state, &headers, id, LabelField::Tags, replace_with(tags)).await
}

pub async fn add_tag(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<AddLabel>,
) -> Result<Json<RestaurantWithImages>, ServerError> {
    update_labels(&state, &headers, id, LabelField::Tags, move |l| l.add(&body.label)).await
}

pub async fn replace_dishes(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(dishes): Json<LabelList>,
) -> Result<Json<RestaurantWithImages>, ServerError> {
    update_labels(&state, &headers, id, LabelField::Dishes, replace_with(dishes)).await
}

pub async fn add_dish(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<AddLabel>,
) -> Result<Json<RestaurantWithImages>, ServerError> {
    update_labels(&state, &headers, id, LabelField::Dishes, move |l| l.add(&body.label)).await
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// A body cut off by the router's size limit reports 413; anything else
/// is a malformed request.
fn multipart_error(e: MultipartError, max: usize) -> ServerError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        debug!(max, "Upload body over limit");
        ServerError::UploadTooLarge { max }
    } else {
        ServerError::BadRequest(format!("Multipart error: {}", e.body_text()))
    }
}

/// Pull the bytes of the `file` part out of a multipart body.
async fn file_field(multipart: &mut Multipart, max: usize) -> Result<Bytes, ServerError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max))?
    {
        if field.name() == Some("file") {
            return field.bytes().await.map_err(|e| multipart_error(e, max));
        }
    }

    Err(ServerError::BadRequest(
        "Missing 'file' field in multipart form".to_string(),
    ))
}

pub async fn upload_restaurant_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<RestaurantImage>), ServerError> {
    let auth = authenticate(&state, &headers).await?;
    owned_restaurant(&*state.db.lock().await, &auth, id)?;

    let data = file_field(&mut multipart, state.images.max_size()).await?;
    let stored = state.images.store_image(&data).await?;

    let image = RestaurantImage::new(id, stored.url.clone());
    let attached = attach_image(&*state.db.lock().await, &auth, &image);
    if let Err(e) = attached {
        state.images.discard(&stored.name).await;
        return Err(e);
    }

    state.realtime.publish(id, ChangeKind::ImageAdded);
    info!(restaurant = %id, name = %stored.name, size = data.len(), "Image attached");
    Ok((StatusCode::CREATED, Json(image)))
}

/// Insert the gallery row, re-checking ownership under the same lock since
/// the restaurant may have been deleted while the file was being written.
fn attach_image(db: &Database, auth: &AuthContext, image: &RestaurantImage) -> Result<(), ServerError> {
    owned_restaurant(db, auth, image.restaurant_id)?;
    db.add_image(image)?;
    Ok(())
}

/// Upload before the restaurant exists; the URL is sent back with the
/// create request.
pub async fn upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<StoredImage>), ServerError> {
    let auth = authenticate(&state, &headers).await?;
    let data = file_field(&mut multipart, state.images.max_size()).await?;
    let stored = state.images.store_image(&data).await?;

    info!(user = %auth.user_id, name = %stored.name, size = data.len(), "Image uploaded");
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn serve_image(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let (data, kind) = state.images.get_image(&name).await?;
    Ok((
        [
            (header::CONTENT_TYPE, kind.content_type()),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        data,
    ))
}

// ---------------------------------------------------------------------------
// Change stream
// ---------------------------------------------------------------------------

pub async fn restaurant_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ServerError> {
    state.db.lock().await.get_restaurant(id)?;

    let stream = state.realtime.subscribe(id).map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok(Event::default().event(event.kind.as_str()).data(data))
    });

    debug!(restaurant = %id, "Change stream opened");
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, Utc};
    use forkful_shared::{NewRestaurant, User, UserId};
    use tempfile::TempDir;

    use super::*;

    fn setup() -> (Database, AuthContext, Restaurant, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        let auth = AuthContext {
            user_id: UserId::from("alice"),
            display_name: None,
            email: None,
        };
        db.upsert_user(&User {
            id: auth.user_id.clone(),
            display_name: None,
            email: None,
            created_at: Utc::now(),
        })
        .unwrap();

        let restaurant = NewRestaurant {
            name: "Hawker".into(),
            latitude: 1.3,
            longitude: 103.8,
            opening_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            closing_time: NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
            tags: LabelList::new(),
            recommended_dishes: LabelList::new(),
        }
        .into_restaurant(auth.user_id.clone());
        db.create_restaurant(&restaurant).unwrap();
        (db, auth, restaurant, dir)
    }

    #[test]
    fn test_attach_image() {
        let (db, auth, restaurant, _dir) = setup();
        let image = RestaurantImage::new(restaurant.id, "http://x/images/a.png");

        attach_image(&db, &auth, &image).unwrap();
        assert_eq!(db.list_images(restaurant.id).unwrap().len(), 1);
    }

    #[test]
    fn test_attach_image_after_delete_is_not_found() {
        let (db, auth, restaurant, _dir) = setup();
        db.delete_restaurant(restaurant.id).unwrap();

        let image = RestaurantImage::new(restaurant.id, "http://x/images/a.png");
        assert!(matches!(
            attach_image(&db, &auth, &image),
            Err(ServerError::NotFound(_))
        ));
    }

    #[test]
    fn test_attach_image_requires_owner() {
        let (db, _auth, restaurant, _dir) = setup();
        let bob = AuthContext {
            user_id: UserId::from("bob"),
            display_name: None,
            email: None,
        };

        let image = RestaurantImage::new(restaurant.id, "http://x/images/a.png");
        assert!(matches!(
            attach_image(&db, &bob, &image),
            Err(ServerError::Forbidden(_))
        ));
        assert!(db.list_images(restaurant.id).unwrap().is_empty());
    }
}
