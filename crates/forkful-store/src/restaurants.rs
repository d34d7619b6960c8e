//! CRUD operations for [`Restaurant`] records.

use std::collections::HashMap;

use forkful_shared::{suggestions, LabelList, Restaurant, RestaurantWithImages, UserId};
use rusqlite::params;
use serde::Serialize;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{not_found, Result};
use crate::rows::{
    encode_labels, encode_timestamp, labels_at, time_at, timestamp_at, uuid_at, TIME_FORMAT,
};

const COLUMNS: &str = "id, name, latitude, longitude, opening_time, closing_time,
                       tags, recommended_dishes, user_id, created_at";

/// Labels a user has used before, offered as shortcuts in the editor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelSuggestions {
    pub tags: Vec<String>,
    pub recommended_dishes: Vec<String>,
}

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new restaurant.
    pub fn create_restaurant(&self, restaurant: &Restaurant) -> Result<()> {
        self.conn().execute(
            "INSERT INTO restaurants (id, name, latitude, longitude, opening_time, closing_time,
                                      tags, recommended_dishes, user_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                restaurant.id.to_string(),
                restaurant.name,
                restaurant.latitude,
                restaurant.longitude,
                restaurant.opening_time.format(TIME_FORMAT).to_string(),
                restaurant.closing_time.format(TIME_FORMAT).to_string(),
                encode_labels(&restaurant.tags)?,
                encode_labels(&restaurant.recommended_dishes)?,
                restaurant.user_id.as_str(),
                encode_timestamp(&restaurant.created_at),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single restaurant by UUID.
    pub fn get_restaurant(&self, id: Uuid) -> Result<Restaurant> {
        self.conn()
            .query_row(
                &format!("SELECT {COLUMNS} FROM restaurants WHERE id = ?1"),
                params![id.to_string()],
                row_to_restaurant,
            )
            .map_err(not_found)
    }

    /// Fetch a restaurant together with its gallery, oldest image first.
    pub fn get_restaurant_with_images(&self, id: Uuid) -> Result<RestaurantWithImages> {
        let restaurant = self.get_restaurant(id)?;
        let images = self.list_images(id)?;
        Ok(RestaurantWithImages::new(restaurant, images))
    }

    /// Every restaurant with its images, in insertion order.
    pub fn list_restaurants(&self) -> Result<Vec<RestaurantWithImages>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {COLUMNS} FROM restaurants ORDER BY created_at ASC"
        ))?;
        let rows = stmt.query_map([], row_to_restaurant)?;

        let mut restaurants = Vec::new();
        for row in rows {
            restaurants.push(row?);
        }
        self.attach_images(restaurants)
    }

    /// One user's restaurants with their images, newest first.
    pub fn list_restaurants_for_user(&self, user: &UserId) -> Result<Vec<RestaurantWithImages>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {COLUMNS} FROM restaurants
             WHERE user_id = ?1
             ORDER BY created_at DESC"
        ))?;
        let rows = stmt.query_map(params![user.as_str()], row_to_restaurant)?;

        let mut restaurants = Vec::new();
        for row in rows {
            restaurants.push(row?);
        }
        self.attach_images(restaurants)
    }

    /// Distinct tags and dishes across all of a user's restaurants.
    pub fn label_suggestions(&self, user: &UserId) -> Result<LabelSuggestions> {
        let mut stmt = self.conn().prepare(
            "SELECT tags, recommended_dishes FROM restaurants
             WHERE user_id = ?1
             ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![user.as_str()], |row| {
            Ok((labels_at(row, 0)?, labels_at(row, 1)?))
        })?;

        let mut tags = Vec::new();
        let mut dishes = Vec::new();
        for row in rows {
            let (t, d) = row?;
            tags.push(t);
            dishes.push(d);
        }

        Ok(LabelSuggestions {
            tags: suggestions(tags.iter().map(LabelList::as_slice)),
            recommended_dishes: suggestions(dishes.iter().map(LabelList::as_slice)),
        })
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Replace the whole tag list. Returns `false` if the restaurant does
    /// not exist.
    pub fn replace_tags(&self, id: Uuid, tags: &LabelList) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE restaurants SET tags = ?1 WHERE id = ?2",
            params![encode_labels(tags)?, id.to_string()],
        )?;
        Ok(affected > 0)
    }

    /// Replace the whole recommended-dish list.
    pub fn replace_dishes(&self, id: Uuid, dishes: &LabelList) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE restaurants SET recommended_dishes = ?1 WHERE id = ?2",
            params![encode_labels(dishes)?, id.to_string()],
        )?;
        Ok(affected > 0)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a restaurant and, by cascade, its images. Returns `true` if a
    /// row was deleted.
    pub fn delete_restaurant(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM restaurants WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }

    fn attach_images(&self, restaurants: Vec<Restaurant>) -> Result<Vec<RestaurantWithImages>> {
        let mut by_restaurant = self.images_by_restaurant()?;
        Ok(restaurants
            .into_iter()
            .map(|r| {
                let images = by_restaurant.remove(&r.id).unwrap_or_default();
                RestaurantWithImages::new(r, images)
            })
            .collect())
    }

    fn images_by_restaurant(&self) -> Result<HashMap<Uuid, Vec<forkful_shared::RestaurantImage>>> {
        let mut map: HashMap<Uuid, Vec<_>> = HashMap::new();
        for image in self.list_all_images()? {
            map.entry(image.restaurant_id).or_default().push(image);
        }
        Ok(map)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`Restaurant`].
fn row_to_restaurant(row: &rusqlite::Row<'_>) -> rusqlite::Result<Restaurant> {
    let user_id: String = row.get(8)?;

    Ok(Restaurant {
        id: uuid_at(row, 0)?,
        name: row.get(1)?,
        latitude: row.get(2)?,
        longitude: row.get(3)?,
        opening_time: time_at(row, 4)?,
        closing_time: time_at(row, 5)?,
        tags: labels_at(row, 6)?,
        recommended_dishes: labels_at(row, 7)?,
        user_id: UserId(user_id),
        created_at: timestamp_at(row, 9)?,
    })
}
