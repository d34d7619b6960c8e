//! Restaurant gallery rows. Images are append-only; they disappear only
//! when their restaurant is deleted.

use forkful_shared::RestaurantImage;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::Result;
use crate::rows::{encode_timestamp, timestamp_at, uuid_at};

impl Database {
    pub fn add_image(&self, image: &RestaurantImage) -> Result<()> {
        self.conn().execute(
            "INSERT INTO restaurant_images (id, restaurant_id, image_url, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                image.id.to_string(),
                image.restaurant_id.to_string(),
                image.image_url,
                encode_timestamp(&image.created_at),
            ],
        )?;
        Ok(())
    }

    /// Images of one restaurant, oldest first.
    pub fn list_images(&self, restaurant_id: Uuid) -> Result<Vec<RestaurantImage>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, restaurant_id, image_url, created_at
             FROM restaurant_images
             WHERE restaurant_id = ?1
             ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![restaurant_id.to_string()], row_to_image)?;

        let mut images = Vec::new();
        for row in rows {
            images.push(row?);
        }
        Ok(images)
    }

    pub(crate) fn list_all_images(&self) -> Result<Vec<RestaurantImage>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, restaurant_id, image_url, created_at
             FROM restaurant_images
             ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map([], row_to_image)?;

        let mut images = Vec::new();
        for row in rows {
            images.push(row?);
        }
        Ok(images)
    }
}

fn row_to_image(row: &rusqlite::Row<'_>) -> rusqlite::Result<RestaurantImage> {
    Ok(RestaurantImage {
        id: uuid_at(row, 0)?,
        restaurant_id: uuid_at(row, 1)?,
        image_url: row.get(2)?,
        created_at: timestamp_at(row, 3)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveTime, Utc};
    use forkful_shared::{LabelList, NewRestaurant, User, UserId};

    use super::*;

    #[test]
    fn test_images_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        let user = UserId::from("alice");
        db.upsert_user(&User {
            id: user.clone(),
            display_name: None,
            email: None,
            created_at: Utc::now(),
        })
        .unwrap();

        let r = NewRestaurant {
            name: "Gallery".into(),
            latitude: 0.0,
            longitude: 0.0,
            opening_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            closing_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            tags: LabelList::new(),
            recommended_dishes: LabelList::new(),
        }
        .into_restaurant(user);
        db.create_restaurant(&r).unwrap();

        let mut late = RestaurantImage::new(r.id, "late.jpg");
        let early = RestaurantImage::new(r.id, "early.jpg");
        late.created_at = early.created_at + Duration::seconds(30);
        db.add_image(&late).unwrap();
        db.add_image(&early).unwrap();

        let urls: Vec<_> = db
            .list_images(r.id)
            .unwrap()
            .into_iter()
            .map(|i| i.image_url)
            .collect();
        assert_eq!(urls, ["early.jpg", "late.jpg"]);
    }

    #[test]
    fn test_image_requires_restaurant() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        assert!(db.add_image(&RestaurantImage::new(Uuid::new_v4(), "x.png")).is_err());
    }
}
