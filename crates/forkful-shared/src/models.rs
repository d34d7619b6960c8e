//! Domain records shared by the store and the HTTP API.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be returned
//! to clients as JSON unchanged.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::labels::LabelList;
use crate::types::UserId;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// Profile of a user known to the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub display_name: Option<String>,
    pub email: Option<String>,
    /// When this profile was first seen locally.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Restaurant
// ---------------------------------------------------------------------------

/// A restaurant in one user's collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    /// Decimal degrees, -90..=90.
    pub latitude: f64,
    /// Decimal degrees, -180..=180.
    pub longitude: f64,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    pub tags: LabelList,
    pub recommended_dishes: LabelList,
    /// Owner; the only user allowed to modify this record.
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Restaurant {
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.user_id == user
    }
}

/// Validated input for creating a [`Restaurant`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewRestaurant {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    pub tags: LabelList,
    pub recommended_dishes: LabelList,
}

impl NewRestaurant {
    /// Assign identity, owner and creation time.
    pub fn into_restaurant(self, owner: UserId) -> Restaurant {
        Restaurant {
            id: Uuid::new_v4(),
            name: self.name,
            latitude: self.latitude,
            longitude: self.longitude,
            opening_time: self.opening_time,
            closing_time: self.closing_time,
            tags: self.tags,
            recommended_dishes: self.recommended_dishes,
            user_id: owner,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// RestaurantImage
// ---------------------------------------------------------------------------

/// A photo attached to a restaurant. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RestaurantImage {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

impl RestaurantImage {
    pub fn new(restaurant_id: Uuid, image_url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            restaurant_id,
            image_url: image_url.into(),
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// RestaurantWithImages
// ---------------------------------------------------------------------------

/// A restaurant together with its gallery, as loaded for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestaurantWithImages {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    /// Oldest first.
    pub images: Vec<RestaurantImage>,
}

impl RestaurantWithImages {
    pub fn new(restaurant: Restaurant, mut images: Vec<RestaurantImage>) -> Self {
        images.sort_by_key(|img| img.created_at);
        Self { restaurant, images }
    }

    pub fn has_images(&self) -> bool {
        !self.images.is_empty()
    }
}

/// Move records that have at least one image to the front, keeping the
/// relative order inside each group.
pub fn order_images_first(records: &mut [RestaurantWithImages]) {
    records.sort_by_key(|r| !r.has_images());
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn restaurant(name: &str) -> Restaurant {
        NewRestaurant {
            name: name.to_string(),
            latitude: 1.3,
            longitude: 103.8,
            opening_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            closing_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            tags: LabelList::new(),
            recommended_dishes: LabelList::new(),
        }
        .into_restaurant(UserId::from("owner"))
    }

    #[test]
    fn test_images_sorted_oldest_first() {
        let r = restaurant("Hawker");
        let mut newer = RestaurantImage::new(r.id, "b.jpg");
        let older = RestaurantImage::new(r.id, "a.jpg");
        newer.created_at = older.created_at + Duration::seconds(5);

        let loaded = RestaurantWithImages::new(r, vec![newer, older]);
        assert_eq!(loaded.images[0].image_url, "a.jpg");
        assert_eq!(loaded.images[1].image_url, "b.jpg");
    }

    #[test]
    fn test_order_images_first_is_stable() {
        let a = RestaurantWithImages::new(restaurant("a"), vec![]);
        let b_rest = restaurant("b");
        let b_img = RestaurantImage::new(b_rest.id, "b.png");
        let b = RestaurantWithImages::new(b_rest, vec![b_img]);
        let c = RestaurantWithImages::new(restaurant("c"), vec![]);
        let d_rest = restaurant("d");
        let d_img = RestaurantImage::new(d_rest.id, "d.png");
        let d = RestaurantWithImages::new(d_rest, vec![d_img]);

        let mut records = vec![a, b, c, d];
        order_images_first(&mut records);
        let names: Vec<_> = records.iter().map(|r| r.restaurant.name.as_str()).collect();
        assert_eq!(names, ["b", "d", "a", "c"]);
    }

    #[test]
    fn test_ownership() {
        let r = restaurant("Cafe");
        assert!(r.is_owned_by(&UserId::from("owner")));
        assert!(!r.is_owned_by(&UserId::from("someone-else")));
    }

    #[test]
    fn test_flattened_json_shape() {
        let r = restaurant("Flat");
        let json = serde_json::to_value(RestaurantWithImages::new(r, vec![])).unwrap();
        assert_eq!(json["name"], "Flat");
        assert_eq!(json["opening_time"], "09:00:00");
        assert!(json["images"].as_array().unwrap().is_empty());
    }
}
