//! The add-restaurant form and its validation.
//!
//! Fields arrive as the user typed them; [`RestaurantForm::validate`] turns
//! them into a [`NewRestaurant`] or reports the first offending field.

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer};

use crate::error::ValidationError;
use crate::labels::LabelList;
use crate::models::NewRestaurant;

/// Raw add-restaurant form input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestaurantForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub opening_time: String,
    #[serde(default)]
    pub closing_time: String,
    /// Accepts a JSON number or the text of a number input.
    #[serde(default, deserialize_with = "number_or_text")]
    pub latitude: String,
    #[serde(default, deserialize_with = "number_or_text")]
    pub longitude: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub recommended_dishes: Vec<String>,
    /// Already-uploaded image URLs to attach after the restaurant is created.
    #[serde(default)]
    pub image_urls: Vec<String>,
}

impl RestaurantForm {
    pub fn validate(&self) -> Result<NewRestaurant, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::Missing { field: "name" });
        }

        let opening_time = parse_time("opening_time", &self.opening_time)?;
        let closing_time = parse_time("closing_time", &self.closing_time)?;
        let latitude = parse_coordinate("latitude", &self.latitude, 90.0)?;
        let longitude = parse_coordinate("longitude", &self.longitude, 180.0)?;

        Ok(NewRestaurant {
            name: name.to_string(),
            latitude,
            longitude,
            opening_time,
            closing_time,
            tags: self.tags.iter().collect::<LabelList>(),
            recommended_dishes: self.recommended_dishes.iter().collect::<LabelList>(),
        })
    }
}

/// Parse a time-of-day as produced by a time input (`HH:MM`, optionally
/// with seconds).
pub fn parse_time(field: &'static str, raw: &str) -> Result<NaiveTime, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::Missing { field });
    }
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| ValidationError::InvalidTime {
            field,
            value: raw.to_string(),
        })
}

fn parse_coordinate(field: &'static str, raw: &str, limit: f64) -> Result<f64, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::Missing { field });
    }
    let value: f64 = raw.parse().map_err(|_| ValidationError::NotANumber {
        field,
        value: raw.to_string(),
    })?;
    if !value.is_finite() || value.abs() > limit {
        return Err(ValidationError::OutOfRange {
            field,
            value: raw.to_string(),
        });
    }
    Ok(value)
}

fn number_or_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        Some(NumberOrText::Number(n)) => n.to_string(),
        Some(NumberOrText::Text(s)) => s,
        None => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form() -> RestaurantForm {
        RestaurantForm {
            name: "  Tian Tian  ".into(),
            opening_time: "10:00".into(),
            closing_time: "20:30".into(),
            latitude: "1.2806".into(),
            longitude: "103.8447".into(),
            tags: vec!["hawker".into(), "hawker".into(), " ".into()],
            recommended_dishes: vec!["chicken rice".into()],
            image_urls: vec![],
        }
    }

    #[test]
    fn test_valid_form() {
        let new = form().validate().unwrap();
        assert_eq!(new.name, "Tian Tian");
        assert_eq!(new.opening_time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(new.closing_time, NaiveTime::from_hms_opt(20, 30, 0).unwrap());
        assert_eq!(new.latitude, 1.2806);
        assert_eq!(new.tags.as_slice(), ["hawker"]);
    }

    #[test]
    fn test_missing_name() {
        let mut f = form();
        f.name = "   ".into();
        assert_eq!(f.validate(), Err(ValidationError::Missing { field: "name" }));
    }

    #[test]
    fn test_non_numeric_coordinate() {
        let mut f = form();
        f.longitude = "east".into();
        let err = f.validate().unwrap_err();
        assert_eq!(err.field(), "longitude");
        assert!(matches!(err, ValidationError::NotANumber { .. }));
    }

    #[test]
    fn test_out_of_range_latitude() {
        let mut f = form();
        f.latitude = "91".into();
        assert!(matches!(
            f.validate(),
            Err(ValidationError::OutOfRange { field: "latitude", .. })
        ));

        f.latitude = "NaN".into();
        assert!(matches!(
            f.validate(),
            Err(ValidationError::OutOfRange { field: "latitude", .. })
        ));
    }

    #[test]
    fn test_time_with_seconds_and_invalid_time() {
        assert!(parse_time("opening_time", "07:15:30").is_ok());
        assert_eq!(
            parse_time("closing_time", "25:00"),
            Err(ValidationError::InvalidTime {
                field: "closing_time",
                value: "25:00".into()
            })
        );
        assert_eq!(
            parse_time("closing_time", ""),
            Err(ValidationError::Missing { field: "closing_time" })
        );
    }

    #[test]
    fn test_deserialize_numbers_or_text() {
        let f: RestaurantForm = serde_json::from_value(json!({
            "name": "Lau Pa Sat",
            "opening_time": "00:00",
            "closing_time": "23:59",
            "latitude": 1.2807,
            "longitude": "103.8504",
        }))
        .unwrap();
        assert_eq!(f.latitude, "1.2807");
        assert!(f.tags.is_empty());
        assert!(f.validate().is_ok());
    }
}
