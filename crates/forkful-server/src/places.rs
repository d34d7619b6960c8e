//! Places search client used to prefill the add-restaurant form.
//!
//! Speaks the Google Places web-service JSON format: autocomplete for
//! ranked predictions, details for name, coordinate and opening hours.
//! Failures are reported once and never retried; the user can always fall
//! back to typing the fields by hand.

use chrono::{Datelike, Utc};
use forkful_shared::constants::PLACES_CATEGORY;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ServerError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacePrediction {
    pub place_id: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceDetails {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// `HH:MM`, from today's first opening period when listed.
    pub opening_time: Option<String>,
    pub closing_time: Option<String>,
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    status: String,
    #[serde(default)]
    predictions: Vec<WirePrediction>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WirePrediction {
    place_id: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<WireDetails>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireDetails {
    name: String,
    geometry: WireGeometry,
    opening_hours: Option<WireOpeningHours>,
}

#[derive(Debug, Deserialize)]
struct WireGeometry {
    location: WireLocation,
}

#[derive(Debug, Deserialize)]
struct WireLocation {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct WireOpeningHours {
    #[serde(default)]
    periods: Vec<WirePeriod>,
}

#[derive(Debug, Deserialize)]
struct WirePeriod {
    open: WireTimePoint,
    close: Option<WireTimePoint>,
}

#[derive(Debug, Deserialize)]
struct WireTimePoint {
    /// 0 = Sunday.
    day: u32,
    /// `HHMM`.
    time: String,
}

fn check_status(status: &str, message: Option<String>) -> Result<(), ServerError> {
    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        other => Err(ServerError::Upstream(format!(
            "places API status {other}: {}",
            message.unwrap_or_default()
        ))),
    }
}

/// `"0930"` → `"09:30"`.
fn clock(hhmm: &str) -> Option<String> {
    if hhmm.len() != 4 || !hhmm.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{}:{}", &hhmm[..2], &hhmm[2..]))
}

fn predictions_from(resp: AutocompleteResponse) -> Result<Vec<PlacePrediction>, ServerError> {
    check_status(&resp.status, resp.error_message)?;
    Ok(resp
        .predictions
        .into_iter()
        .map(|p| PlacePrediction {
            place_id: p.place_id,
            description: p.description,
        })
        .collect())
}

fn details_from(resp: DetailsResponse, weekday: u32) -> Result<PlaceDetails, ServerError> {
    check_status(&resp.status, resp.error_message)?;
    let result = resp
        .result
        .ok_or_else(|| ServerError::NotFound("Place".into()))?;

    let periods = result.opening_hours.map(|h| h.periods).unwrap_or_default();
    let period = periods
        .iter()
        .find(|p| p.open.day == weekday)
        .or_else(|| periods.first());

    Ok(PlaceDetails {
        name: result.name,
        latitude: result.geometry.location.lat,
        longitude: result.geometry.location.lng,
        opening_time: period.and_then(|p| clock(&p.open.time)),
        closing_time: period
            .and_then(|p| p.close.as_ref())
            .and_then(|c| clock(&c.time)),
    })
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct PlacesClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    country: String,
}

impl PlacesClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            country: country.into(),
        }
    }

    /// Ranked predictions for free text, restricted to restaurants in the
    /// configured country.
    pub async fn search(&self, query: &str) -> Result<Vec<PlacePrediction>, ServerError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let components = format!("country:{}", self.country);
        let resp: AutocompleteResponse = self
            .http
            .get(format!("{}/autocomplete/json", self.base_url))
            .query(&[
                ("input", query),
                ("types", PLACES_CATEGORY),
                ("components", components.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(upstream)?
            .json()
            .await
            .map_err(upstream)?;

        let predictions = predictions_from(resp)?;
        debug!(query, results = predictions.len(), "Places autocomplete");
        Ok(predictions)
    }

    pub async fn details(&self, place_id: &str) -> Result<PlaceDetails, ServerError> {
        let resp: DetailsResponse = self
            .http
            .get(format!("{}/details/json", self.base_url))
            .query(&[
                ("place_id", place_id),
                ("fields", "name,geometry,opening_hours"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(upstream)?
            .json()
            .await
            .map_err(upstream)?;

        details_from(resp, Utc::now().weekday().num_days_from_sunday())
    }
}

fn upstream(e: reqwest::Error) -> ServerError {
    warn!(error = %e, "Places request failed");
    ServerError::Upstream(format!("places API: {e}"))
}
