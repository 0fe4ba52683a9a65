//! Wolt consumer API implementation of the venue directory.
//!
//! Search goes through the restaurant search endpoint; availability checks
//! hit the per-venue dynamic endpoint keyed by the venue slug. Both calls
//! are scoped to a fixed delivery location.

use crate::client::VenueDirectory;
use crate::error::DirectoryError;
use crate::venue::Venue;
use async_trait::async_trait;
use serde::Deserialize;

const SEARCH_URL: &str = "https://restaurant-api.wolt.com/v1/pages/search";
const STATUS_URL_PREFIX: &str = "https://consumer-api.wolt.com/order-xp/web/v1/venue/slug";

/// The API rejects requests without a browser-looking user agent.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) ";

/// Delivery coordinates the directory is queried for.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Location {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
}

/// Venue directory over the Wolt consumer HTTP API.
pub struct WoltDirectory {
    client: reqwest::Client,
    location: Location,
}

impl WoltDirectory {
    /// Creates a directory client for the given delivery location.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(location: Location) -> Result<Self, DirectoryError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client, location })
    }
}

#[async_trait]
impl VenueDirectory for WoltDirectory {
    async fn search(&self, query: &str) -> Result<Vec<Venue>, DirectoryError> {
        let body = serde_json::json!({
            "q": query,
            "lat": self.location.lat,
            "lon": self.location.lon,
            "target": null,
        });

        let response = self.client.post(SEARCH_URL).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(DirectoryError::UnexpectedStatus {
                status: response.status().as_u16(),
            });
        }

        let decoded: SearchResponse =
            response
                .json()
                .await
                .map_err(|e| DirectoryError::MalformedResponse {
                    reason: e.to_string(),
                })?;

        Ok(collect_venues(decoded))
    }

    async fn check_status(&self, venue: &Venue) -> Result<bool, DirectoryError> {
        let slug = venue
            .slug()
            .ok_or_else(|| DirectoryError::InvalidTrackId {
                track_id: venue.track_id.clone(),
            })?;

        let url = format!("{STATUS_URL_PREFIX}/{slug}/dynamic");
        let response = self
            .client
            .get(url)
            .query(&[("lat", self.location.lat), ("lon", self.location.lon)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(DirectoryError::UnexpectedStatus {
                status: response.status().as_u16(),
            });
        }

        let decoded: VenueStatusResponse =
            response
                .json()
                .await
                .map_err(|e| DirectoryError::MalformedResponse {
                    reason: e.to_string(),
                })?;

        Ok(is_available(&decoded))
    }
}

/// Wire shape of the search endpoint response.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    sections: Vec<SearchSection>,
}

#[derive(Debug, Deserialize)]
struct SearchSection {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    title: String,
    track_id: String,
    #[serde(default)]
    venue: Option<SearchItemVenue>,
}

#[derive(Debug, Deserialize)]
struct SearchItemVenue {
    #[serde(default)]
    rating: Option<RatingInfo>,
    #[serde(default)]
    short_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RatingInfo {
    score: f32,
}

/// Wire shape of the per-venue dynamic endpoint response.
#[derive(Debug, Deserialize)]
struct VenueStatusResponse {
    venue: VenueStatus,
    venue_raw: VenueRaw,
}

#[derive(Debug, Deserialize)]
struct VenueStatus {
    online: bool,
    delivery_open_status: DeliveryOpenStatus,
}

#[derive(Debug, Deserialize)]
struct DeliveryOpenStatus {
    is_open: bool,
}

#[derive(Debug, Deserialize)]
struct VenueRaw {
    delivery_specs: DeliverySpecs,
}

#[derive(Debug, Deserialize)]
struct DeliverySpecs {
    delivery_enabled: bool,
}

/// Flattens the first search section into venue values.
///
/// The search endpoint returns category sections as well; only the first
/// section carries the venue results for the query.
fn collect_venues(response: SearchResponse) -> Vec<Venue> {
    let Some(section) = response.sections.into_iter().next() else {
        return Vec::new();
    };

    section
        .items
        .into_iter()
        .map(|item| {
            let (rating, description) = match item.venue {
                Some(v) => (
                    v.rating.map(|r| r.score),
                    v.short_description.unwrap_or_default(),
                ),
                None => (None, String::new()),
            };
            Venue {
                title: item.title,
                description,
                rating,
                track_id: item.track_id,
            }
        })
        .collect()
}

/// A venue counts as available only when it is online, open for delivery,
/// and has delivery enabled at all.
fn is_available(response: &VenueStatusResponse) -> bool {
    response.venue.online
        && response.venue.delivery_open_status.is_open
        && response.venue_raw.delivery_specs.delivery_enabled
}
