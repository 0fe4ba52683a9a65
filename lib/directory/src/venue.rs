//! The venue value type.

use serde::{Deserialize, Serialize};

/// Prefix carried by the raw track id of every venue search item.
const TRACK_ID_PREFIX: &str = "venue-";

/// A delivery venue as returned by directory search.
///
/// Values are read-only once retrieved; the status-check endpoint is keyed
/// by the slug embedded in [`track_id`](Self::track_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    /// Display title.
    pub title: String,
    /// Short description shown in selection prompts.
    pub description: String,
    /// Rating score, absent for venues that have not been rated yet.
    pub rating: Option<f32>,
    /// Raw identifier from the directory, e.g. `venue-burger-joint`.
    pub track_id: String,
}

impl Venue {
    /// Returns the opaque slug identifying this venue to the status API.
    ///
    /// The directory prefixes every venue track id with `venue-`; a raw id
    /// without that prefix has no slug and cannot be status-checked.
    #[must_use]
    pub fn slug(&self) -> Option<&str> {
        self.track_id.strip_prefix(TRACK_ID_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venue(track_id: &str) -> Venue {
        Venue {
            title: "Burger Joint".to_string(),
            description: "Burgers and fries".to_string(),
            rating: Some(8.8),
            track_id: track_id.to_string(),
        }
    }

    #[test]
    fn slug_strips_venue_prefix() {
        let v = venue("venue-burger-joint");
        assert_eq!(v.slug(), Some("burger-joint"));
    }

    #[test]
    fn slug_absent_for_foreign_track_id() {
        let v = venue("category-burgers");
        assert_eq!(v.slug(), None);
    }

    #[test]
    fn venue_serde_roundtrip() {
        let v = venue("venue-burger-joint");
        let json = serde_json::to_string(&v).expect("serialize");
        let parsed: Venue = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(v, parsed);
    }

    #[test]
    fn venue_without_rating_deserializes() {
        let json = r#"{"title":"A","description":"B","rating":null,"track_id":"venue-a"}"#;
        let parsed: Venue = serde_json::from_str(json).expect("deserialize");
        assert_eq!(parsed.rating, None);
    }
}
