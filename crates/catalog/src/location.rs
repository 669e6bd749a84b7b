use chrono::{DateTime, Utc};
use foundation::math::{LatLng, is_valid_lat_lng};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// One visited place, as supplied by the album collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    /// WGS84 degrees. `null` in JSON becomes NaN and is filtered later.
    #[serde(deserialize_with = "lenient_f64")]
    pub latitude: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub longitude: f64,
    pub visit_date: DateTime<Utc>,
    #[serde(default)]
    pub album_count: u32,
    #[serde(default)]
    pub photo_count: u32,
}

impl Location {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        visit_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            latitude,
            longitude,
            visit_date,
            album_count: 0,
            photo_count: 0,
        }
    }

    pub fn with_counts(mut self, album_count: u32, photo_count: u32) -> Self {
        self.album_count = album_count;
        self.photo_count = photo_count;
        self
    }

    /// Albums plus photos.
    pub fn engagement(&self) -> u64 {
        u64::from(self.album_count) + u64::from(self.photo_count)
    }

    /// Centroid weight: engagement + 1, so empty places still pull.
    pub fn weight(&self) -> f64 {
        self.engagement() as f64 + 1.0
    }

    pub fn lat_lng(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    pub fn has_valid_coordinates(&self) -> bool {
        is_valid_lat_lng(self.latitude, self.longitude)
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Result of dropping records with unusable coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Sanitized {
    pub locations: Vec<Location>,
    pub dropped: usize,
}

/// Removes locations whose coordinates are NaN, infinite or out of range.
/// Input order is preserved.
pub fn sanitize_locations(locations: impl IntoIterator<Item = Location>) -> Sanitized {
    let mut dropped = 0usize;
    let locations: Vec<Location> = locations
        .into_iter()
        .filter(|loc| {
            let ok = loc.has_valid_coordinates();
            if !ok {
                dropped += 1;
                debug!(
                    id = %loc.id,
                    lat = loc.latitude,
                    lng = loc.longitude,
                    "dropping location with invalid coordinates"
                );
            }
            ok
        })
        .collect();

    Sanitized { locations, dropped }
}

/// Sorts ascending by visit date; ties fall back to `id` so the order is total.
pub fn sort_chronologically(locations: &mut [Location]) {
    locations.sort_by(|a, b| {
        a.visit_date
            .cmp(&b.visit_date)
            .then_with(|| a.id.cmp(&b.id))
    });
}

pub fn parse_locations_json(json: &str) -> Result<Vec<Location>, crate::CatalogError> {
    serde_json::from_str(json).map_err(|e| crate::CatalogError::Corrupt(e.to_string()))
}
