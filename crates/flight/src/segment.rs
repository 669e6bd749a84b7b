use catalog::Location;
use foundation::math::{
    LatLng, haversine_distance_km, initial_bearing_deg, interpolate_longitude, lerp,
    normalize_longitude, slerp_lat_lng,
};
use serde::Serialize;

use crate::config::FlightPath;

/// One hop between consecutive stops of a chronologically sorted journey.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSegment {
    pub origin: Location,
    pub destination: Location,
    pub distance_km: f64,
    pub bearing_deg: f64,
}

impl FlightSegment {
    pub fn new(origin: Location, destination: Location) -> Self {
        let distance_km = haversine_distance_km(
            origin.latitude,
            origin.longitude,
            destination.latitude,
            destination.longitude,
        );
        let bearing_deg = initial_bearing_deg(
            origin.latitude,
            origin.longitude,
            destination.latitude,
            destination.longitude,
        );
        Self {
            origin,
            destination,
            distance_km,
            bearing_deg,
        }
    }

    /// Ground point at `progress` in `[0, 1]` along the hop.
    pub fn ground_point(&self, progress: f64, path: FlightPath) -> LatLng {
        let t = progress.clamp(0.0, 1.0);
        match path {
            FlightPath::Linear => LatLng::new(
                lerp(self.origin.latitude, self.destination.latitude, t),
                normalize_longitude(interpolate_longitude(
                    self.origin.longitude,
                    self.destination.longitude,
                    t,
                )),
            ),
            FlightPath::GreatCircle => {
                let p = slerp_lat_lng(self.origin.lat_lng(), self.destination.lat_lng(), t);
                LatLng::new(p.lat_deg, normalize_longitude(p.lng_deg))
            }
        }
    }
}

/// Pairs up consecutive locations. The input must already be sorted.
pub fn build_segments(locations: &[Location]) -> Vec<FlightSegment> {
    locations
        .windows(2)
        .map(|pair| FlightSegment::new(pair[0].clone(), pair[1].clone()))
        .collect()
}

/// Where the plane is drawn this frame.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanePosition {
    pub lat: f64,
    pub lng: f64,
    pub altitude: f64,
    pub heading_deg: f64,
    pub segment_index: usize,
    pub progress: f64,
}

impl PlanePosition {
    pub fn on_segment(
        segment: &FlightSegment,
        segment_index: usize,
        progress: f64,
        path: FlightPath,
        cruise_altitude: f64,
        arc_height: f64,
    ) -> Self {
        let progress = progress.clamp(0.0, 1.0);
        let point = segment.ground_point(progress, path);

        // Heading toward the destination; once on top of it keep the hop bearing.
        let remaining_km = haversine_distance_km(
            point.lat_deg,
            point.lng_deg,
            segment.destination.latitude,
            segment.destination.longitude,
        );
        let heading_deg = if remaining_km > 1e-3 {
            initial_bearing_deg(
                point.lat_deg,
                point.lng_deg,
                segment.destination.latitude,
                segment.destination.longitude,
            )
        } else {
            segment.bearing_deg
        };

        let arc = if arc_height.is_finite() {
            arc_height.max(0.0) * (std::f64::consts::PI * progress).sin()
        } else {
            0.0
        };
        let cruise = if cruise_altitude.is_finite() {
            cruise_altitude.max(0.0)
        } else {
            0.0
        };

        Self {
            lat: point.lat_deg,
            lng: point.lng_deg,
            altitude: cruise + arc,
            heading_deg,
            segment_index,
            progress,
        }
    }
}
