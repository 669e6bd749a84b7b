//! Spherical geodesy in degrees.
//!
//! Everything here treats the Earth as a sphere of radius [`EARTH_RADIUS_KM`];
//! that is plenty for clustering pins and animating a globe camera.

use super::Vec3;

/// Mean Earth radius (kilometers).
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLng {
    pub lat_deg: f64,
    pub lng_deg: f64,
}

impl LatLng {
    pub fn new(lat_deg: f64, lng_deg: f64) -> Self {
        Self { lat_deg, lng_deg }
    }

    pub fn is_valid(self) -> bool {
        is_valid_lat_lng(self.lat_deg, self.lng_deg)
    }

    /// Unit vector on the sphere (z through the north pole).
    pub fn to_unit(self) -> Vec3 {
        let lat = self.lat_deg.to_radians();
        let lng = self.lng_deg.to_radians();
        let cos_lat = lat.cos();
        Vec3::new(cos_lat * lng.cos(), cos_lat * lng.sin(), lat.sin())
    }

    pub fn from_unit(u: Vec3) -> Self {
        let lat = u.z.clamp(-1.0, 1.0).asin().to_degrees();
        let lng = u.y.atan2(u.x).to_degrees();
        Self::new(lat, normalize_longitude(lng))
    }
}

/// True when both components are finite and inside WGS84 degree ranges.
pub fn is_valid_lat_lng(lat_deg: f64, lng_deg: f64) -> bool {
    lat_deg.is_finite()
        && lng_deg.is_finite()
        && (-90.0..=90.0).contains(&lat_deg)
        && (-180.0..=180.0).contains(&lng_deg)
}

/// Wraps a longitude into `[-180, 180)`.
pub fn normalize_longitude(lng_deg: f64) -> f64 {
    if !lng_deg.is_finite() {
        return lng_deg;
    }
    (lng_deg + 180.0).rem_euclid(360.0) - 180.0
}

/// Signed longitude difference `b - a` folded once into `[-180, 180]`.
pub fn longitude_delta(a_deg: f64, b_deg: f64) -> f64 {
    let mut diff = b_deg - a_deg;
    if diff > 180.0 {
        diff -= 360.0;
    } else if diff < -180.0 {
        diff += 360.0;
    }
    diff
}

/// Interpolates longitude along the shorter arc, crossing the ±180° seam when
/// that is the short way round. The result is not normalized.
pub fn interpolate_longitude(a_deg: f64, b_deg: f64, t: f64) -> f64 {
    a_deg + longitude_delta(a_deg, b_deg) * t
}

#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Great-circle distance in kilometers (haversine formula).
pub fn haversine_distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    // Rounding can push `a` a hair above 1 for antipodal points.
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Initial bearing from point 1 to point 2 in degrees, `[0, 360)`.
pub fn initial_bearing_deg(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let x = delta_lng.sin() * lat2_rad.cos();
    let y = lat1_rad.cos() * lat2_rad.sin() - lat1_rad.sin() * lat2_rad.cos() * delta_lng.cos();

    x.atan2(y).to_degrees().rem_euclid(360.0)
}

/// Spherical interpolation between two points along their great circle.
pub fn slerp_lat_lng(a: LatLng, b: LatLng, t: f64) -> LatLng {
    let ua = a.to_unit();
    let ub = b.to_unit();
    let dot = ua.dot(ub).clamp(-1.0, 1.0);
    let omega = dot.acos();
    let sin_omega = omega.sin();

    let u = if sin_omega.abs() < 1e-6 {
        // Coincident (or antipodal) endpoints: fall back to a normalized chord.
        let chord = ua + (ub - ua).scale(t);
        match chord.normalized() {
            Some(u) => u,
            None => return LatLng::new(lerp(a.lat_deg, b.lat_deg, t), a.lng_deg),
        }
    } else {
        let a_scale = ((1.0 - t) * omega).sin() / sin_omega;
        let b_scale = (t * omega).sin() / sin_omega;
        ua.scale(a_scale) + ub.scale(b_scale)
    };

    LatLng::from_unit(u)
}
