use foundation::math::{interpolate_longitude, lerp, normalize_longitude};
use serde::{Deserialize, Serialize};

/// Globe camera point of view: where it looks and how high it hovers.
///
/// `lat`/`lng` are degrees, `altitude` is in globe radii above the surface.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraPov {
    pub lat: f64,
    pub lng: f64,
    pub altitude: f64,
}

impl Default for CameraPov {
    fn default() -> Self {
        Self {
            lat: 0.0,
            lng: 0.0,
            altitude: 2.5,
        }
    }
}

impl CameraPov {
    pub fn new(lat: f64, lng: f64, altitude: f64) -> Self {
        Self { lat, lng, altitude }
    }

    /// Interpolates toward `target` at eased progress `t`, taking the short
    /// way across the antimeridian.
    pub fn interpolate(self, target: CameraPov, t: f64) -> CameraPov {
        CameraPov {
            lat: lerp(self.lat, target.lat, t),
            lng: normalize_longitude(interpolate_longitude(self.lng, target.lng, t)),
            altitude: lerp(self.altitude, target.altitude, t),
        }
    }

    /// Normalizes a requested target against the current POV.
    ///
    /// Non-finite components keep the current value, latitude is clamped to
    /// the poles, longitude is wrapped and altitude may not go below ground.
    pub fn sanitized_against(self, current: CameraPov) -> CameraPov {
        let pick = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };
        CameraPov {
            lat: pick(self.lat, current.lat).clamp(-90.0, 90.0),
            lng: normalize_longitude(pick(self.lng, current.lng)),
            altitude: pick(self.altitude, current.altitude).max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CameraPov;

    #[test]
    fn interpolation_takes_short_way_round() {
        let a = CameraPov::new(0.0, 179.0, 1.0);
        let b = CameraPov::new(10.0, -179.0, 3.0);
        let mid = a.interpolate(b, 0.5);
        assert!((mid.lat - 5.0).abs() < 1e-12);
        assert!((mid.lng.abs() - 180.0).abs() < 1e-9);
        assert!((mid.altitude - 2.0).abs() < 1e-12);
    }

    #[test]
    fn sanitizing_keeps_current_for_nan() {
        let current = CameraPov::new(10.0, 20.0, 1.5);
        let target = CameraPov::new(f64::NAN, 200.0, -4.0).sanitized_against(current);
        assert_eq!(target.lat, 10.0);
        assert!((target.lng - -160.0).abs() < 1e-12);
        assert_eq!(target.altitude, 0.0);

        let clamped = CameraPov::new(120.0, 0.0, f64::INFINITY).sanitized_against(current);
        assert_eq!(clamped.lat, 90.0);
        assert_eq!(clamped.altitude, 1.5);
    }
}
