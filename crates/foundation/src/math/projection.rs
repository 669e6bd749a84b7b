use super::{Vec3, normalize_longitude};

/// Maps lat/lng/altitude onto a globe mesh of radius `base_radius`.
///
/// Axis convention: +Y is the north pole and longitude 0 faces +X after the
/// `lng + 180` rotation, matching a three.js style sphere UV layout. Altitude
/// is dimensionless: `1.0` adds one globe radius (times `altitude_scale`).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SphereProjection {
    pub base_radius: f64,
    pub altitude_scale: f64,
}

impl Default for SphereProjection {
    fn default() -> Self {
        Self {
            base_radius: 100.0,
            altitude_scale: 1.0,
        }
    }
}

impl SphereProjection {
    pub fn new(base_radius: f64, altitude_scale: f64) -> Self {
        Self {
            base_radius,
            altitude_scale,
        }
    }

    pub fn radius_at(&self, altitude: f64) -> f64 {
        self.base_radius * (1.0 + self.altitude_scale * altitude)
    }

    pub fn project(&self, lat_deg: f64, lng_deg: f64, altitude: f64) -> Vec3 {
        let phi = (90.0 - lat_deg).to_radians();
        let theta = (lng_deg + 180.0).to_radians();
        let r = self.radius_at(altitude);

        Vec3::new(
            -r * phi.sin() * theta.cos(),
            r * phi.cos(),
            r * phi.sin() * theta.sin(),
        )
    }

    /// Inverse of [`SphereProjection::project`]; returns `(lat, lng, altitude)`.
    pub fn unproject(&self, p: Vec3) -> (f64, f64, f64) {
        let r = p.length();
        if r <= 1e-12 || !r.is_finite() {
            return (0.0, 0.0, 0.0);
        }

        let phi = (p.y / r).clamp(-1.0, 1.0).acos();
        let theta = p.z.atan2(-p.x);
        let lat = 90.0 - phi.to_degrees();
        let lng = normalize_longitude(theta.to_degrees() - 180.0);

        let altitude = if self.base_radius > 0.0 && self.altitude_scale != 0.0 {
            (r / self.base_radius - 1.0) / self.altitude_scale
        } else {
            0.0
        };

        (lat, lng, altitude)
    }
}

#[cfg(test)]
mod tests {
    use super::SphereProjection;
    use crate::math::Vec3;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn north_pole_is_plus_y() {
        let p = SphereProjection::default().project(90.0, 0.0, 0.0);
        assert_close(p.x, 0.0, 1e-9);
        assert_close(p.y, 100.0, 1e-9);
        assert_close(p.z, 0.0, 1e-9);
    }

    #[test]
    fn prime_meridian_on_equator() {
        // theta = 180°, so x = -r * cos(180°) = r.
        let p = SphereProjection::default().project(0.0, 0.0, 0.0);
        assert_close(p.x, 100.0, 1e-9);
        assert_close(p.y, 0.0, 1e-9);
        assert_close(p.z, 0.0, 1e-9);

        let east = SphereProjection::default().project(0.0, 90.0, 0.0);
        assert_close(east.x, 0.0, 1e-9);
        assert_close(east.z, -100.0, 1e-9);
    }

    #[test]
    fn altitude_scales_radius() {
        let proj = SphereProjection::new(100.0, 0.5);
        let p = proj.project(12.0, -40.0, 0.4);
        assert_close(p.length(), 120.0, 1e-9);
    }

    #[test]
    fn unproject_inverts_project() {
        let proj = SphereProjection::default();
        for &(lat, lng, alt) in &[(48.85, 2.35, 0.0), (-33.9, 151.2, 0.3), (0.0, -179.5, 1.2)] {
            let (lat2, lng2, alt2) = proj.unproject(proj.project(lat, lng, alt));
            assert_close(lat2, lat, 1e-9);
            assert_close(lng2, lng, 1e-9);
            assert_close(alt2, alt, 1e-9);
        }
    }

    #[test]
    fn unproject_origin_is_not_nan() {
        let (lat, lng, alt) = SphereProjection::default().unproject(Vec3::ZERO);
        assert_eq!((lat, lng, alt), (0.0, 0.0, 0.0));
    }
}
