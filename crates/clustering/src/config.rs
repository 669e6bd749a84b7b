use serde::{Deserialize, Serialize};

pub const DEFAULT_CLUSTER_RADIUS_KM: f64 = 200.0;
pub const DEFAULT_MIN_PIN_RADIUS: f64 = 0.8;
pub const DEFAULT_MAX_PIN_RADIUS: f64 = 3.0;
/// `sqrt(400) * 0.15 == 3.0`: pins saturate around 400 albums+photos.
pub const DEFAULT_PIN_SIZE_SCALE: f64 = 0.15;

/// Order in which the greedy pass visits locations.
///
/// Greedy clustering is order dependent; `Canonical` makes the result a
/// function of the location *set* rather than of the caller's ordering.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterOrder {
    /// Visit in the order given.
    Input,
    /// Visit by engagement descending, then id, then coordinates.
    #[default]
    Canonical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub radius_km: f64,
    pub min_pin_radius: f64,
    pub max_pin_radius: f64,
    pub size_scale: f64,
    pub order: ClusterOrder,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            radius_km: DEFAULT_CLUSTER_RADIUS_KM,
            min_pin_radius: DEFAULT_MIN_PIN_RADIUS,
            max_pin_radius: DEFAULT_MAX_PIN_RADIUS,
            size_scale: DEFAULT_PIN_SIZE_SCALE,
            order: ClusterOrder::default(),
        }
    }
}

impl ClusterConfig {
    pub fn with_radius_km(radius_km: f64) -> Self {
        Self {
            radius_km,
            ..Self::default()
        }
    }

    /// Absorption radius; NaN and negatives collapse to 0.
    pub fn effective_radius_km(&self) -> f64 {
        if self.radius_km.is_finite() && self.radius_km > 0.0 {
            self.radius_km
        } else if self.radius_km == f64::INFINITY {
            f64::INFINITY
        } else {
            0.0
        }
    }

    /// Pin radius for a cluster holding `total` albums+photos.
    ///
    /// Monotonic in `total` and clamped to `[min_pin_radius, max_pin_radius]`
    /// (bounds are swapped if given in the wrong order, defaults replace NaN).
    pub fn pin_radius(&self, total: u64) -> f64 {
        let lo = finite_or(self.min_pin_radius, DEFAULT_MIN_PIN_RADIUS);
        let hi = finite_or(self.max_pin_radius, DEFAULT_MAX_PIN_RADIUS);
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let scale = finite_or(self.size_scale, DEFAULT_PIN_SIZE_SCALE).max(0.0);

        ((total as f64).sqrt() * scale).clamp(lo, hi)
    }
}

fn finite_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() { v } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::ClusterConfig;

    #[test]
    fn pin_radius_is_clamped_and_monotonic() {
        let cfg = ClusterConfig::default();
        assert_eq!(cfg.pin_radius(0), 0.8);
        assert!((cfg.pin_radius(100) - 1.5).abs() < 1e-12);
        assert_eq!(cfg.pin_radius(1_000_000), 3.0);

        let mut last = 0.0;
        for total in [0, 1, 10, 50, 100, 200, 400, 1000] {
            let r = cfg.pin_radius(total);
            assert!(r >= last);
            last = r;
        }
    }

    #[test]
    fn pin_radius_tolerates_bad_bounds() {
        let cfg = ClusterConfig {
            min_pin_radius: 3.0,
            max_pin_radius: 0.8,
            size_scale: f64::NAN,
            ..ClusterConfig::default()
        };
        assert_eq!(cfg.pin_radius(0), 0.8);
        assert_eq!(cfg.pin_radius(10_000), 3.0);
    }

    #[test]
    fn radius_degenerates_to_zero() {
        assert_eq!(ClusterConfig::with_radius_km(f64::NAN).effective_radius_km(), 0.0);
        assert_eq!(ClusterConfig::with_radius_km(-5.0).effective_radius_km(), 0.0);
        assert_eq!(ClusterConfig::with_radius_km(50.0).effective_radius_km(), 50.0);
    }

    #[test]
    fn deserializes_partial_config() {
        let cfg: ClusterConfig = serde_json::from_str(r#"{"radius_km": 75, "order": "input"}"#)
            .unwrap();
        assert_eq!(cfg.radius_km, 75.0);
        assert_eq!(cfg.order, super::ClusterOrder::Input);
        assert_eq!(cfg.max_pin_radius, 3.0);
    }
}
