use camera::Easing;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SEGMENT_DURATION_MS: f64 = 4000.0;
pub const MIN_SPEED: f64 = 0.25;
pub const MAX_SPEED: f64 = 5.0;

/// Speed multiplier presets offered to the user.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackSpeed {
    Quarter,
    Half,
    #[default]
    Normal,
    Double,
    Fivefold,
}

impl PlaybackSpeed {
    pub fn label(&self) -> &'static str {
        match self {
            PlaybackSpeed::Quarter => "0.25x",
            PlaybackSpeed::Half => "0.5x",
            PlaybackSpeed::Normal => "1x",
            PlaybackSpeed::Double => "2x",
            PlaybackSpeed::Fivefold => "5x",
        }
    }

    pub fn all() -> &'static [PlaybackSpeed] {
        &[
            PlaybackSpeed::Quarter,
            PlaybackSpeed::Half,
            PlaybackSpeed::Normal,
            PlaybackSpeed::Double,
            PlaybackSpeed::Fivefold,
        ]
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            PlaybackSpeed::Quarter => 0.25,
            PlaybackSpeed::Half => 0.5,
            PlaybackSpeed::Normal => 1.0,
            PlaybackSpeed::Double => 2.0,
            PlaybackSpeed::Fivefold => 5.0,
        }
    }

    /// Preset whose multiplier is closest to `multiplier`.
    pub fn nearest(multiplier: f64) -> PlaybackSpeed {
        let mut best = PlaybackSpeed::Normal;
        let mut best_diff = f64::INFINITY;
        for preset in Self::all() {
            let diff = (preset.multiplier() - multiplier).abs();
            if diff < best_diff {
                best = *preset;
                best_diff = diff;
            }
        }
        best
    }
}

/// How long one segment takes at 1x speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SegmentTiming {
    /// Every hop takes the same time regardless of distance.
    Fixed { duration_ms: f64 },
    /// Duration proportional to great-circle distance, clamped.
    ByDistance {
        ms_per_1000_km: f64,
        min_ms: f64,
        max_ms: f64,
    },
}

impl Default for SegmentTiming {
    fn default() -> Self {
        SegmentTiming::Fixed {
            duration_ms: DEFAULT_SEGMENT_DURATION_MS,
        }
    }
}

impl SegmentTiming {
    /// Segment duration at 1x. Always finite and positive.
    pub fn duration_ms(&self, distance_km: f64) -> f64 {
        match *self {
            SegmentTiming::Fixed { duration_ms } => {
                positive_or(duration_ms, DEFAULT_SEGMENT_DURATION_MS)
            }
            SegmentTiming::ByDistance {
                ms_per_1000_km,
                min_ms,
                max_ms,
            } => {
                let lo = positive_or(min_ms, 1.0);
                let hi = positive_or(max_ms, lo).max(lo);
                let rate = positive_or(ms_per_1000_km, DEFAULT_SEGMENT_DURATION_MS);
                let distance_km = if distance_km.is_finite() {
                    distance_km.max(0.0)
                } else {
                    0.0
                };
                (distance_km / 1000.0 * rate).clamp(lo, hi)
            }
        }
    }
}

/// How the plane travels between two stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightPath {
    /// Straight interpolation in lat/lng, short way round in longitude.
    #[default]
    Linear,
    /// Shortest path on the sphere.
    GreatCircle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    pub speed: f64,
    pub camera_follows_plane: bool,
    pub segment_timing: SegmentTiming,
    pub path: FlightPath,
    /// Plane altitude at both ends of a hop, in globe radii.
    pub cruise_altitude: f64,
    /// Extra lift at mid-hop: `arc_height * sin(pi * progress)`.
    pub arc_height: f64,
    pub follow_altitude: f64,
    pub follow_duration_ms: f64,
    pub follow_easing: Easing,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            camera_follows_plane: false,
            segment_timing: SegmentTiming::default(),
            path: FlightPath::default(),
            cruise_altitude: 0.05,
            arc_height: 0.0,
            follow_altitude: 1.2,
            follow_duration_ms: 500.0,
            // Retargeted every frame, so an in-out curve would barely move.
            follow_easing: Easing::Linear,
        }
    }
}

/// Clamps a requested multiplier into the preset range. `None` for
/// non-finite or non-positive input.
pub fn clamp_speed(multiplier: f64) -> Option<f64> {
    if multiplier.is_finite() && multiplier > 0.0 {
        Some(multiplier.clamp(MIN_SPEED, MAX_SPEED))
    } else {
        None
    }
}

fn positive_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::{FlightConfig, FlightPath, PlaybackSpeed, SegmentTiming, clamp_speed};

    #[test]
    fn presets_cover_quarter_to_five() {
        let speeds: Vec<f64> = PlaybackSpeed::all().iter().map(|s| s.multiplier()).collect();
        assert_eq!(speeds, vec![0.25, 0.5, 1.0, 2.0, 5.0]);
        assert_eq!(PlaybackSpeed::Fivefold.label(), "5x");
        assert_eq!(PlaybackSpeed::nearest(1.8), PlaybackSpeed::Double);
        assert_eq!(PlaybackSpeed::nearest(0.1), PlaybackSpeed::Quarter);
    }

    #[test]
    fn speed_is_clamped_or_rejected() {
        assert_eq!(clamp_speed(2.0), Some(2.0));
        assert_eq!(clamp_speed(40.0), Some(5.0));
        assert_eq!(clamp_speed(0.01), Some(0.25));
        assert_eq!(clamp_speed(0.0), None);
        assert_eq!(clamp_speed(-1.0), None);
        assert_eq!(clamp_speed(f64::NAN), None);
    }

    #[test]
    fn fixed_timing_ignores_distance() {
        let timing = SegmentTiming::default();
        assert_eq!(timing.duration_ms(10.0), 4000.0);
        assert_eq!(timing.duration_ms(10_000.0), 4000.0);
        let broken = SegmentTiming::Fixed { duration_ms: -3.0 };
        assert_eq!(broken.duration_ms(1.0), 4000.0);
    }

    #[test]
    fn distance_timing_is_clamped() {
        let timing = SegmentTiming::ByDistance {
            ms_per_1000_km: 1000.0,
            min_ms: 1500.0,
            max_ms: 8000.0,
        };
        assert_eq!(timing.duration_ms(0.0), 1500.0);
        assert_eq!(timing.duration_ms(3000.0), 3000.0);
        assert_eq!(timing.duration_ms(20_000.0), 8000.0);
        assert_eq!(timing.duration_ms(f64::NAN), 1500.0);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: FlightConfig = serde_json::from_str(
            r#"{
                "path": "great_circle",
                "segment_timing": {"mode": "by_distance", "ms_per_1000_km": 800, "min_ms": 1000, "max_ms": 6000}
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.path, FlightPath::GreatCircle);
        assert_eq!(cfg.speed, 1.0);
        assert!(matches!(cfg.segment_timing, SegmentTiming::ByDistance { .. }));
    }
}
