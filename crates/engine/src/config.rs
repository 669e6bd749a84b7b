use std::env;
use std::path::Path;

use camera::Easing;
use clustering::{ClusterConfig, ClusterOrder};
use flight::FlightConfig;
use foundation::math::SphereProjection;
use runtime::DEFAULT_MAX_FRAME_DT_MS;
use serde::{Deserialize, Serialize};

/// Prefix for environment overrides, e.g. `ATLAS_CLUSTER_RADIUS_KM`.
pub const ENV_PREFIX: &str = "ATLAS_";

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "config io error: {msg}"),
            ConfigError::Parse(msg) => write!(f, "config parse error: {msg}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub easing: Easing,
    pub transition_ms: f64,
    /// Altitude used when zooming onto a single pin.
    pub focus_altitude: f64,
    pub overview_altitude: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            easing: Easing::EaseInOutCubic,
            transition_ms: 1000.0,
            focus_altitude: 1.5,
            overview_altitude: 2.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub base_radius: f64,
    pub altitude_scale: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        let sphere = SphereProjection::default();
        Self {
            base_radius: sphere.base_radius,
            altitude_scale: sphere.altitude_scale,
        }
    }
}

impl ProjectionConfig {
    pub fn sphere(&self) -> SphereProjection {
        SphereProjection::new(self.base_radius, self.altitude_scale)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub cluster: ClusterConfig,
    pub camera: CameraConfig,
    pub flight: FlightConfig,
    pub projection: ProjectionConfig,
    pub max_frame_dt_ms: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cluster: ClusterConfig::default(),
            camera: CameraConfig::default(),
            flight: FlightConfig::default(),
            projection: ProjectionConfig::default(),
            max_frame_dt_ms: DEFAULT_MAX_FRAME_DT_MS,
        }
    }
}

impl EngineConfig {
    /// Parses a (possibly partial) JSON config; missing keys take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("read {path:?}: {e}")))?;
        Self::from_json_str(&json)
    }

    /// Defaults, then the optional file, then `ATLAS_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Applies overrides from `lookup` (keys carry the `ATLAS_` prefix).
    /// Unparseable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let f = |key: &str, current: f64| var_f64(&lookup, key, current);
        let b = |key: &str, current: bool| var_bool(&lookup, key, current);

        self.cluster.radius_km = f("CLUSTER_RADIUS_KM", self.cluster.radius_km);
        self.cluster.min_pin_radius = f("CLUSTER_MIN_PIN_RADIUS", self.cluster.min_pin_radius);
        self.cluster.max_pin_radius = f("CLUSTER_MAX_PIN_RADIUS", self.cluster.max_pin_radius);
        self.cluster.size_scale = f("CLUSTER_SIZE_SCALE", self.cluster.size_scale);
        if let Some(order) = var_string(&lookup, "CLUSTER_ORDER") {
            match order.as_str() {
                "input" => self.cluster.order = ClusterOrder::Input,
                "canonical" => self.cluster.order = ClusterOrder::Canonical,
                _ => {}
            }
        }

        if let Some(easing) = var_string(&lookup, "CAMERA_EASING").and_then(|s| s.parse().ok()) {
            self.camera.easing = easing;
        }
        self.camera.transition_ms = f("CAMERA_TRANSITION_MS", self.camera.transition_ms);
        self.camera.focus_altitude = f("CAMERA_FOCUS_ALTITUDE", self.camera.focus_altitude);

        self.flight.speed = f("FLIGHT_SPEED", self.flight.speed);
        self.flight.camera_follows_plane =
            b("FLIGHT_CAMERA_FOLLOWS_PLANE", self.flight.camera_follows_plane);
        self.flight.follow_altitude = f("FLIGHT_FOLLOW_ALTITUDE", self.flight.follow_altitude);
        self.flight.follow_duration_ms =
            f("FLIGHT_FOLLOW_DURATION_MS", self.flight.follow_duration_ms);
        self.flight.arc_height = f("FLIGHT_ARC_HEIGHT", self.flight.arc_height);

        self.max_frame_dt_ms = f("MAX_FRAME_DT_MS", self.max_frame_dt_ms);
        self.projection.base_radius = f("PROJECTION_BASE_RADIUS", self.projection.base_radius);
        self.projection.altitude_scale =
            f("PROJECTION_ALTITUDE_SCALE", self.projection.altitude_scale);
    }

    /// Rejects values no component can recover from. Out-of-range values that
    /// a component clamps on its own are accepted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.projection.base_radius.is_finite() && self.projection.base_radius > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "projection.base_radius must be positive, got {}",
                self.projection.base_radius
            )));
        }
        if !self.projection.altitude_scale.is_finite() {
            return Err(ConfigError::Invalid(
                "projection.altitude_scale must be finite".to_string(),
            ));
        }
        if self.cluster.radius_km.is_nan() {
            return Err(ConfigError::Invalid("cluster.radius_km is NaN".to_string()));
        }
        Ok(())
    }
}

fn var_string(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(&format!("{ENV_PREFIX}{key}")).map(|v| v.trim().to_string())
}

fn var_f64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: f64) -> f64 {
    var_string(lookup, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn var_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    match var_string(lookup, key).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use camera::Easing;
    use clustering::ClusterOrder;
    use flight::{FlightPath, SegmentTiming};
    use pretty_assertions::assert_eq;

    use super::{ConfigError, EngineConfig};

    #[test]
    fn defaults_match_documented_values() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.cluster.radius_km, 200.0);
        assert_eq!(cfg.cluster.min_pin_radius, 0.8);
        assert_eq!(cfg.cluster.max_pin_radius, 3.0);
        assert_eq!(cfg.camera.easing, Easing::EaseInOutCubic);
        assert_eq!(cfg.camera.transition_ms, 1000.0);
        assert_eq!(cfg.camera.focus_altitude, 1.5);
        assert_eq!(cfg.flight.speed, 1.0);
        assert!(!cfg.flight.camera_follows_plane);
        assert_eq!(cfg.max_frame_dt_ms, 100.0);
        assert_eq!(cfg.projection.base_radius, 100.0);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = EngineConfig::from_json_str(
            r#"{
                "cluster": {"radius_km": 50},
                "camera": {"easing": "easeInOutExpo"},
                "flight": {"camera_follows_plane": true, "path": "great_circle",
                           "segment_timing": {"mode": "fixed", "duration_ms": 2500}}
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.cluster.radius_km, 50.0);
        assert_eq!(cfg.cluster.max_pin_radius, 3.0);
        assert_eq!(cfg.camera.easing, Easing::EaseInOutExpo);
        assert_eq!(cfg.camera.transition_ms, 1000.0);
        assert!(cfg.flight.camera_follows_plane);
        assert_eq!(cfg.flight.path, FlightPath::GreatCircle);
        assert_eq!(
            cfg.flight.segment_timing,
            SegmentTiming::Fixed { duration_ms: 2500.0 }
        );
    }

    #[test]
    fn bad_json_and_bad_values_are_errors() {
        assert!(matches!(
            EngineConfig::from_json_str("{not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"projection": {"base_radius": 0}}"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn overrides_use_prefixed_keys() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("ATLAS_CLUSTER_RADIUS_KM", "75"),
            ("ATLAS_CLUSTER_ORDER", "input"),
            ("ATLAS_CAMERA_EASING", "linear"),
            ("ATLAS_FLIGHT_CAMERA_FOLLOWS_PLANE", "true"),
            ("ATLAS_FLIGHT_SPEED", "not-a-number"),
            ("CLUSTER_RADIUS_KM", "1"),
        ]);
        let mut cfg = EngineConfig::default();
        cfg.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(cfg.cluster.radius_km, 75.0);
        assert_eq!(cfg.cluster.order, ClusterOrder::Input);
        assert_eq!(cfg.camera.easing, Easing::Linear);
        assert!(cfg.flight.camera_follows_plane);
        assert_eq!(cfg.flight.speed, 1.0);
    }
}
