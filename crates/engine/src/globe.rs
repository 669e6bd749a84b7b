use camera::{CameraAnimator, CameraPov};
use catalog::{CatalogError, Location, LocationSource, sanitize_locations};
use clustering::{ClusterSet, GeoClusterer};
use flight::{FlightError, FlightEvent, FlightSequencer, FlightState, FlightStatus, PlanePosition};
use foundation::math::{LatLng, SphereProjection, Vec3};
use runtime::{FrameClock, FrameScheduler, ObserverId};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameOutput {
    pub frame_index: u64,
    pub time_ms: f64,
    pub pov: CameraPov,
    pub plane: Option<PlanePosition>,
    /// `plane` projected onto the globe mesh.
    pub plane_xyz: Option<[f64; 3]>,
    pub flight: FlightState,
    pub events: Vec<FlightEvent>,
}

/// The globe journey engine: clusters pins, animates the camera and plays
/// the flight, one host frame at a time.
#[derive(Debug)]
pub struct GlobeEngine {
    config: EngineConfig,
    scheduler: FrameScheduler,
    clock: FrameClock,
    projection: SphereProjection,
    clusterer: GeoClusterer,
    locations: Vec<Location>,
    clusters: ClusterSet,
    camera: CameraAnimator,
    flight: FlightSequencer,
    shut_down: bool,
}

impl GlobeEngine {
    pub fn new(config: EngineConfig) -> Self {
        let scheduler = FrameScheduler::new();
        let camera = CameraAnimator::new(
            scheduler.clone(),
            CameraPov::new(0.0, 0.0, config.camera.overview_altitude),
        );
        let flight = FlightSequencer::new(scheduler.clone(), config.flight.clone());
        Self {
            clock: FrameClock::new(config.max_frame_dt_ms),
            projection: config.projection.sphere(),
            clusterer: GeoClusterer::new(config.cluster.clone()),
            locations: Vec::new(),
            clusters: ClusterSet::default(),
            camera,
            flight,
            scheduler,
            config,
            shut_down: false,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn projection(&self) -> SphereProjection {
        self.projection
    }

    /// Replaces the location set. Clusters are rebuilt and the journey is
    /// resequenced; a flight in progress is interrupted first.
    ///
    /// Returns how many locations were dropped for unusable coordinates.
    pub fn set_locations(&mut self, locations: impl IntoIterator<Item = Location>) -> usize {
        let sanitized = sanitize_locations(locations);
        self.locations = sanitized.locations;
        self.recluster();

        if matches!(self.flight.status(), FlightStatus::Playing | FlightStatus::Paused) {
            self.flight.interrupt("locations changed");
        }
        if let Err(err) = self.flight.set_locations(self.locations.iter().cloned()) {
            warn!(%err, "flight kept its previous journey");
        }

        info!(
            locations = self.locations.len(),
            dropped = sanitized.dropped,
            clusters = self.clusters.len(),
            segments = self.flight.segment_count(),
            "locations loaded"
        );
        sanitized.dropped
    }

    pub fn load_from(&mut self, source: &impl LocationSource) -> Result<usize, CatalogError> {
        let locations = source.locations()?;
        Ok(self.set_locations(locations))
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn clusters(&self) -> &ClusterSet {
        &self.clusters
    }

    pub fn set_cluster_radius(&mut self, radius_km: f64) {
        self.clusterer.set_radius_km(radius_km);
        self.config.cluster.radius_km = radius_km;
        self.recluster();
    }

    fn recluster(&mut self) {
        self.clusters = self.clusterer.cluster(&self.locations);
        debug!(clusters = self.clusters.len(), "clusters rebuilt");
    }

    pub fn camera_pov(&self) -> CameraPov {
        self.camera.pov()
    }

    pub fn camera(&self) -> &CameraAnimator {
        &self.camera
    }

    /// Smoothly moves the camera with the configured easing. `None` uses the
    /// configured transition time.
    pub fn fly_to(&mut self, pov: CameraPov, duration_ms: Option<f64>) {
        let duration_ms = duration_ms.unwrap_or(self.config.camera.transition_ms);
        self.camera.animate_to(pov, duration_ms, self.config.camera.easing);
    }

    pub fn jump_to(&mut self, pov: CameraPov) {
        self.camera.jump_to(pov);
    }

    pub fn focus_cluster(&mut self, cluster_id: &str) -> bool {
        let Some(cluster) = self.clusters.find(cluster_id) else {
            warn!(cluster_id, "focus on unknown cluster");
            return false;
        };
        let pov = CameraPov::new(
            cluster.latitude,
            cluster.longitude,
            self.config.camera.focus_altitude,
        );
        self.fly_to(pov, None);
        true
    }

    pub fn focus_location(&mut self, location_id: &str) -> bool {
        let Some(location) = self.locations.iter().find(|l| l.id == location_id) else {
            warn!(location_id, "focus on unknown location");
            return false;
        };
        let pov = CameraPov::new(
            location.latitude,
            location.longitude,
            self.config.camera.focus_altitude,
        );
        self.fly_to(pov, None);
        true
    }

    /// A POV centred on the pins, at overview altitude.
    pub fn overview_pov(&self) -> CameraPov {
        let altitude = self.config.camera.overview_altitude;
        let sum = self.clusters.iter().fold(Vec3::ZERO, |acc, cluster| {
            let weight = cluster.len() as f64;
            acc + LatLng::new(cluster.latitude, cluster.longitude)
                .to_unit()
                .scale(weight)
        });
        match sum.normalized() {
            Some(u) => {
                let center = LatLng::from_unit(u);
                CameraPov::new(center.lat_deg, center.lng_deg, altitude)
            }
            None => CameraPov::new(0.0, 0.0, altitude),
        }
    }

    pub fn show_overview(&mut self) {
        let pov = self.overview_pov();
        self.fly_to(pov, None);
    }

    pub fn flight(&self) -> &FlightSequencer {
        &self.flight
    }

    pub fn flight_state(&self) -> FlightState {
        self.flight.state()
    }

    pub fn plane_position(&self) -> Option<PlanePosition> {
        self.flight.plane_position()
    }

    pub fn play(&mut self) -> Result<(), FlightError> {
        self.flight.play()
    }

    pub fn pause(&mut self) {
        self.flight.pause();
    }

    pub fn reset_flight(&mut self) {
        self.flight.reset();
    }

    pub fn seek_to_segment(&mut self, index: i64) {
        self.flight.seek_to_segment(index);
    }

    pub fn set_speed(&mut self, multiplier: f64) -> f64 {
        self.flight.set_speed(multiplier)
    }

    pub fn set_camera_follows_plane(&mut self, follow: bool) {
        self.flight.set_camera_follows_plane(follow);
        self.config.flight.camera_follows_plane = follow;
    }

    pub fn subscribe_flight(&mut self, observer: impl FnMut(&FlightEvent) + 'static) -> ObserverId {
        self.flight.subscribe(observer)
    }

    pub fn unsubscribe_flight(&mut self, id: ObserverId) -> bool {
        self.flight.unsubscribe(id)
    }

    pub fn is_visible(&self) -> bool {
        !self.clock.is_hidden()
    }

    /// Page visibility. Hidden time never advances animations.
    pub fn set_visible(&mut self, visible: bool) {
        if visible == self.is_visible() {
            return;
        }
        self.clock.set_hidden(!visible);
        if visible {
            self.scheduler.resume();
        } else {
            self.scheduler.suspend();
        }
        info!(visible, "visibility changed");
    }

    /// Runs one host frame at `host_ms`. `None` while hidden or after shutdown.
    pub fn frame(&mut self, host_ms: f64) -> Option<FrameOutput> {
        if self.shut_down {
            return None;
        }
        let frame = self.clock.advance(host_ms)?;

        // Flight first so a follow retarget is applied in the same frame.
        let ticked = self.flight.tick(&frame, Some(&mut self.camera));
        self.camera.tick(&frame);

        // A paused or finished flight still shows the plane where it stopped.
        let plane = match self.flight.status() {
            FlightStatus::Paused | FlightStatus::Completed => {
                ticked.or_else(|| self.flight.plane_position())
            }
            FlightStatus::Idle | FlightStatus::Playing => ticked,
        };

        let plane_xyz = plane.map(|p| {
            self.projection
                .project(p.lat, p.lng, p.altitude)
                .as_array()
        });
        let events = self
            .flight
            .drain_events()
            .into_iter()
            .map(|stamped| stamped.event)
            .collect();

        Some(FrameOutput {
            frame_index: frame.index,
            time_ms: frame.time_ms,
            pov: self.camera.pov(),
            plane,
            plane_xyz,
            flight: self.flight.state(),
            events,
        })
    }

    pub fn project(&self, lat: f64, lng: f64, altitude: f64) -> Vec3 {
        self.projection.project(lat, lng, altitude)
    }

    /// Cancels every pending frame callback. The engine produces no further
    /// frames.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.flight.reset();
        self.camera.cancel();
        let cancelled = self.scheduler.cancel_all();
        self.shut_down = true;
        info!(cancelled, "engine shut down");
    }
}

impl Drop for GlobeEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
