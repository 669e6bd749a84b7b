use camera::{CameraAnimator, CameraPov};
use catalog::{Location, sanitize_locations, sort_chronologically};
use runtime::{EventBus, Frame, FrameScheduler, HandleSlot, ObserverId, Stamped};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{FlightConfig, clamp_speed};
use crate::events::{FlightError, FlightEvent};
use crate::segment::{FlightSegment, PlanePosition, build_segments};

/// Scheduler owner label for flight playback.
pub const FLIGHT_OWNER: &str = "flight";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FlightStatus {
    #[default]
    Idle,
    Playing,
    Paused,
    Completed,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightState {
    pub current_segment_index: usize,
    /// Always within `[0, 1]`.
    pub progress: f64,
    pub speed: f64,
    pub status: FlightStatus,
}

impl FlightState {
    fn initial(speed: f64) -> Self {
        Self {
            current_segment_index: 0,
            progress: 0.0,
            speed,
            status: FlightStatus::Idle,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.status == FlightStatus::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.status == FlightStatus::Paused
    }
}

/// Sequences a chronological journey into hops and advances the plane along
/// them once per frame while playing.
#[derive(Debug)]
pub struct FlightSequencer {
    scheduler: FrameScheduler,
    config: FlightConfig,
    locations: Vec<Location>,
    segments: Vec<FlightSegment>,
    state: FlightState,
    handle: HandleSlot,
    // Set by `play()`: the next tick only re-establishes the time baseline.
    resync: bool,
    events: EventBus<FlightEvent>,
    last_frame: u64,
}

impl FlightSequencer {
    pub fn new(scheduler: FrameScheduler, config: FlightConfig) -> Self {
        let speed = clamp_speed(config.speed).unwrap_or(1.0);
        Self {
            scheduler,
            config,
            locations: Vec::new(),
            segments: Vec::new(),
            state: FlightState::initial(speed),
            handle: HandleSlot::new(),
            resync: false,
            events: EventBus::new(),
            last_frame: 0,
        }
    }

    pub fn config(&self) -> &FlightConfig {
        &self.config
    }

    pub fn state(&self) -> FlightState {
        self.state
    }

    pub fn status(&self) -> FlightStatus {
        self.state.status
    }

    /// Stops in visiting order.
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn segments(&self) -> &[FlightSegment] {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn can_play(&self) -> bool {
        !self.segments.is_empty()
    }

    pub fn camera_follows_plane(&self) -> bool {
        self.config.camera_follows_plane
    }

    pub fn set_camera_follows_plane(&mut self, follow: bool) {
        self.config.camera_follows_plane = follow;
    }

    /// Replaces the journey. Returns how many locations were dropped for bad
    /// coordinates.
    ///
    /// Rejected while playing or paused; use [`interrupt`](Self::interrupt)
    /// first if the journey must change mid-flight.
    pub fn set_locations(
        &mut self,
        locations: impl IntoIterator<Item = Location>,
    ) -> Result<usize, FlightError> {
        if matches!(self.state.status, FlightStatus::Playing | FlightStatus::Paused) {
            warn!(status = ?self.state.status, "rejecting location change during playback");
            return Err(self.fail(FlightError::JourneyLocked));
        }

        let sanitized = sanitize_locations(locations);
        let mut locations = sanitized.locations;
        sort_chronologically(&mut locations);
        self.segments = build_segments(&locations);
        self.locations = locations;

        self.handle.release();
        self.resync = false;
        self.state = FlightState::initial(self.state.speed);

        debug!(
            stops = self.locations.len(),
            segments = self.segments.len(),
            dropped = sanitized.dropped,
            "flight journey rebuilt"
        );
        Ok(sanitized.dropped)
    }

    pub fn play(&mut self) -> Result<(), FlightError> {
        if !self.can_play() {
            warn!(stops = self.locations.len(), "not enough locations to play");
            return Err(self.fail(FlightError::InsufficientLocations {
                count: self.locations.len(),
            }));
        }

        match self.state.status {
            FlightStatus::Playing => return Ok(()),
            FlightStatus::Completed => {
                self.state.current_segment_index = 0;
                self.state.progress = 0.0;
            }
            FlightStatus::Idle | FlightStatus::Paused => {}
        }

        self.handle.acquire(&self.scheduler, FLIGHT_OWNER);
        self.resync = true;
        self.state.status = FlightStatus::Playing;
        info!(
            segment = self.state.current_segment_index,
            progress = self.state.progress,
            "flight playing"
        );
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.state.status != FlightStatus::Playing {
            return;
        }
        self.handle.release();
        self.state.status = FlightStatus::Paused;
        info!(
            segment = self.state.current_segment_index,
            progress = self.state.progress,
            "flight paused"
        );
    }

    /// Back to `Idle` at the first segment.
    pub fn reset(&mut self) {
        self.handle.release();
        self.resync = false;
        self.state.current_segment_index = 0;
        self.state.progress = 0.0;
        self.state.status = FlightStatus::Idle;
    }

    /// Stops playback from outside and reports why.
    pub fn interrupt(&mut self, reason: impl Into<String>) {
        if !matches!(self.state.status, FlightStatus::Playing | FlightStatus::Paused) {
            return;
        }
        let reason = reason.into();
        info!(%reason, "flight interrupted");
        self.reset();
        self.fail(FlightError::Interrupted { reason });
    }

    /// Jumps to the start of segment `index`, clamped into range. The playing
    /// flag is kept; a completed flight becomes paused at the new segment.
    pub fn seek_to_segment(&mut self, index: i64) {
        let Some(last) = self.segments.len().checked_sub(1) else {
            return;
        };
        let clamped = index.clamp(0, last as i64) as usize;
        self.state.current_segment_index = clamped;
        self.state.progress = 0.0;
        if self.state.status == FlightStatus::Completed {
            self.state.status = FlightStatus::Paused;
        }
        debug!(requested = index, segment = clamped, "flight seek");
    }

    /// Sets the speed multiplier, clamped into the preset range. Non-finite or
    /// non-positive input is ignored. Returns the speed now in effect.
    pub fn set_speed(&mut self, multiplier: f64) -> f64 {
        match clamp_speed(multiplier) {
            Some(speed) => self.state.speed = speed,
            None => warn!(multiplier, "ignoring invalid flight speed"),
        }
        self.state.speed
    }

    pub fn segment_duration_ms(&self, index: usize) -> Option<f64> {
        self.segments
            .get(index)
            .map(|seg| self.config.segment_timing.duration_ms(seg.distance_km))
    }

    /// Plane position at the current index and progress.
    pub fn plane_position(&self) -> Option<PlanePosition> {
        let index = self.state.current_segment_index;
        let segment = self.segments.get(index)?;
        Some(PlanePosition::on_segment(
            segment,
            index,
            self.state.progress,
            self.config.path,
            self.config.cruise_altitude,
            self.config.arc_height,
        ))
    }

    /// Advances playback by one frame.
    ///
    /// Returns the plane position while a flight is playing. When the camera
    /// follows the plane, `camera` is retargeted at it.
    pub fn tick(
        &mut self,
        frame: &Frame,
        camera: Option<&mut CameraAnimator>,
    ) -> Option<PlanePosition> {
        self.last_frame = frame.index;
        if self.state.status != FlightStatus::Playing {
            return None;
        }
        if !self.handle.is_active() {
            // Torn down from outside (scheduler teardown).
            self.state.status = FlightStatus::Paused;
            self.resync = false;
            return None;
        }
        if !self.handle.is_runnable() {
            return self.plane_position();
        }

        let dt_ms = if std::mem::take(&mut self.resync) {
            0.0
        } else {
            frame.dt_ms.max(0.0)
        };
        let index = self.state.current_segment_index;
        let duration_ms = self.segment_duration_ms(index)?;
        self.state.progress =
            (self.state.progress + self.state.speed * dt_ms / duration_ms).min(1.0);

        if self.state.progress >= 1.0 {
            self.complete_segment(index);
        }

        let position = self.plane_position()?;
        if self.config.camera_follows_plane {
            if let Some(camera) = camera {
                camera.animate_to(
                    CameraPov::new(position.lat, position.lng, self.config.follow_altitude),
                    self.config.follow_duration_ms,
                    self.config.follow_easing,
                );
            }
        }
        Some(position)
    }

    fn complete_segment(&mut self, index: usize) {
        let location = self.segments[index].destination.clone();
        debug!(segment = index, location = %location.id, "segment complete");
        self.emit(FlightEvent::SegmentComplete {
            segment_index: index,
            location,
        });

        if index + 1 < self.segments.len() {
            self.state.current_segment_index = index + 1;
            self.state.progress = 0.0;
        } else {
            self.state.progress = 1.0;
            self.state.status = FlightStatus::Completed;
            self.handle.finish();
            info!(segments = self.segments.len(), "flight complete");
            self.emit(FlightEvent::AnimationComplete);
        }
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&FlightEvent) + 'static) -> ObserverId {
        self.events.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn events(&self) -> &[Stamped<FlightEvent>] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<Stamped<FlightEvent>> {
        self.events.drain()
    }

    fn emit(&mut self, event: FlightEvent) {
        self.events.emit(self.last_frame, event);
    }

    fn fail(&mut self, error: FlightError) -> FlightError {
        self.emit(FlightEvent::Error {
            error: error.clone(),
        });
        error
    }
}
