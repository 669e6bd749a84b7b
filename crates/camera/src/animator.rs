use runtime::{Frame, FrameScheduler, HandleSlot};
use tracing::trace;

use crate::easing::Easing;
use crate::pov::CameraPov;

/// Scheduler owner label for camera transitions.
pub const CAMERA_OWNER: &str = "camera";

#[derive(Debug, Copy, Clone, PartialEq)]
struct Transition {
    start: CameraPov,
    target: CameraPov,
    duration_ms: f64,
    elapsed_ms: f64,
    easing: Easing,
}

impl Transition {
    fn linear_progress(&self) -> f64 {
        if self.duration_ms <= 0.0 {
            1.0
        } else {
            (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
        }
    }
}

/// Drives smooth point-of-view transitions, one at a time.
///
/// A new [`animate_to`](CameraAnimator::animate_to) cancels the running
/// transition and starts from the *current* POV, so rapid re-targeting never
/// jumps. The POV is written on every tick; there is no double buffering.
#[derive(Debug)]
pub struct CameraAnimator {
    scheduler: FrameScheduler,
    pov: CameraPov,
    transition: Option<Transition>,
    handle: HandleSlot,
    retargets: u64,
}

impl CameraAnimator {
    pub fn new(scheduler: FrameScheduler, initial: CameraPov) -> Self {
        Self {
            scheduler,
            pov: initial.sanitized_against(CameraPov::default()),
            transition: None,
            handle: HandleSlot::new(),
            retargets: 0,
        }
    }

    pub fn pov(&self) -> CameraPov {
        self.pov
    }

    pub fn target(&self) -> Option<CameraPov> {
        self.transition.map(|tr| tr.target)
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some() && self.handle.is_active()
    }

    /// Linear (pre-easing) progress of the running transition.
    pub fn progress(&self) -> Option<f64> {
        self.transition.map(|tr| tr.linear_progress())
    }

    /// How many transitions were replaced before finishing.
    pub fn retarget_count(&self) -> u64 {
        self.retargets
    }

    pub fn animate_to(&mut self, target: CameraPov, duration_ms: f64, easing: Easing) {
        let target = target.sanitized_against(self.pov);
        let duration_ms = if duration_ms.is_finite() && duration_ms > 0.0 {
            duration_ms
        } else {
            0.0
        };

        if self.is_animating() {
            self.retargets += 1;
            trace!(
                from_lat = self.pov.lat,
                from_lng = self.pov.lng,
                "camera retargeted mid-transition"
            );
        }

        // The old callback is gone before the new one is issued.
        self.cancel();
        self.handle.acquire(&self.scheduler, CAMERA_OWNER);
        self.transition = Some(Transition {
            start: self.pov,
            target,
            duration_ms,
            elapsed_ms: 0.0,
            easing,
        });
    }

    /// Cancels any transition and moves the camera immediately.
    pub fn jump_to(&mut self, pov: CameraPov) {
        self.cancel();
        self.pov = pov.sanitized_against(self.pov);
    }

    /// Stops the running transition where it is. Returns whether one was live.
    pub fn cancel(&mut self) -> bool {
        self.transition = None;
        self.handle.release()
    }

    /// Advances the running transition by `frame.dt_ms`.
    ///
    /// Returns whether a transition is still in progress afterwards.
    pub fn tick(&mut self, frame: &Frame) -> bool {
        let Some(mut tr) = self.transition else {
            return false;
        };
        if !self.handle.is_active() {
            // Torn down from outside (scheduler teardown).
            self.transition = None;
            return false;
        }
        if !self.handle.is_runnable() {
            return true;
        }

        tr.elapsed_ms += frame.dt_ms.max(0.0);
        let t = tr.linear_progress();
        if t >= 1.0 {
            self.pov = tr.target;
            self.transition = None;
            self.handle.finish();
            return false;
        }

        self.pov = tr.start.interpolate(tr.target, tr.easing.apply(t));
        self.transition = Some(tr);
        true
    }
}

#[cfg(test)]
mod tests {
    use runtime::{Frame, FrameScheduler};

    use super::{CAMERA_OWNER, CameraAnimator};
    use crate::easing::Easing;
    use crate::pov::CameraPov;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn run(animator: &mut CameraAnimator, frame: &mut Frame, n: usize) {
        for _ in 0..n {
            *frame = frame.next();
            animator.tick(frame);
        }
    }

    #[test]
    fn reaches_target_and_releases_handle() {
        let sched = FrameScheduler::new();
        let mut cam = CameraAnimator::new(sched.clone(), CameraPov::new(0.0, 0.0, 2.0));
        cam.animate_to(CameraPov::new(40.0, 60.0, 1.0), 1000.0, Easing::EaseInOutCubic);
        assert_eq!(sched.pending_for(CAMERA_OWNER), 1);

        let mut frame = Frame::new(0, 10.0);
        run(&mut cam, &mut frame, 99);
        assert!(cam.is_animating());
        run(&mut cam, &mut frame, 1);

        assert!(!cam.is_animating());
        assert_eq!(cam.pov(), CameraPov::new(40.0, 60.0, 1.0));
        assert_eq!(sched.pending_count(), 0);
        assert_eq!(sched.stats().finished, 1);
    }

    #[test]
    fn linear_midpoint() {
        let sched = FrameScheduler::new();
        let mut cam = CameraAnimator::new(sched, CameraPov::new(0.0, 0.0, 2.0));
        cam.animate_to(CameraPov::new(10.0, 20.0, 1.0), 100.0, Easing::Linear);
        assert_eq!(cam.progress(), Some(0.0));
        cam.tick(&Frame::new(1, 50.0));
        assert_close(cam.progress().unwrap(), 0.5, 1e-12);
        let pov = cam.pov();
        assert_close(pov.lat, 5.0, 1e-12);
        assert_close(pov.lng, 10.0, 1e-12);
        assert_close(pov.altitude, 1.5, 1e-12);
    }

    #[test]
    fn retarget_continues_from_current_pov() {
        let sched = FrameScheduler::new();
        let mut cam = CameraAnimator::new(sched.clone(), CameraPov::new(0.0, 170.0, 2.0));
        cam.animate_to(CameraPov::new(0.0, 179.0, 2.0), 1000.0, Easing::Linear);

        let mut frame = Frame::new(0, 16.0);
        run(&mut cam, &mut frame, 30);
        let before = cam.pov();
        assert!(before.lng > 170.0 && before.lng < 179.0);

        cam.animate_to(CameraPov::new(0.0, -179.0, 2.0), 1000.0, Easing::Linear);
        assert_eq!(cam.pov(), before);
        assert_eq!(sched.pending_for(CAMERA_OWNER), 1);
        assert_eq!(cam.retarget_count(), 1);

        run(&mut cam, &mut frame, 1);
        let after = cam.pov();
        // Continues eastward across the seam, a small step from `before`.
        assert!(after.lng > before.lng);
        assert!(after.lng - before.lng < 1.0);

        let mut last = after.lng;
        for _ in 0..80 {
            frame = frame.next();
            cam.tick(&frame);
            let lng = cam.pov().lng;
            let step = if lng < last { lng + 360.0 - last } else { lng - last };
            assert!(step < 1.0, "camera jumped from {last} to {lng}");
            last = lng;
        }
        assert!(!cam.is_animating());
        assert_close(cam.pov().lng, -179.0, 1e-9);
    }

    #[test]
    fn zero_duration_snaps_on_next_tick() {
        let sched = FrameScheduler::new();
        let mut cam = CameraAnimator::new(sched, CameraPov::new(0.0, 0.0, 2.0));
        cam.animate_to(CameraPov::new(30.0, -30.0, 0.5), 0.0, Easing::EaseInOutExpo);
        assert_eq!(cam.pov(), CameraPov::new(0.0, 0.0, 2.0));
        assert!(!cam.tick(&Frame::new(1, 0.0)));
        assert_eq!(cam.pov(), CameraPov::new(30.0, -30.0, 0.5));
    }

    #[test]
    fn degenerate_duration_is_treated_as_zero() {
        let sched = FrameScheduler::new();
        let mut cam = CameraAnimator::new(sched, CameraPov::default());
        cam.animate_to(CameraPov::new(1.0, 1.0, 1.0), f64::NAN, Easing::Linear);
        cam.tick(&Frame::new(1, 16.0));
        assert_eq!(cam.pov(), CameraPov::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn suspended_scheduler_freezes_transition() {
        let sched = FrameScheduler::new();
        let mut cam = CameraAnimator::new(sched.clone(), CameraPov::new(0.0, 0.0, 2.0));
        cam.animate_to(CameraPov::new(10.0, 0.0, 2.0), 100.0, Easing::Linear);
        cam.tick(&Frame::new(1, 20.0));
        let before = cam.pov();

        sched.suspend();
        assert!(cam.tick(&Frame::new(2, 20.0)));
        assert_eq!(cam.pov(), before);
        sched.resume();

        cam.tick(&Frame::new(3, 20.0));
        assert_close(cam.pov().lat, 4.0, 1e-12);
    }

    #[test]
    fn teardown_stops_the_camera_in_place() {
        let sched = FrameScheduler::new();
        let mut cam = CameraAnimator::new(sched.clone(), CameraPov::new(0.0, 0.0, 2.0));
        cam.animate_to(CameraPov::new(10.0, 0.0, 2.0), 100.0, Easing::Linear);
        cam.tick(&Frame::new(1, 50.0));
        sched.cancel_all();
        assert!(!cam.tick(&Frame::new(2, 50.0)));
        assert_close(cam.pov().lat, 5.0, 1e-12);
        assert!(!cam.is_animating());
    }

    #[test]
    fn jump_cancels_running_transition() {
        let sched = FrameScheduler::new();
        let mut cam = CameraAnimator::new(sched.clone(), CameraPov::default());
        cam.animate_to(CameraPov::new(10.0, 10.0, 1.0), 1000.0, Easing::Linear);
        cam.jump_to(CameraPov::new(-20.0, 30.0, 0.8));
        assert!(!cam.is_animating());
        assert_eq!(sched.pending_count(), 0);
        assert!(!cam.tick(&Frame::new(1, 16.0)));
        assert_eq!(cam.pov(), CameraPov::new(-20.0, 30.0, 0.8));
    }
}
