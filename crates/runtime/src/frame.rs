/// Per-frame timing handed to every animator tick.
///
/// Times are in milliseconds of *engine* time: wall-clock time minus any
/// stretch where the view was hidden.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Engine time elapsed since the previous frame.
    pub dt_ms: f64,
    /// Engine time at this frame.
    pub time_ms: f64,
}

impl Frame {
    /// Fixed-step frame, for simulations and tests.
    pub fn new(index: u64, dt_ms: f64) -> Self {
        Self {
            index,
            dt_ms,
            time_ms: index as f64 * dt_ms,
        }
    }

    pub fn next(self) -> Self {
        Self {
            index: self.index + 1,
            dt_ms: self.dt_ms,
            time_ms: self.time_ms + self.dt_ms,
        }
    }
}

/// Default cap on a single frame's dt.
pub const DEFAULT_MAX_FRAME_DT_MS: f64 = 100.0;

/// Turns host timestamps (e.g. `requestAnimationFrame` time) into [`Frame`]s.
///
/// While hidden the clock produces no frames. Becoming visible again drops the
/// time baseline, so the first frame after resume has `dt_ms == 0` and the
/// hidden interval never reaches animation progress.
#[derive(Debug, Clone)]
pub struct FrameClock {
    next_index: u64,
    last_host_ms: Option<f64>,
    engine_ms: f64,
    hidden: bool,
    max_dt_ms: f64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_DT_MS)
    }
}

impl FrameClock {
    pub fn new(max_dt_ms: f64) -> Self {
        let max_dt_ms = if max_dt_ms.is_finite() && max_dt_ms > 0.0 {
            max_dt_ms
        } else {
            DEFAULT_MAX_FRAME_DT_MS
        };
        Self {
            next_index: 0,
            last_host_ms: None,
            engine_ms: 0.0,
            hidden: false,
            max_dt_ms,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn engine_time_ms(&self) -> f64 {
        self.engine_ms
    }

    pub fn frames_produced(&self) -> u64 {
        self.next_index
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        if self.hidden == hidden {
            return;
        }
        self.hidden = hidden;
        // Either way the old baseline is stale: hidden time must not count.
        self.last_host_ms = None;
    }

    /// Advances the clock to `host_ms`. Returns `None` while hidden.
    ///
    /// Host timestamps that go backwards or are not finite yield `dt_ms == 0`.
    pub fn advance(&mut self, host_ms: f64) -> Option<Frame> {
        if self.hidden {
            return None;
        }

        let dt_ms = match self.last_host_ms {
            Some(last) if host_ms.is_finite() => (host_ms - last).clamp(0.0, self.max_dt_ms),
            _ => 0.0,
        };
        if host_ms.is_finite() {
            self.last_host_ms = Some(host_ms);
        }

        self.engine_ms += dt_ms;
        let frame = Frame {
            index: self.next_index,
            dt_ms,
            time_ms: self.engine_ms,
        };
        self.next_index += 1;
        Some(frame)
    }
}
