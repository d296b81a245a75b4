/// Turns the host's monotonically increasing timestamps (seconds) into frame deltas.
/// The first frame has a delta of zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameClock {
    last: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delta(&mut self, now: f64) -> f32 {
        let dt = self.last.map_or(0.0, |last| (now - last).max(0.0));
        self.last = Some(now);
        dt as f32
    }
}

/// Fixed timestep accumulator.
///
/// The struck ball's velocity decays by a constant factor per update, so updates have
/// to happen at a fixed rate for the shot to look the same at any display refresh rate.
#[derive(Debug, Clone, Copy)]
pub struct FixedStep {
    step: f32,
    accumulator: f32,
    max_steps: u32,
}

impl FixedStep {
    pub const DEFAULT_STEP: f32 = 1.0 / 60.0;

    pub fn new(step: f32) -> Self {
        Self {
            step,
            accumulator: 0.0,
            max_steps: 10,
        }
    }

    /// Adds a frame's worth of time and returns how many fixed steps to run.
    ///
    /// Time beyond `max_steps` steps (a backgrounded tab, a debugger pause) is dropped.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        let total = self.accumulator + frame_dt;
        let steps = (total / self.step) as u32;
        if steps > self.max_steps {
            self.accumulator = 0.0;
            return self.max_steps;
        }
        self.accumulator = total - steps as f32 * self.step;
        steps
    }

    pub fn step(&self) -> f32 {
        self.step
    }
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::new(Self::DEFAULT_STEP)
    }
}
