//! Linear parameter ramp
//!
//! Moves a value to a target in a fixed number of steps. Used for the
//! master fade-in.

/// Linearly smoothed value
#[derive(Debug, Clone, Default)]
pub struct LinearRamp {
    current: f32,
    target: f32,
    step: f32,
    countdown: u64,
    steps_to_target: u64,
}

impl LinearRamp {
    /// Create a ramp resting at `value`
    pub fn new(value: f32) -> Self {
        Self {
            current: value,
            target: value,
            ..Self::default()
        }
    }

    /// Set the ramp length and jump to the target.
    /// Non-positive or non-finite inputs give an instant ramp.
    pub fn reset(&mut self, sample_rate: f32, ramp_seconds: f32) {
        let steps = (sample_rate * ramp_seconds).floor();
        // `as` saturates: negatives and NaN become 0
        self.steps_to_target = steps as u64;
        self.set_current_and_target(self.target);
    }

    /// Jump to `value` without ramping
    pub fn set_current_and_target(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.countdown = 0;
    }

    /// Start ramping towards `value` from the current value
    pub fn set_target(&mut self, value: f32) {
        if value == self.target {
            return;
        }
        if self.steps_to_target == 0 {
            self.set_current_and_target(value);
            return;
        }
        self.target = value;
        self.countdown = self.steps_to_target;
        self.step = (self.target - self.current) / self.countdown as f32;
    }

    /// Advance one step and return the value
    #[inline]
    pub fn next_value(&mut self) -> f32 {
        if self.countdown == 0 {
            return self.target;
        }
        self.countdown -= 1;
        if self.countdown == 0 {
            self.current = self.target;
        } else {
            self.current += self.step;
        }
        self.current
    }

    /// Value without advancing
    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Whether the ramp is still moving
    pub fn is_smoothing(&self) -> bool {
        self.countdown > 0
    }
}
