//! Biquad filter implementation
//!
//! Second-order IIR low/high-pass used by the voices and the bounce bus.

use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_1_SQRT_2, PI};

use super::oscillator::DEFAULT_SAMPLE_RATE;

/// Filter type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterKind {
    LowPass,
    HighPass,
}

/// Butterworth Q, the default resonance
pub const BUTTERWORTH_Q: f32 = FRAC_1_SQRT_2;

const MIN_CUTOFF: f32 = 20.0;

/// What happens to the filter state when a voice's cutoff is set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterHistory {
    /// Clear the state on every cutoff update, even an unchanged one. A
    /// cutoff set every sample leaves only the direct `b0 * x` path.
    #[default]
    Reset,
    /// Keep the state and recompute coefficients only when the cutoff
    /// changes, so a sweeping cutoff stays smooth.
    Keep,
}

/// Biquad filter coefficients
#[derive(Debug, Clone, Copy)]
struct Coefficients {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl Default for Coefficients {
    fn default() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        }
    }
}

/// Biquad filter for audio processing
#[derive(Debug, Clone)]
pub struct Filter {
    kind: FilterKind,
    sample_rate: f32,
    cutoff: f32,
    resonance: f32, // Q factor

    coeffs: Coefficients,

    // Filter state (Direct Form II transposed)
    z1: f32,
    z2: f32,
}

impl Filter {
    /// Create a new filter
    pub fn new(kind: FilterKind, cutoff: f32, resonance: f32) -> Self {
        let mut filter = Self {
            kind,
            sample_rate: DEFAULT_SAMPLE_RATE,
            cutoff,
            resonance,
            coeffs: Coefficients::default(),
            z1: 0.0,
            z2: 0.0,
        };
        filter.set_coefficients(kind, cutoff, resonance);
        filter
    }

    /// Create a Butterworth low-pass filter
    pub fn low_pass(cutoff: f32) -> Self {
        Self::new(FilterKind::LowPass, cutoff, BUTTERWORTH_Q)
    }

    /// Create a Butterworth high-pass filter
    pub fn high_pass(cutoff: f32) -> Self {
        Self::new(FilterKind::HighPass, cutoff, BUTTERWORTH_Q)
    }

    /// Replace type, cutoff and Q in one go. The filter history is left
    /// alone; call [`Filter::reset`] as well to start from silence.
    pub fn set_coefficients(&mut self, kind: FilterKind, cutoff: f32, resonance: f32) {
        self.kind = kind;
        // Clamp to valid range (20 Hz to Nyquist - margin). At very low
        // sample rates the ceiling wins.
        let max = self.sample_rate * 0.45;
        let min = MIN_CUTOFF.min(max);
        self.cutoff = if cutoff.is_finite() {
            cutoff.clamp(min, max)
        } else {
            self.cutoff.clamp(min, max)
        };
        // Clamp Q to prevent instability
        self.resonance = if resonance.is_finite() {
            resonance.clamp(0.1, 20.0)
        } else {
            BUTTERWORTH_Q
        };
        self.calculate_coefficients();
    }

    /// Set the sample rate and recompute coefficients.
    /// Non-positive or non-finite rates are ignored.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        if sample_rate.is_finite() && sample_rate > 0.0 {
            self.sample_rate = sample_rate;
            self.set_coefficients(self.kind, self.cutoff, self.resonance);
        }
    }

    /// Set cutoff frequency in Hz
    #[inline]
    pub fn set_cutoff(&mut self, hz: f32) {
        self.set_coefficients(self.kind, hz, self.resonance);
    }

    /// Get cutoff frequency
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Set resonance (Q factor)
    /// 0.707 = Butterworth (flat response)
    /// > 1.0 = resonant peak
    pub fn set_resonance(&mut self, q: f32) {
        self.set_coefficients(self.kind, self.cutoff, q);
    }

    /// Get resonance
    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Get filter type
    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    /// Reset filter state (clear history)
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    /// Calculate biquad coefficients based on current parameters
    fn calculate_coefficients(&mut self) {
        let omega = 2.0 * PI * self.cutoff / self.sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * self.resonance);

        let (b0, b1, b2) = match self.kind {
            FilterKind::LowPass => {
                let b = (1.0 - cos_omega) / 2.0;
                (b, 1.0 - cos_omega, b)
            }
            FilterKind::HighPass => {
                let b = (1.0 + cos_omega) / 2.0;
                (b, -(1.0 + cos_omega), b)
            }
        };
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        // Normalize by a0
        self.coeffs = Coefficients {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        };
    }

    /// Process a single sample through the filter
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.coeffs.b0 * input + self.z1;

        self.z1 = self.coeffs.b1 * input - self.coeffs.a1 * output + self.z2;
        self.z2 = self.coeffs.b2 * input - self.coeffs.a2 * output;

        output
    }
}
