//! Phase-accumulator oscillator
//!
//! One accumulator type for every waveform. The waveform is a tag and the
//! phase-to-amplitude mapping is a pure function dispatched on it, so the
//! audio-rate path has no virtual calls.

use std::f32::consts::TAU;

/// Default sample rate used before `set_sample_rate` is called.
pub const DEFAULT_SAMPLE_RATE: f32 = 44100.0;

/// Waveform types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    /// `sin(2π·p)`, range [-1, 1]
    Sine,
    /// `+0.5` while `p <= pulse_width`, `-0.5` otherwise
    Square,
    /// `|p - 0.5| - 0.5`, range [-0.5, 0]
    Triangle,
    /// `p - 0.5`, range [-0.5, 0.5)
    Saw,
}

impl Waveform {
    /// Map a phase in [0, 1) to an amplitude.
    #[inline]
    pub fn shape(self, phase: f32, pulse_width: f32) -> f32 {
        match self {
            Waveform::Sine => (phase * TAU).sin(),
            Waveform::Square => {
                if phase <= pulse_width {
                    0.5
                } else {
                    -0.5
                }
            }
            Waveform::Triangle => (phase - 0.5).abs() - 0.5,
            Waveform::Saw => phase - 0.5,
        }
    }
}

/// A phase-accumulating oscillator.
///
/// Frequencies at or above half the sample rate are accepted and alias.
/// The phase wraps by a single subtraction per sample, so a frequency at or
/// above the sample rate lets the phase run past 1.0.
#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    frequency: f32,
    sample_rate: f32,
    phase: f32,
    phase_delta: f32,
    pulse_width: f32,
}

impl Oscillator {
    /// Create a new oscillator
    pub fn new(waveform: Waveform, frequency: f32, sample_rate: f32) -> Self {
        let mut osc = Self {
            waveform,
            frequency: 0.0,
            sample_rate: DEFAULT_SAMPLE_RATE,
            phase: 0.0,
            phase_delta: 0.0,
            pulse_width: 0.5,
        };
        osc.set_sample_rate(sample_rate);
        osc.set_frequency(frequency);
        osc
    }

    /// Set the sample rate. Non-positive or non-finite rates are ignored.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        if sample_rate.is_finite() && sample_rate > 0.0 {
            self.sample_rate = sample_rate;
            self.phase_delta = self.frequency / self.sample_rate;
        }
    }

    /// Get the sample rate
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Set the frequency
    #[inline]
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
        self.phase_delta = frequency / self.sample_rate;
    }

    /// Get the current frequency
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Phase increment per sample
    pub fn phase_delta(&self) -> f32 {
        self.phase_delta
    }

    /// Current phase without advancing
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Set the pulse width used by [`Waveform::Square`]
    pub fn set_pulse_width(&mut self, pulse_width: f32) {
        self.pulse_width = pulse_width;
    }

    /// Get the pulse width
    pub fn pulse_width(&self) -> f32 {
        self.pulse_width
    }

    /// Get the waveform
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Set the waveform
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    /// Reset the phase
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Advance the phase and return it.
    ///
    /// This and [`Oscillator::process`] both advance; call one of them per
    /// sample.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.phase += self.phase_delta;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        self.phase
    }

    /// Advance the phase and generate the next sample
    #[inline]
    pub fn process(&mut self) -> f32 {
        let phase = self.advance();
        self.waveform.shape(phase, self.pulse_width)
    }
}
