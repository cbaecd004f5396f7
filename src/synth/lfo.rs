//! Low Frequency Oscillator for modulation
//!
//! Slow modulators feeding cutoff, vibrato depth, detune, pulse width and
//! mix amounts. Every destination reads the LFO through [`Lfo::draw`]; the
//! draw policy decides whether each read advances the phase.

use serde::{Deserialize, Serialize};

use super::oscillator::{Oscillator, Waveform};
use super::voice::PatchVoice;

/// How an LFO answers repeated reads within one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LfoDraw {
    /// Every read advances the phase. Destinations read later in a frame
    /// see a later point of the waveform, so an LFO read `n` times per
    /// frame runs `n` times faster than its nominal rate.
    #[default]
    PerCall,
    /// The first read of a frame advances the phase and every other read
    /// of that frame reuses the value.
    PerFrame,
}

/// A linear map from a bipolar LFO value to a parameter range.
///
/// `min` is reached at -1 and `max` at +1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModRange {
    pub min: f32,
    pub max: f32,
}

impl ModRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Rescale a value in [-1, 1]
    #[inline]
    pub fn map(&self, raw: f32) -> f32 {
        self.min + (raw + 1.0) * 0.5 * (self.max - self.min)
    }
}

/// What produces the raw LFO signal
#[derive(Debug, Clone)]
enum LfoSource {
    Sine(Oscillator),
    /// A full voice used as a modulator
    Voice(Box<PatchVoice>),
}

/// Low Frequency Oscillator
#[derive(Debug, Clone)]
pub struct Lfo {
    source: LfoSource,
    draw: LfoDraw,
    held: f32,
    fresh: bool,
}

impl Lfo {
    /// A sine LFO
    pub fn sine(frequency: f32, sample_rate: f32) -> Self {
        Self::with_source(LfoSource::Sine(Oscillator::new(
            Waveform::Sine,
            frequency,
            sample_rate,
        )))
    }

    /// Use a voice as the modulation signal
    pub fn voice(voice: PatchVoice) -> Self {
        Self::with_source(LfoSource::Voice(Box::new(voice)))
    }

    fn with_source(source: LfoSource) -> Self {
        Self {
            source,
            draw: LfoDraw::default(),
            held: 0.0,
            fresh: true,
        }
    }

    /// Set the draw policy
    pub fn set_draw(&mut self, draw: LfoDraw) {
        self.draw = draw;
    }

    /// Get the draw policy
    pub fn draw_policy(&self) -> LfoDraw {
        self.draw
    }

    /// Set LFO frequency in Hz
    pub fn set_frequency(&mut self, hz: f32) {
        match &mut self.source {
            LfoSource::Sine(osc) => osc.set_frequency(hz),
            LfoSource::Voice(voice) => voice.set_frequency(hz),
        }
    }

    /// Get LFO frequency
    pub fn frequency(&self) -> f32 {
        match &self.source {
            LfoSource::Sine(osc) => osc.frequency(),
            LfoSource::Voice(voice) => voice.frequency(),
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        match &mut self.source {
            LfoSource::Sine(osc) => osc.set_sample_rate(sample_rate),
            LfoSource::Voice(voice) => voice.set_sample_rate(sample_rate),
        }
    }

    /// Mark the start of a new frame
    #[inline]
    pub fn begin_frame(&mut self) {
        self.fresh = true;
    }

    /// Read the LFO (bipolar)
    #[inline]
    pub fn draw(&mut self) -> f32 {
        match self.draw {
            LfoDraw::PerCall => self.advance(),
            LfoDraw::PerFrame => {
                if self.fresh {
                    self.held = self.advance();
                    self.fresh = false;
                }
                self.held
            }
        }
    }

    /// Read the LFO and rescale it into `range`
    #[inline]
    pub fn draw_in(&mut self, range: ModRange) -> f32 {
        let raw = self.draw();
        range.map(raw)
    }

    fn advance(&mut self) -> f32 {
        match &mut self.source {
            LfoSource::Sine(osc) => osc.process(),
            LfoSource::Voice(voice) => voice.process(),
        }
    }
}
