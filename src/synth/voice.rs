//! Declarative voices
//!
//! A [`VoicePatch`] describes a voice: which oscillators make the tone, how
//! the modulation LFO is routed, optional detune layers, a wave shaper and a
//! filter. [`PatchVoice`] interprets any patch with one render routine.
//!
//! The four stock patches:
//!
//! | patch | tone | modulation | extras |
//! |-------|------|------------|--------|
//! | [`VoicePatch::string`] | square + saw | vibrato | low-pass 1200 Hz |
//! | [`VoicePatch::sub_bass`] | square + saw | vibrato | two detuned saws, low-pass 400 Hz Q 5 |
//! | [`VoicePatch::pad`] | sine | phase modulation | 20/80 dry/low-pass 5000 Hz Q 1 |
//! | [`VoicePatch::movement`] | sine | vibrato | half-wave scaled, clipped at 0.5 |

use std::f32::consts::TAU;

use super::filter::{Filter, FilterHistory, FilterKind, BUTTERWORTH_Q};
use super::oscillator::{Oscillator, Waveform, DEFAULT_SAMPLE_RATE};

/// Tone generators of a voice
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tone {
    /// A single sine
    Sine,
    /// `square * square_amount + saw * saw_amount`. The amounts need not
    /// sum to one.
    SquareSaw,
}

/// Where the voice's own LFO goes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Modulation {
    /// `freq = base * (1 + lfo * depth)`
    Vibrato,
    /// `lfo * depth` radians added to the tone phase before the lookup
    PhaseMod,
}

/// Two extra saw layers offset from the base pitch, averaged with the tone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detune {
    pub cents: i32,
    pub semitones: i32,
}

/// Post-tone shaping
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shaper {
    None,
    /// Rescale [-1, 1] to [0, 1] and clip everything above 0.5
    HalfWaveClip,
}

/// Filter stage and its dry/filtered blend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    pub kind: FilterKind,
    pub cutoff: f32,
    pub resonance: f32,
    pub dry: f32,
    pub wet: f32,
    /// State handling on cutoff updates
    pub history: FilterHistory,
}

/// Declarative description of a voice
#[derive(Debug, Clone, PartialEq)]
pub struct VoicePatch {
    pub tone: Tone,
    pub square_amount: f32,
    pub saw_amount: f32,
    pub pulse_width: f32,
    pub modulation: Modulation,
    /// Rate of the voice LFO in Hz
    pub mod_rate: f32,
    /// Vibrato depth (fraction of the pitch) or phase offset in radians
    pub mod_depth: f32,
    pub detune: Option<Detune>,
    pub shaper: Shaper,
    pub filter: Option<FilterSpec>,
}

impl VoicePatch {
    /// Square/saw string machine through a gentle low-pass
    pub fn string() -> Self {
        Self {
            tone: Tone::SquareSaw,
            square_amount: 0.5,
            saw_amount: 1.0,
            pulse_width: 0.5,
            modulation: Modulation::Vibrato,
            mod_rate: 5.0,
            mod_depth: 0.005,
            detune: None,
            shaper: Shaper::None,
            filter: Some(FilterSpec {
                kind: FilterKind::LowPass,
                cutoff: 1200.0,
                resonance: BUTTERWORTH_Q,
                dry: 0.0,
                wet: 1.0,
                history: FilterHistory::Reset,
            }),
        }
    }

    /// Square/saw plus fine and coarse detuned saws, resonant low-pass
    pub fn sub_bass() -> Self {
        Self {
            tone: Tone::SquareSaw,
            square_amount: 0.7,
            saw_amount: 0.7,
            pulse_width: 0.5,
            modulation: Modulation::Vibrato,
            mod_rate: 5.0,
            mod_depth: 0.005,
            detune: Some(Detune {
                cents: 5,
                semitones: -12,
            }),
            shaper: Shaper::None,
            filter: Some(FilterSpec {
                kind: FilterKind::LowPass,
                cutoff: 400.0,
                resonance: 5.0,
                dry: 0.0,
                wet: 1.0,
                history: FilterHistory::Reset,
            }),
        }
    }

    /// Phase-modulated sine, part raw and part low-passed
    pub fn pad() -> Self {
        Self {
            tone: Tone::Sine,
            square_amount: 0.0,
            saw_amount: 0.0,
            pulse_width: 0.5,
            modulation: Modulation::PhaseMod,
            mod_rate: 5.0,
            mod_depth: 0.5,
            detune: None,
            shaper: Shaper::None,
            filter: Some(FilterSpec {
                kind: FilterKind::LowPass,
                cutoff: 5000.0,
                resonance: 1.0,
                dry: 0.2,
                wet: 0.8,
                history: FilterHistory::Reset,
            }),
        }
    }

    /// Unipolar amplitude mover: a vibrato sine squashed into [0, 0.5]
    pub fn movement() -> Self {
        Self {
            tone: Tone::Sine,
            square_amount: 0.0,
            saw_amount: 0.0,
            pulse_width: 0.5,
            modulation: Modulation::Vibrato,
            mod_rate: 5.0,
            mod_depth: 0.005,
            detune: None,
            shaper: Shaper::HalfWaveClip,
            filter: None,
        }
    }
}

/// Frequency offset by cents
#[inline]
fn cents_to_frequency(base: f32, cents: i32) -> f32 {
    (base as f64 * 2f64.powf(cents as f64 / 1200.0)) as f32
}

/// Frequency offset by semitones
#[inline]
fn semitones_to_frequency(base: f32, semitones: i32) -> f32 {
    (base as f64 * 2f64.powf(semitones as f64 / 12.0)) as f32
}

/// A voice rendering any [`VoicePatch`]
///
/// All oscillators share the voice's sample rate. Setting the frequency
/// moves every tone oscillator and re-derives the detune layers.
#[derive(Debug, Clone)]
pub struct PatchVoice {
    patch: VoicePatch,
    sample_rate: f32,
    base_frequency: f32,

    primary: Oscillator,
    saw: Oscillator,
    detune_fine: Oscillator,
    detune_coarse: Oscillator,
    modulator: Oscillator,
    filter: Option<Filter>,
}

impl PatchVoice {
    /// Create a voice at 440 Hz and the default sample rate
    pub fn new(patch: VoicePatch) -> Self {
        let primary_shape = match patch.tone {
            Tone::Sine => Waveform::Sine,
            Tone::SquareSaw => Waveform::Square,
        };
        let mut primary = Oscillator::new(primary_shape, 0.0, DEFAULT_SAMPLE_RATE);
        primary.set_pulse_width(patch.pulse_width);

        let filter = patch
            .filter
            .map(|spec| Filter::new(spec.kind, spec.cutoff, spec.resonance));

        let mut voice = Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            base_frequency: 0.0,
            primary,
            saw: Oscillator::new(Waveform::Saw, 0.0, DEFAULT_SAMPLE_RATE),
            detune_fine: Oscillator::new(Waveform::Saw, 0.0, DEFAULT_SAMPLE_RATE),
            detune_coarse: Oscillator::new(Waveform::Saw, 0.0, DEFAULT_SAMPLE_RATE),
            modulator: Oscillator::new(Waveform::Sine, patch.mod_rate, DEFAULT_SAMPLE_RATE),
            filter,
            patch,
        };
        voice.set_frequency(440.0);
        voice
    }

    /// The patch as currently modulated
    pub fn patch(&self) -> &VoicePatch {
        &self.patch
    }

    /// Set the sample rate of every oscillator and re-derive the filter.
    /// Non-positive or non-finite rates are ignored.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return;
        }
        self.sample_rate = sample_rate;
        for osc in [
            &mut self.primary,
            &mut self.saw,
            &mut self.detune_fine,
            &mut self.detune_coarse,
            &mut self.modulator,
        ] {
            osc.set_sample_rate(sample_rate);
        }
        if let (Some(filter), Some(spec)) = (self.filter.as_mut(), self.patch.filter) {
            filter.set_sample_rate(sample_rate);
            // Re-apply the requested cutoff, the previous rate may have clamped it
            filter.set_coefficients(spec.kind, spec.cutoff, spec.resonance);
            if spec.history == FilterHistory::Reset {
                filter.reset();
            }
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Set the base frequency
    #[inline]
    pub fn set_frequency(&mut self, frequency: f32) {
        self.base_frequency = frequency;
        self.primary.set_frequency(frequency);
        self.saw.set_frequency(frequency);
        self.retune_detune();
    }

    /// Get the base frequency
    pub fn frequency(&self) -> f32 {
        self.base_frequency
    }

    /// Vibrato or phase-modulation rate in Hz
    #[inline]
    pub fn set_mod_rate(&mut self, hz: f32) {
        self.patch.mod_rate = hz;
        self.modulator.set_frequency(hz);
    }

    /// Vibrato depth or phase-modulation amount
    #[inline]
    pub fn set_mod_depth(&mut self, depth: f32) {
        self.patch.mod_depth = depth;
    }

    #[inline]
    pub fn set_pulse_width(&mut self, pulse_width: f32) {
        self.patch.pulse_width = pulse_width;
        self.primary.set_pulse_width(pulse_width);
    }

    #[inline]
    pub fn set_square_amount(&mut self, amount: f32) {
        self.patch.square_amount = amount;
    }

    #[inline]
    pub fn set_saw_amount(&mut self, amount: f32) {
        self.patch.saw_amount = amount;
    }

    /// Fine detune in cents. No-op for patches without detune layers.
    #[inline]
    pub fn set_detune_fine(&mut self, cents: i32) {
        if let Some(detune) = self.patch.detune.as_mut() {
            detune.cents = cents;
            self.detune_fine
                .set_frequency(cents_to_frequency(self.base_frequency, cents));
        }
    }

    /// Coarse detune in semitones. No-op for patches without detune layers.
    #[inline]
    pub fn set_detune_coarse(&mut self, semitones: i32) {
        if let Some(detune) = self.patch.detune.as_mut() {
            detune.semitones = semitones;
            self.detune_coarse
                .set_frequency(semitones_to_frequency(self.base_frequency, semitones));
        }
    }

    /// Filter cutoff in Hz.
    ///
    /// With [`FilterHistory::Reset`] every call recomputes the coefficients
    /// and clears the filter state. With [`FilterHistory::Keep`] the
    /// coefficients are recomputed only on change.
    #[inline]
    pub fn set_filter_cutoff(&mut self, cutoff: f32) {
        if let (Some(filter), Some(spec)) = (self.filter.as_mut(), self.patch.filter.as_mut()) {
            match spec.history {
                FilterHistory::Reset => {
                    spec.cutoff = cutoff;
                    filter.set_coefficients(spec.kind, cutoff, spec.resonance);
                    filter.reset();
                }
                FilterHistory::Keep => {
                    if spec.cutoff != cutoff {
                        spec.cutoff = cutoff;
                        filter.set_coefficients(spec.kind, cutoff, spec.resonance);
                    }
                }
            }
        }
    }

    /// Choose how cutoff updates treat the filter state
    pub fn set_filter_history(&mut self, history: FilterHistory) {
        if let Some(spec) = self.patch.filter.as_mut() {
            spec.history = history;
        }
    }

    /// Filter Q
    pub fn set_filter_resonance(&mut self, resonance: f32) {
        if let (Some(filter), Some(spec)) = (self.filter.as_mut(), self.patch.filter.as_mut()) {
            spec.resonance = resonance;
            filter.set_coefficients(spec.kind, spec.cutoff, resonance);
        }
    }

    fn retune_detune(&mut self) {
        if let Some(detune) = self.patch.detune {
            self.detune_fine
                .set_frequency(cents_to_frequency(self.base_frequency, detune.cents));
            self.detune_coarse
                .set_frequency(semitones_to_frequency(self.base_frequency, detune.semitones));
        }
    }

    /// Render one sample
    #[inline]
    pub fn process(&mut self) -> f32 {
        let modulation = self.modulator.process() * self.patch.mod_depth;

        let tone = match self.patch.modulation {
            Modulation::Vibrato => {
                let frequency = self.base_frequency * (1.0 + modulation);
                self.primary.set_frequency(frequency);
                self.saw.set_frequency(frequency);
                self.render_tone()
            }
            Modulation::PhaseMod => self.render_tone_phase_modulated(modulation),
        };

        let mixed = match self.patch.detune {
            Some(_) => (tone + self.detune_fine.process() + self.detune_coarse.process()) / 4.0,
            None => tone,
        };

        let shaped = match self.patch.shaper {
            Shaper::None => mixed,
            Shaper::HalfWaveClip => ((mixed + 1.0) / 2.0).min(0.5),
        };

        match (self.filter.as_mut(), self.patch.filter) {
            (Some(filter), Some(spec)) => shaped * spec.dry + filter.process(shaped) * spec.wet,
            _ => shaped,
        }
    }

    fn render_tone(&mut self) -> f32 {
        match self.patch.tone {
            Tone::Sine => self.primary.process(),
            Tone::SquareSaw => {
                let square = self.primary.process();
                let saw = self.saw.process();
                square * self.patch.square_amount + saw * self.patch.saw_amount
            }
        }
    }

    fn render_tone_phase_modulated(&mut self, radians: f32) -> f32 {
        match self.patch.tone {
            Tone::Sine => {
                let phase = self.primary.advance();
                (radians + phase * TAU).sin()
            }
            Tone::SquareSaw => {
                let offset = radians / TAU;
                let square_phase = (self.primary.advance() + offset).rem_euclid(1.0);
                let saw_phase = (self.saw.advance() + offset).rem_euclid(1.0);
                let square = Waveform::Square.shape(square_phase, self.patch.pulse_width);
                let saw = Waveform::Saw.shape(saw_phase, self.patch.pulse_width);
                square * self.patch.square_amount + saw * self.patch.saw_amount
            }
        }
    }
}
