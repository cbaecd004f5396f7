//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::synth::{FilterHistory, LfoDraw, SelectionMode};

/// Configuration problems found by [`NimbusConfig::validate`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("sample rate must be between 8000 and 192000 Hz, got {0}")]
    SampleRate(u32),

    #[error("buffer size must be between 16 and 8192 frames, got {0}")]
    BufferSize(usize),

    #[error("master volume must be between 0.0 and 1.0, got {0}")]
    Volume(f32),

    #[error("fade-in must be a non-negative number of seconds, got {0}")]
    FadeIn(f32),

    #[error("sequence '{sequence}': hold must be a non-negative number of seconds, got {hold}")]
    Hold { sequence: Sequence, hold: f32 },

    #[error("sequence '{sequence}': frequency {frequency} is not a non-negative number")]
    Frequency { sequence: Sequence, frequency: f32 },
}

/// Main configuration for Nimbus
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NimbusConfig {
    /// Audio output settings
    pub audio: AudioConfig,

    /// Master volume and fade-in
    pub master: MasterConfig,

    /// LFO behaviour and randomness
    pub modulation: ModulationConfig,

    /// Per-sequence overrides of the built-in palettes
    pub sequences: BTreeMap<Sequence, SequenceConfig>,
}

impl NimbusConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(8000..=192_000).contains(&self.audio.sample_rate) {
            return Err(ConfigError::SampleRate(self.audio.sample_rate));
        }
        if !(16..=8192).contains(&self.audio.buffer_size) {
            return Err(ConfigError::BufferSize(self.audio.buffer_size));
        }

        if !(0.0..=1.0).contains(&self.master.volume) {
            return Err(ConfigError::Volume(self.master.volume));
        }
        if !(self.master.fade_in.is_finite() && self.master.fade_in >= 0.0) {
            return Err(ConfigError::FadeIn(self.master.fade_in));
        }

        for (&sequence, config) in &self.sequences {
            if !(config.hold.is_finite() && config.hold >= 0.0) {
                return Err(ConfigError::Hold {
                    sequence,
                    hold: config.hold,
                });
            }
            if let Some(&frequency) = config
                .frequencies
                .iter()
                .find(|f| !(f.is_finite() && **f >= 0.0))
            {
                return Err(ConfigError::Frequency {
                    sequence,
                    frequency,
                });
            }
        }

        Ok(())
    }
}

/// Audio output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate in Hz (default: 44100)
    pub sample_rate: u32,

    /// Frames per rendered block (default: 512)
    pub buffer_size: usize,

    /// Output device name (None = default device)
    pub device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            buffer_size: 512,
            device: None,
        }
    }
}

/// Master settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterConfig {
    /// Master volume 0.0-1.0 (default: 1.0)
    pub volume: f32,

    /// Length of the fade-in ramp in seconds of ramp steps (default: 2.0).
    /// The ramp steps once per channel, so a stereo fade reaches full
    /// volume after `fade_in / 2` seconds of audio.
    pub fade_in: f32,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            volume: 1.0,
            fade_in: 2.0,
        }
    }
}

/// Modulation settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulationConfig {
    /// Whether repeated LFO reads in one frame advance the LFO
    pub draw: LfoDraw,

    /// Whether voice filters restart from silence on every cutoff update
    pub filter_history: FilterHistory,

    /// Seed for the random sequences (None = OS entropy)
    pub seed: Option<u64>,
}

/// The engine's frequency sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sequence {
    ChordRoot,
    ChordThird,
    ChordFifth,
    ChordSeventh,
    BounceLeft,
    BounceRight,
    Motif,
    Sparkle,
}

impl Sequence {
    pub const COUNT: usize = 8;

    /// Every sequence, in engine order
    pub const ALL: [Sequence; Self::COUNT] = [
        Sequence::ChordRoot,
        Sequence::ChordThird,
        Sequence::ChordFifth,
        Sequence::ChordSeventh,
        Sequence::BounceLeft,
        Sequence::BounceRight,
        Sequence::Motif,
        Sequence::Sparkle,
    ];

    /// Name as written in config files
    pub fn name(self) -> &'static str {
        match self {
            Sequence::ChordRoot => "chord_root",
            Sequence::ChordThird => "chord_third",
            Sequence::ChordFifth => "chord_fifth",
            Sequence::ChordSeventh => "chord_seventh",
            Sequence::BounceLeft => "bounce_left",
            Sequence::BounceRight => "bounce_right",
            Sequence::Motif => "motif",
            Sequence::Sparkle => "sparkle",
        }
    }
}

impl std::fmt::Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A frequency palette with its timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceConfig {
    /// Candidate frequencies in Hz, 0 is a rest
    pub frequencies: Vec<f32>,

    /// Seconds each frequency is held
    pub hold: f32,

    /// How the next frequency is picked (default: random)
    #[serde(default)]
    pub mode: SelectionMode,
}
