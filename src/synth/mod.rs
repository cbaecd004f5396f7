//! Synthesis building blocks
//!
//! Oscillators, filters, modulators, sequencers, voices and the reverb.
//! Everything here runs on the audio thread: no allocation, no locking and
//! no panics once configured.

mod filter;
mod lfo;
mod oscillator;
mod ramp;
mod reverb;
mod selector;
mod voice;

pub use filter::{Filter, FilterHistory, FilterKind, BUTTERWORTH_Q};
pub use lfo::{Lfo, LfoDraw, ModRange};
pub use oscillator::{Oscillator, Waveform, DEFAULT_SAMPLE_RATE};
pub use ramp::LinearRamp;
pub use reverb::{Reverb, ReverbParameters};
pub use selector::{entropy_seed, FrequencySelector, SelectionMode, SelectorParameters};
pub use voice::{Detune, FilterSpec, Modulation, PatchVoice, Shaper, Tone, VoicePatch};
