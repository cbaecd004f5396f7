//! Nimbus - A generative ambient synthesizer
//!
//! Slow LFOs sweep filters and detune, timed sequences pick chord and motif
//! notes, and a reverb glues the stereo mix together. No input required.

pub mod config;
pub mod engine;
pub mod synth;

pub use config::NimbusConfig;
pub use engine::Engine;
