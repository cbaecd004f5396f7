//! The ambient patch
//!
//! Palettes, timings, LFO ranges and mix levels that make up the sound.
//! Every LFO range maps -1 to `min` and +1 to `max`.

use crate::config::{Sequence, SequenceConfig};
use crate::synth::{ModRange, ReverbParameters, SelectionMode};

/// Slow sine LFO rate
pub const SLOW_LFO_HZ: f32 = 0.05;
/// Rate of the pad voice used as the drift LFO
pub const DRIFT_LFO_HZ: f32 = 0.1;
/// Panning LFO rate for the sparkle pad
pub const PAN_LFO_HZ: f32 = 1.0;

// Slow LFO destinations
pub const MOVEMENT_VIBRATO_DEPTH: ModRange = ModRange::new(0.005, 0.03);
pub const CHORD_CUTOFF: ModRange = ModRange::new(1000.0, 9000.0);
pub const CHORD_MOD_RATE: ModRange = ModRange::new(0.1, 6.1);
pub const CHORD_MOD_DEPTH: ModRange = ModRange::new(0.0, 0.25);
pub const BOUNCE_CUTOFF: ModRange = ModRange::new(1000.0, 3000.0);
pub const OCTAVE_SAW: ModRange = ModRange::new(0.5, 1.0);
pub const SUB_SQUARE: ModRange = ModRange::new(0.25, 0.75);
pub const SUB_DETUNE_CENTS: ModRange = ModRange::new(-30.0, 30.0);

// Drift LFO destinations
pub const BOUNCE_MOD_RATE: ModRange = ModRange::new(0.1, 5.1);
pub const ROOT_GAIN: ModRange = ModRange::new(0.0, 2.0 / 3.0);
pub const ROOT_SAW: ModRange = ModRange::new(0.0, 1.0);
pub const SUB_PULSE_WIDTH: ModRange = ModRange::new(0.0, 0.5);

// Pan LFO destination
pub const SPARKLE_PAN: ModRange = ModRange::new(0.0, 1.0);

/// Bounce high-pass resonance
pub const BOUNCE_Q: f32 = 5.0;

// Voice start-up settings
pub const MOVEMENT_HZ: f32 = 5.0;
pub const MOVEMENT_VIBRATO_HZ: f32 = 1.0;
pub const STRING_HZ: f32 = 294.0;
pub const STRING_VIBRATO_HZ: f32 = 5.0;
pub const SUB_BASS_HZ: f32 = 82.41;
pub const SUB_BASS_VIBRATO_HZ: f32 = 1.0;
pub const SPARKLE_HZ: f32 = 440.0;
pub const BOUNCE_LEFT_MOD_HZ: f32 = 5.0;
pub const BOUNCE_RIGHT_MOD_HZ: f32 = 3.0;

// Mix levels
pub const OCTAVE_LEVEL: f32 = 0.9;
pub const SUB_LEVEL: f32 = 0.3;
pub const BOUNCE_LEVEL: f32 = 0.4;
pub const SPARKLE_LEVEL: f32 = 0.1;

/// Terminal reverb
pub const REVERB: ReverbParameters = ReverbParameters {
    room_size: 0.9,
    damping: 0.5,
    wet_level: 0.05,
    dry_level: 0.5,
    width: 1.0,
    freeze: false,
};

const CHORD_HOLD: f32 = 6.4;
const BOUNCE_PALETTE: [f32; 5] = [261.63, 329.63, 392.0, 0.0, 0.0];

/// Built-in palette and timing for a sequence
pub fn default_sequence(sequence: Sequence) -> SequenceConfig {
    use SelectionMode::{Random, Sequential};

    let (frequencies, hold, mode): (&[f32], f32, SelectionMode) = match sequence {
        // Fmaj7, Dm7, Am7, Em7
        Sequence::ChordRoot => (&[349.23, 293.66, 220.0, 329.63], CHORD_HOLD, Sequential),
        Sequence::ChordThird => (&[440.0, 349.23, 261.63, 392.0], CHORD_HOLD, Sequential),
        Sequence::ChordFifth => (&[261.63, 440.0, 329.63, 246.94], CHORD_HOLD, Sequential),
        Sequence::ChordSeventh => (&[329.63, 261.63, 392.0, 293.66], CHORD_HOLD, Sequential),
        Sequence::BounceLeft => (&BOUNCE_PALETTE, 6.4, Random),
        Sequence::BounceRight => (&BOUNCE_PALETTE, 3.2, Random),
        Sequence::Motif => (
            &[261.63, 261.63, 261.63, 0.0, 392.0, 349.23, 329.63, 0.0],
            0.8,
            Sequential,
        ),
        Sequence::Sparkle => (&[1046.52, 1568.0, 0.0, 0.0, 0.0, 0.0, 0.0], 0.4, Random),
    };

    SequenceConfig {
        frequencies: frequencies.to_vec(),
        hold,
        mode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chords_share_timing() {
        for sequence in &Sequence::ALL[..4] {
            let config = default_sequence(*sequence);
            assert_eq!(config.frequencies.len(), 4);
            assert_eq!(config.hold, CHORD_HOLD);
            assert_eq!(config.mode, SelectionMode::Sequential);
        }
    }

    #[test]
    fn test_rests_in_palettes() {
        let motif = default_sequence(Sequence::Motif);
        assert_eq!(motif.frequencies.iter().filter(|&&f| f == 0.0).count(), 2);

        let sparkle = default_sequence(Sequence::Sparkle);
        assert_eq!(sparkle.frequencies.iter().filter(|&&f| f == 0.0).count(), 5);
    }

    #[test]
    fn test_sub_detune_truncates() {
        assert_eq!(SUB_DETUNE_CENTS.map(-1.0) as i32, -30);
        assert_eq!(SUB_DETUNE_CENTS.map(1.0) as i32, 30);
        assert_eq!(SUB_DETUNE_CENTS.map(0.05) as i32, 1);
        assert_eq!(SUB_DETUNE_CENTS.map(-0.05) as i32, -1);
    }
}
