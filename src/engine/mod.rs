//! Audio engine for Nimbus
//!
//! The [`Engine`] owns every voice, sequence and modulator and renders
//! stereo blocks. Call [`Engine::prepare`] whenever the sample rate or
//! block size changes, then [`Engine::render_block`] from the audio thread.

mod patch;
mod player;
mod recorder;

pub use patch::default_sequence;
pub use player::{default_device_name, list_output_devices, Player};
pub use recorder::Recorder;

use log::{debug, warn};

use crate::config::{NimbusConfig, Sequence};
use crate::synth::{
    entropy_seed, Filter, FilterKind, FrequencySelector, LinearRamp, Lfo, PatchVoice, Reverb,
    SelectorParameters, VoicePatch, DEFAULT_SAMPLE_RATE,
};

/// Spacing between the per-sequence seeds
const SEED_STRIDE: u64 = 0x9e37_79b9_7f4a_7c15;

/// The generative synth
pub struct Engine {
    config: NimbusConfig,
    sample_rate: f32,
    max_block_size: usize,

    // Modulators
    slow: Lfo,
    drift: Lfo,
    pan: Lfo,

    // Voices
    movement: PatchVoice,
    chords: [PatchVoice; 4],
    bounce_left: PatchVoice,
    bounce_right: PatchVoice,
    bounce_filters: [Filter; 2],
    sparkle: PatchVoice,
    motif: PatchVoice,
    octave: PatchVoice,
    root: PatchVoice,
    sub_bass: PatchVoice,

    selectors: [FrequencySelector; Sequence::COUNT],
    volume: LinearRamp,
    reverb: Reverb,

    // Interleaving buffers, sized by prepare
    scratch_left: Vec<f32>,
    scratch_right: Vec<f32>,
}

impl Engine {
    /// Create an engine and prepare it with the configured audio settings
    pub fn new(config: NimbusConfig) -> Self {
        let seed = config.modulation.seed.unwrap_or_else(entropy_seed);
        let selectors = std::array::from_fn(|i| {
            FrequencySelector::new(seed.wrapping_add(SEED_STRIDE.wrapping_mul(i as u64)))
        });

        let mut drift = PatchVoice::new(VoicePatch::pad());
        drift.set_mod_rate(0.0);

        let bounce_filter = || Filter::new(FilterKind::HighPass, 1000.0, patch::BOUNCE_Q);
        let sample_rate = config.audio.sample_rate as f32;
        let max_block_size = config.audio.buffer_size;

        let mut engine = Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            max_block_size: 0,
            slow: Lfo::sine(patch::SLOW_LFO_HZ, DEFAULT_SAMPLE_RATE),
            drift: Lfo::voice(drift),
            pan: Lfo::sine(patch::PAN_LFO_HZ, DEFAULT_SAMPLE_RATE),
            movement: PatchVoice::new(VoicePatch::movement()),
            chords: std::array::from_fn(|_| PatchVoice::new(VoicePatch::pad())),
            bounce_left: PatchVoice::new(VoicePatch::pad()),
            bounce_right: PatchVoice::new(VoicePatch::pad()),
            bounce_filters: [bounce_filter(), bounce_filter()],
            sparkle: PatchVoice::new(VoicePatch::pad()),
            motif: PatchVoice::new(VoicePatch::string()),
            octave: PatchVoice::new(VoicePatch::string()),
            root: PatchVoice::new(VoicePatch::string()),
            sub_bass: PatchVoice::new(VoicePatch::sub_bass()),
            selectors,
            volume: LinearRamp::new(0.0),
            reverb: Reverb::new(patch::REVERB),
            scratch_left: Vec::new(),
            scratch_right: Vec::new(),
            config,
        };
        engine.drift.set_frequency(patch::DRIFT_LFO_HZ);
        engine.prepare(sample_rate, max_block_size);
        engine
    }

    /// Get the sample rate
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Largest block rendered internally by [`Engine::fill_interleaved`]
    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// The configuration the engine was built from
    pub fn config(&self) -> &NimbusConfig {
        &self.config
    }

    /// A sequence's selector
    pub fn selector(&self, sequence: Sequence) -> &FrequencySelector {
        &self.selectors[sequence as usize]
    }

    /// Set up for playback.
    ///
    /// Propagates the sample rate to everything the engine owns, reseeds
    /// every sequence from its palette and restarts the fade-in. An invalid
    /// sample rate is ignored and the previous one kept.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize) {
        if sample_rate.is_finite() && sample_rate > 0.0 {
            self.sample_rate = sample_rate;
        } else {
            warn!(
                "ignoring invalid sample rate {}, keeping {} Hz",
                sample_rate, self.sample_rate
            );
        }
        let sample_rate = self.sample_rate;

        self.max_block_size = max_block_size.max(1);
        self.scratch_left.resize(self.max_block_size, 0.0);
        self.scratch_right.resize(self.max_block_size, 0.0);

        let draw = self.config.modulation.draw;
        for lfo in [&mut self.slow, &mut self.drift, &mut self.pan] {
            lfo.set_sample_rate(sample_rate);
            lfo.set_draw(draw);
        }

        let history = self.config.modulation.filter_history;
        for voice in self.voices_mut() {
            voice.set_filter_history(history);
            voice.set_sample_rate(sample_rate);
        }
        for filter in &mut self.bounce_filters {
            filter.set_sample_rate(sample_rate);
        }

        self.movement.set_frequency(patch::MOVEMENT_HZ);
        self.movement.set_mod_rate(patch::MOVEMENT_VIBRATO_HZ);
        for string in [&mut self.motif, &mut self.octave, &mut self.root] {
            string.set_frequency(patch::STRING_HZ);
            string.set_mod_rate(patch::STRING_VIBRATO_HZ);
        }
        self.root.set_mod_rate(0.0);
        self.sub_bass.set_frequency(patch::SUB_BASS_HZ);
        self.sub_bass.set_mod_rate(patch::SUB_BASS_VIBRATO_HZ);
        self.sparkle.set_frequency(patch::SPARKLE_HZ);
        self.sparkle.set_mod_rate(0.0);
        self.bounce_left.set_mod_rate(patch::BOUNCE_LEFT_MOD_HZ);
        self.bounce_right.set_mod_rate(patch::BOUNCE_RIGHT_MOD_HZ);

        for (selector, sequence) in self.selectors.iter_mut().zip(Sequence::ALL) {
            let config = self
                .config
                .sequences
                .get(&sequence)
                .cloned()
                .unwrap_or_else(|| patch::default_sequence(sequence));
            selector.set_parameters(SelectorParameters {
                sample_rate,
                frequencies: config.frequencies,
                hold: config.hold,
                mode: config.mode,
            });
        }

        self.reverb.set_sample_rate(sample_rate);
        self.reverb.set_parameters(patch::REVERB);
        self.reverb.reset();

        self.volume.reset(sample_rate, self.config.master.fade_in);
        self.volume.set_current_and_target(0.0);
        self.volume.set_target(self.config.master.volume);

        debug!(
            "engine prepared: {} Hz, blocks of up to {} frames, {:?} LFO draw, {:?} filter history",
            sample_rate, self.max_block_size, draw, history
        );
    }

    /// Render a stereo block in place.
    ///
    /// Renders as many frames as the shorter buffer holds, then runs the
    /// reverb over the whole block.
    pub fn render_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len().min(right.len());
        let (left, right) = (&mut left[..frames], &mut right[..frames]);

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            (*l, *r) = self.render_frame();
        }

        self.reverb.process(left, right);
    }

    /// Render into an interleaved device buffer.
    ///
    /// The first two channels carry left and right, a mono device gets
    /// their average and any further channels are silent.
    pub fn fill_interleaved(&mut self, data: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let mut left = std::mem::take(&mut self.scratch_left);
        let mut right = std::mem::take(&mut self.scratch_right);
        let block = left.len().max(1);

        for chunk in data.chunks_mut(block * channels) {
            let frames = chunk.len() / channels;
            if left.len() < frames {
                break;
            }
            self.render_block(&mut left[..frames], &mut right[..frames]);

            for ((frame, &l), &r) in chunk.chunks_mut(channels).zip(&left).zip(&right) {
                match frame {
                    [mono] => *mono = (l + r) * 0.5,
                    [first, second, rest @ ..] => {
                        *first = l;
                        *second = r;
                        rest.fill(0.0);
                    }
                    [] => {}
                }
            }
        }

        self.scratch_left = left;
        self.scratch_right = right;
    }

    fn voices_mut(&mut self) -> impl Iterator<Item = &mut PatchVoice> {
        [
            &mut self.movement,
            &mut self.bounce_left,
            &mut self.bounce_right,
            &mut self.sparkle,
            &mut self.motif,
            &mut self.octave,
            &mut self.root,
            &mut self.sub_bass,
        ]
        .into_iter()
        .chain(self.chords.iter_mut())
    }

    fn next_frequency(&mut self, sequence: Sequence) -> f32 {
        self.selectors[sequence as usize].process()
    }

    /// One stereo frame before the reverb
    #[inline]
    fn render_frame(&mut self) -> (f32, f32) {
        self.slow.begin_frame();
        self.drift.begin_frame();
        self.pan.begin_frame();

        // Amplitude movement shared by the bounce and sub-bass
        let vibrato = self.slow.draw_in(patch::MOVEMENT_VIBRATO_DEPTH);
        self.movement.set_mod_depth(vibrato);
        let movement = self.movement.process();

        let pan_left = self.pan.draw_in(patch::SPARKLE_PAN);
        let pan_right = 1.0 - pan_left;

        // Chords
        let mut chord_frequencies = [0.0; 4];
        for (frequency, sequence) in chord_frequencies.iter_mut().zip(&Sequence::ALL[..4]) {
            *frequency = self.next_frequency(*sequence);
        }
        let cutoff = self.slow.draw_in(patch::CHORD_CUTOFF);
        let mod_rate = self.slow.draw_in(patch::CHORD_MOD_RATE);
        let mod_depth = self.slow.draw_in(patch::CHORD_MOD_DEPTH);
        let mut chords = 0.0;
        for (voice, &frequency) in self.chords.iter_mut().zip(&chord_frequencies) {
            voice.set_frequency(frequency);
            voice.set_filter_cutoff(cutoff);
            voice.set_mod_rate(mod_rate);
            voice.set_mod_depth(mod_depth);
            chords += voice.process();
        }
        let chords = chords / 4.0;

        // Bounce
        let bounce_cutoff = self.slow.draw_in(patch::BOUNCE_CUTOFF);
        for filter in &mut self.bounce_filters {
            filter.set_cutoff(bounce_cutoff);
        }
        let frequency = self.next_frequency(Sequence::BounceLeft);
        self.bounce_left.set_frequency(frequency);
        let frequency = self.next_frequency(Sequence::BounceRight);
        self.bounce_right.set_frequency(frequency);
        let bounce_rate = self.drift.draw_in(patch::BOUNCE_MOD_RATE);
        self.bounce_left.set_mod_rate(bounce_rate);
        self.bounce_right.set_mod_rate(bounce_rate);
        let [filter_left, filter_right] = &mut self.bounce_filters;
        let bounce_left = filter_left.process(self.bounce_left.process()) * movement;
        let bounce_right = filter_right.process(self.bounce_right.process()) * movement;

        // Sparkle
        let frequency = self.next_frequency(Sequence::Sparkle);
        self.sparkle.set_frequency(frequency);
        let sparkle = self.sparkle.process() * patch::SPARKLE_LEVEL;
        let sparkle_left = sparkle * pan_left;
        let sparkle_right = sparkle * pan_right;

        // Root string an octave under the chord root
        self.root.set_frequency(chord_frequencies[0] / 2.0);
        let root_gain = self.drift.draw_in(patch::ROOT_GAIN);
        let root_saw = self.drift.draw_in(patch::ROOT_SAW);
        self.root.set_saw_amount(root_saw);
        let root = self.root.process() * root_gain;

        // Motif strings
        let frequency = self.next_frequency(Sequence::Motif);
        let octave_saw = self.slow.draw_in(patch::OCTAVE_SAW);
        self.motif.set_frequency(frequency);
        self.octave.set_frequency(frequency * 2.0);
        self.octave.set_saw_amount(octave_saw);
        let strings = (self.motif.process() + self.octave.process() * patch::OCTAVE_LEVEL) / 2.0;

        // Sub-bass
        let pulse_width = self.drift.draw_in(patch::SUB_PULSE_WIDTH);
        let square = self.slow.draw_in(patch::SUB_SQUARE);
        let cents = self.slow.draw_in(patch::SUB_DETUNE_CENTS) as i32;
        self.sub_bass.set_pulse_width(pulse_width);
        self.sub_bass.set_square_amount(square);
        self.sub_bass.set_detune_fine(cents);
        let sub = self.sub_bass.process() * (movement * 0.5 + 0.5);

        let core = (chords + strings + sub * patch::SUB_LEVEL + root) / 2.0;

        let left = (core + bounce_left * patch::BOUNCE_LEVEL + sparkle_left) * self.volume.next_value();
        let right =
            (core + bounce_right * patch::BOUNCE_LEVEL + sparkle_right) * self.volume.next_value();
        (left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SequenceConfig;
    use crate::synth::{FilterHistory, LfoDraw, ModRange, SelectionMode};

    fn test_config(seed: u64) -> NimbusConfig {
        let mut config = NimbusConfig::default();
        config.modulation.seed = Some(seed);
        config
    }

    fn render(engine: &mut Engine, blocks: usize) -> (Vec<f32>, Vec<f32>) {
        let mut left = Vec::new();
        let mut right = Vec::new();
        let mut block_left = vec![0.0; 512];
        let mut block_right = vec![0.0; 512];
        for _ in 0..blocks {
            engine.render_block(&mut block_left, &mut block_right);
            left.extend_from_slice(&block_left);
            right.extend_from_slice(&block_right);
        }
        (left, right)
    }

    #[test]
    fn test_engine_creation() {
        let engine = Engine::new(test_config(1));
        assert_eq!(engine.sample_rate(), 44100.0);
        assert_eq!(engine.max_block_size(), 512);
        assert_eq!(engine.selector(Sequence::ChordRoot).current_frequency(), 349.23);
        assert_eq!(engine.selector(Sequence::Motif).hold_samples(), 35280);
    }

    #[test]
    fn test_prepare_propagates_sample_rate() {
        let mut engine = Engine::new(test_config(1));
        engine.prepare(48000.0, 256);
        assert_eq!(engine.sample_rate(), 48000.0);
        assert_eq!(engine.max_block_size(), 256);
        assert_eq!(engine.selector(Sequence::ChordRoot).hold_samples(), 307200);
        assert_eq!(engine.selector(Sequence::Sparkle).hold_samples(), 19200);
        assert_eq!(engine.reverb.sample_rate(), 48000.0);
        assert!(engine.voices_mut().all(|v| v.sample_rate() == 48000.0));
    }

    #[test]
    fn test_invalid_sample_rate_is_ignored() {
        let mut engine = Engine::new(test_config(3));
        engine.prepare(0.0, 512);
        assert_eq!(engine.sample_rate(), 44100.0);
        engine.prepare(f32::NAN, 512);
        assert_eq!(engine.sample_rate(), 44100.0);

        let (left, _) = render(&mut engine, 4);
        assert!(left.iter().all(|s| s.is_finite()));
    }

    /// Config with one fixed note per sequence and no fade
    fn fixed_config(notes: [f32; Sequence::COUNT]) -> NimbusConfig {
        let mut config = test_config(9);
        config.master.fade_in = 0.0;
        for (sequence, note) in Sequence::ALL.into_iter().zip(notes) {
            config.sequences.insert(
                sequence,
                SequenceConfig {
                    frequencies: vec![note],
                    hold: 1.0,
                    mode: SelectionMode::Sequential,
                },
            );
        }
        config
    }

    #[test]
    fn test_tiny_sample_rate_does_not_panic() {
        let mut engine = Engine::new(test_config(3));
        engine.prepare(40.0, 64);
        assert_eq!(engine.sample_rate(), 40.0);

        let mut left = vec![0.0; 64];
        let mut right = vec![0.0; 64];
        engine.render_block(&mut left, &mut right);
        assert!(left.iter().chain(&right).all(|s| s.is_finite()));
    }

    #[test]
    fn test_frame_matches_hand_mix() {
        let sr = 44100.0;
        let mut engine = Engine::new(fixed_config([
            300.0, 400.0, 500.0, 600.0, 350.0, 450.0, 250.0, 1000.0,
        ]));

        let voice = |patch: VoicePatch, frequency: f32, mod_rate: f32| {
            let mut v = PatchVoice::new(patch);
            v.set_sample_rate(sr);
            v.set_frequency(frequency);
            v.set_mod_rate(mod_rate);
            v
        };
        let mut slow = Lfo::sine(0.05, sr);
        let mut drift = Lfo::voice(voice(VoicePatch::pad(), 0.1, 0.0));
        let mut pan = Lfo::sine(1.0, sr);
        let mut movement = voice(VoicePatch::movement(), 5.0, 1.0);
        let mut chords = [300.0, 400.0, 500.0, 600.0].map(|f| voice(VoicePatch::pad(), f, 5.0));
        let mut bounce_left = voice(VoicePatch::pad(), 350.0, 5.0);
        let mut bounce_right = voice(VoicePatch::pad(), 450.0, 3.0);
        let mut high_left = Filter::new(FilterKind::HighPass, 1000.0, 5.0);
        let mut high_right = Filter::new(FilterKind::HighPass, 1000.0, 5.0);
        let mut sparkle = voice(VoicePatch::pad(), 1000.0, 0.0);
        let mut motif = voice(VoicePatch::string(), 250.0, 5.0);
        let mut octave = voice(VoicePatch::string(), 500.0, 5.0);
        let mut root = voice(VoicePatch::string(), 150.0, 0.0);
        let mut sub = voice(VoicePatch::sub_bass(), 82.41, 1.0);

        for frame in 0..256 {
            let vibrato = slow.draw_in(ModRange::new(0.005, 0.03));
            movement.set_mod_depth(vibrato);
            let mv = movement.process();
            let pan_left = pan.draw_in(ModRange::new(0.0, 1.0));

            let cutoff = slow.draw_in(ModRange::new(1000.0, 9000.0));
            let rate = slow.draw_in(ModRange::new(0.1, 6.1));
            let depth = slow.draw_in(ModRange::new(0.0, 0.25));
            let mut chord_sum = 0.0;
            for pad in &mut chords {
                pad.set_filter_cutoff(cutoff);
                pad.set_mod_rate(rate);
                pad.set_mod_depth(depth);
                chord_sum += pad.process();
            }

            let high_cutoff = slow.draw_in(ModRange::new(1000.0, 3000.0));
            high_left.set_cutoff(high_cutoff);
            high_right.set_cutoff(high_cutoff);
            let bounce_rate = drift.draw_in(ModRange::new(0.1, 5.1));
            bounce_left.set_mod_rate(bounce_rate);
            bounce_right.set_mod_rate(bounce_rate);
            let bl = high_left.process(bounce_left.process()) * mv;
            let br = high_right.process(bounce_right.process()) * mv;

            let sp = sparkle.process();

            let root_gain = drift.draw_in(ModRange::new(0.0, 2.0 / 3.0));
            root.set_saw_amount(drift.draw_in(ModRange::new(0.0, 1.0)));
            let rt = root.process() * root_gain;

            octave.set_saw_amount(slow.draw_in(ModRange::new(0.5, 1.0)));
            let strings = (motif.process() + 0.9 * octave.process()) / 2.0;

            sub.set_pulse_width(drift.draw_in(ModRange::new(0.0, 0.5)));
            sub.set_square_amount(slow.draw_in(ModRange::new(0.25, 0.75)));
            sub.set_detune_fine(slow.draw_in(ModRange::new(-30.0, 30.0)) as i32);
            let bass = sub.process() * (0.5 * mv + 0.5);

            let core = (chord_sum / 4.0 + strings + 0.3 * bass + rt) / 2.0;
            let expected_left = core + 0.4 * bl + 0.1 * sp * pan_left;
            let expected_right = core + 0.4 * br + 0.1 * sp * (1.0 - pan_left);

            let (left, right) = engine.render_frame();
            assert!(
                (left - expected_left).abs() < 1e-6,
                "frame {} left: {} vs {}",
                frame,
                left,
                expected_left
            );
            assert!(
                (right - expected_right).abs() < 1e-6,
                "frame {} right: {} vs {}",
                frame,
                right,
                expected_right
            );
        }
    }

    #[test]
    fn test_ramp_steps_once_per_channel() {
        let notes = [200.0, 150.0, 120.0, 180.0, 100.0, 130.0, 110.0, 240.0];
        let mut config = fixed_config(notes);
        config.audio.sample_rate = 1000;
        let mut full = Engine::new(config.clone());

        // 1000 ramp steps from 0 to 1
        config.master.fade_in = 1.0;
        let mut fading = Engine::new(config);

        for frame in 0..200 {
            let (full_left, full_right) = full.render_frame();
            let (left, right) = fading.render_frame();
            if full_left.abs() < 1e-3 || full_right.abs() < 1e-3 {
                continue;
            }
            let left_gain = left / full_left;
            let right_gain = right / full_right;
            let step = 0.001;
            assert!((left_gain - (2 * frame + 1) as f32 * step).abs() < 1e-4);
            assert!((right_gain - (2 * frame + 2) as f32 * step).abs() < 1e-4);
            // Left and right sit one step apart
            assert!((right_gain - left_gain - step).abs() < 1e-4);
        }
        // Two steps per frame: the 1000-step ramp is done after 500 frames
        for _ in 200..500 {
            fading.render_frame();
        }
        assert!(!fading.volume.is_smoothing());
        assert_eq!(fading.volume.current(), 1.0);
    }

    #[test]
    fn test_filter_history_option_reaches_chords() {
        let mut config = test_config(8);
        config.modulation.filter_history = FilterHistory::Keep;
        let mut keep = Engine::new(config);
        assert!(keep
            .chords
            .iter()
            .all(|v| v.patch().filter.map(|f| f.history) == Some(FilterHistory::Keep)));

        let mut reset = Engine::new(test_config(8));
        let (a, _) = render(&mut keep, 4);
        let (b, _) = render(&mut reset, 4);
        assert_ne!(a, b);
    }

    #[test]
    fn test_output_is_finite_and_audible() {
        let mut engine = Engine::new(test_config(7));
        // Past the fade-in: 2 s of ramp steps at two steps per frame
        let (left, right) = render(&mut engine, 260);
        assert!(left.iter().chain(&right).all(|s| s.is_finite()));

        let peak = left[88200..].iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.01, "expected audible output, peak {}", peak);
        assert!(peak < 4.0, "unexpectedly hot output, peak {}", peak);
    }

    #[test]
    fn test_fade_in_starts_silent() {
        let mut engine = Engine::new(test_config(7));
        let mut left = vec![0.0; 16];
        let mut right = vec![0.0; 16];
        engine.render_block(&mut left, &mut right);
        assert!(left.iter().chain(&right).all(|s| s.abs() < 0.01));
    }

    #[test]
    fn test_instant_fade_in() {
        let mut config = test_config(7);
        config.master.fade_in = 0.0;
        let mut engine = Engine::new(config);
        engine.render_block(&mut [0.0f32; 8], &mut [0.0f32; 8]);
        assert_eq!(engine.volume.current(), 1.0);
    }

    #[test]
    fn test_same_seed_same_output() {
        let mut a = Engine::new(test_config(42));
        let mut b = Engine::new(test_config(42));
        let (left_a, right_a) = render(&mut a, 40);
        let (left_b, right_b) = render(&mut b, 40);
        assert_eq!(left_a, left_b);
        assert_eq!(right_a, right_b);
    }

    #[test]
    fn test_instances_are_independent() {
        let mut a = Engine::new(test_config(42));
        let (reference, _) = render(&mut a, 8);

        let mut b = Engine::new(test_config(42));
        let mut other = Engine::new(test_config(99));
        let mut left = vec![0.0; 512];
        let mut right = vec![0.0; 512];
        let mut interleaved = Vec::new();
        for _ in 0..8 {
            other.render_block(&mut left, &mut right);
            b.render_block(&mut left, &mut right);
            interleaved.extend_from_slice(&left);
        }
        assert_eq!(reference, interleaved);
    }

    #[test]
    fn test_silent_palettes_stay_finite() {
        let mut config = test_config(5);
        for sequence in Sequence::ALL {
            config.sequences.insert(
                sequence,
                SequenceConfig {
                    frequencies: vec![0.0],
                    hold: 0.1,
                    mode: SelectionMode::Sequential,
                },
            );
        }
        let mut engine = Engine::new(config);
        let (left, right) = render(&mut engine, 100);
        assert!(left.iter().chain(&right).all(|s| s.is_finite()));
        for sequence in Sequence::ALL {
            assert_eq!(engine.selector(sequence).current_frequency(), 0.0);
        }
    }

    #[test]
    fn test_empty_palette_keeps_engine_running() {
        let mut config = test_config(5);
        config.sequences.insert(
            Sequence::Motif,
            SequenceConfig {
                frequencies: vec![],
                hold: 0.0,
                mode: SelectionMode::Random,
            },
        );
        let mut engine = Engine::new(config);
        let held = engine.selector(Sequence::Motif).current_frequency();
        let (left, _) = render(&mut engine, 10);
        assert!(left.iter().all(|s| s.is_finite()));
        assert_eq!(engine.selector(Sequence::Motif).current_frequency(), held);
    }

    #[test]
    fn test_per_frame_draw_changes_output() {
        let mut per_call = Engine::new(test_config(11));
        let mut config = test_config(11);
        config.modulation.draw = LfoDraw::PerFrame;
        let mut per_frame = Engine::new(config);

        let (a, _) = render(&mut per_call, 20);
        let (b, _) = render(&mut per_frame, 20);
        assert!(b.iter().all(|s| s.is_finite()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_mismatched_buffers_render_common_length() {
        let mut engine = Engine::new(test_config(2));
        engine.render_block(&mut [0.0f32; 512], &mut [0.0f32; 512]);

        let mut left = vec![9.0; 64];
        let mut right = vec![9.0; 32];
        engine.render_block(&mut left, &mut right);
        assert!(left[..32].iter().all(|&s| s != 9.0));
        assert!(left[32..].iter().all(|&s| s == 9.0));
    }

    #[test]
    fn test_fill_interleaved_layouts() {
        let mut stereo = Engine::new(test_config(4));
        let mut reference = Engine::new(test_config(4));

        // Larger than the prepared block size
        let mut data = vec![0.0; 1500 * 2];
        stereo.fill_interleaved(&mut data, 2);

        let mut left = vec![0.0; 512];
        let mut right = vec![0.0; 512];
        reference.render_block(&mut left, &mut right);
        assert_eq!(data[0], left[0]);
        assert_eq!(data[1], right[0]);
        assert_eq!(data[2 * 511 + 1], right[511]);

        let mut mono = Engine::new(test_config(4));
        let mut data = vec![0.0; 64];
        mono.fill_interleaved(&mut data, 1);
        assert!(data.iter().all(|s| s.is_finite()));

        let mut surround = Engine::new(test_config(4));
        let mut data = vec![1.0; 64 * 6];
        surround.fill_interleaved(&mut data, 6);
        assert!(data.chunks(6).all(|frame| frame[2..].iter().all(|&s| s == 0.0)));
    }
}
