//! Timed frequency sequencer
//!
//! Holds a frequency for a configured time, then switches to another one
//! from its palette, either in order or at random. A palette entry of 0 Hz
//! is a rest; the selector does not treat it specially.

use log::warn;
use serde::{Deserialize, Serialize};

use super::oscillator::DEFAULT_SAMPLE_RATE;

/// How the next frequency is picked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Uniform draw over the palette, repeats allowed
    #[default]
    Random,
    /// Palette order, wrapping at the end
    Sequential,
}

/// Selector configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorParameters {
    /// Sample rate in Hz
    pub sample_rate: f32,
    /// Candidate frequencies
    pub frequencies: Vec<f32>,
    /// Seconds to hold each frequency
    pub hold: f32,
    pub mode: SelectionMode,
}

impl Default for SelectorParameters {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            frequencies: vec![440.0],
            hold: 1.0,
            mode: SelectionMode::Random,
        }
    }
}

/// Draw a seed from the operating system
pub fn entropy_seed() -> u64 {
    let mut bytes = [0u8; 8];
    match getrandom::getrandom(&mut bytes) {
        Ok(()) => u64::from_le_bytes(bytes),
        Err(e) => {
            warn!("no OS entropy ({}), using a fixed selector seed", e);
            0x9e37_79b9_7f4a_7c15
        }
    }
}

/// Timed frequency selector
#[derive(Debug, Clone)]
pub struct FrequencySelector {
    parameters: SelectorParameters,
    hold_samples: u64,
    samples_played: u64,
    current_frequency: f32,
    sequence_index: usize,
    rng: oorandom::Rand32,
}

impl FrequencySelector {
    /// Create a selector with default parameters and the given RNG seed
    pub fn new(seed: u64) -> Self {
        let mut selector = Self {
            parameters: SelectorParameters::default(),
            hold_samples: 0,
            samples_played: 0,
            current_frequency: 440.0,
            sequence_index: 0,
            rng: oorandom::Rand32::new(seed),
        };
        selector.set_parameters(SelectorParameters::default());
        selector
    }

    /// Current parameters
    pub fn parameters(&self) -> &SelectorParameters {
        &self.parameters
    }

    /// Replace the parameters.
    ///
    /// Recomputes the hold length, restarts the countdown and the sequence,
    /// and selects a frequency straight away. A negative or non-finite hold
    /// is treated as zero, which switches on every sample.
    pub fn set_parameters(&mut self, parameters: SelectorParameters) {
        if parameters.frequencies.is_empty() {
            warn!("frequency selector configured with an empty palette, holding {} Hz", self.current_frequency);
        }
        let hold_samples = parameters.sample_rate * parameters.hold;
        // `as` saturates: negatives and NaN become 0
        self.hold_samples = hold_samples as u64;
        self.parameters = parameters;
        self.sequence_index = 0;
        self.samples_played = 0;
        self.select_next();
    }

    /// Change only the sample rate, keeping palette, hold and mode
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        let mut parameters = self.parameters.clone();
        parameters.sample_rate = sample_rate;
        self.set_parameters(parameters);
    }

    /// Reseed the random draw
    pub fn reseed(&mut self, seed: u64) {
        self.rng = oorandom::Rand32::new(seed);
    }

    /// Hold length in samples
    pub fn hold_samples(&self) -> u64 {
        self.hold_samples
    }

    /// The frequency currently held
    pub fn current_frequency(&self) -> f32 {
        self.current_frequency
    }

    /// Advance one sample and return the held frequency
    #[inline]
    pub fn process(&mut self) -> f32 {
        self.samples_played = self.samples_played.saturating_add(1);
        if self.samples_played >= self.hold_samples {
            self.select_next();
        }
        self.current_frequency
    }

    fn select_next(&mut self) {
        let frequencies = &self.parameters.frequencies;
        if frequencies.is_empty() {
            return;
        }

        self.current_frequency = match self.parameters.mode {
            SelectionMode::Random => {
                let index = self.rng.rand_range(0..frequencies.len() as u32) as usize;
                frequencies[index]
            }
            SelectionMode::Sequential => {
                let frequency = frequencies[self.sequence_index % frequencies.len()];
                self.sequence_index = (self.sequence_index + 1) % frequencies.len();
                frequency
            }
        };
        self.samples_played = 0;
    }
}

impl Default for FrequencySelector {
    fn default() -> Self {
        Self::new(entropy_seed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: f32 = 220.0;
    const B: f32 = 330.0;
    const C: f32 = 440.0;

    fn sequential(frequencies: Vec<f32>, hold: f32) -> SelectorParameters {
        SelectorParameters {
            sample_rate: 44100.0,
            frequencies,
            hold,
            mode: SelectionMode::Sequential,
        }
    }

    #[test]
    fn test_selects_immediately() {
        let mut selector = FrequencySelector::new(1);
        selector.set_parameters(sequential(vec![A, B, C], 1.0));
        assert_eq!(selector.current_frequency(), A);
        assert_eq!(selector.hold_samples(), 44100);
    }

    #[test]
    fn test_hold_duration_law() {
        let mut selector = FrequencySelector::new(1);
        selector.set_parameters(sequential(vec![A, B], 1.0));

        let mut changes = Vec::new();
        let mut last = selector.current_frequency();
        for call in 1..=(44100 * 4) {
            let f = selector.process();
            if f != last {
                changes.push(call);
                last = f;
            }
        }
        assert_eq!(changes, vec![44100, 88200, 132300, 176400]);
    }

    #[test]
    fn test_sequential_cycles() {
        let mut selector = FrequencySelector::new(1);
        selector.set_parameters(sequential(vec![A, B, C], 0.0001));
        let hold = selector.hold_samples() as usize;
        assert_eq!(hold, 4);

        // The selection made by set_parameters is the first switch
        let mut picks = vec![selector.current_frequency()];
        for _ in 0..6 {
            let mut f = 0.0;
            for _ in 0..hold {
                f = selector.process();
            }
            picks.push(f);
        }
        assert_eq!(picks, vec![A, B, C, A, B, C, A]);
    }

    #[test]
    fn test_zero_hold_switches_every_sample() {
        let mut selector = FrequencySelector::new(1);
        selector.set_parameters(sequential(vec![A, B], -3.0));
        assert_eq!(selector.hold_samples(), 0);
        assert_eq!(selector.process(), B);
        assert_eq!(selector.process(), A);
    }

    #[test]
    fn test_random_stays_in_palette() {
        let palette = vec![261.63, 329.63, 392.0, 0.0, 0.0];
        let mut selector = FrequencySelector::new(42);
        selector.set_parameters(SelectorParameters {
            sample_rate: 1000.0,
            frequencies: palette.clone(),
            hold: 0.002,
            mode: SelectionMode::Random,
        });

        let mut seen = std::collections::HashSet::new();
        for _ in 0..10000 {
            let f = selector.process();
            assert!(palette.contains(&f), "unexpected {}", f);
            seen.insert(f.to_bits());
        }
        // Every distinct value turns up eventually
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_random_is_reproducible_with_seed() {
        let params = SelectorParameters {
            sample_rate: 100.0,
            frequencies: vec![A, B, C],
            hold: 0.01,
            mode: SelectionMode::Random,
        };
        let mut a = FrequencySelector::new(7);
        let mut b = FrequencySelector::new(7);
        a.set_parameters(params.clone());
        b.set_parameters(params);
        for _ in 0..500 {
            assert_eq!(a.process(), b.process());
        }
    }

    #[test]
    fn test_set_parameters_idempotent() {
        let params = sequential(vec![A, B, C], 0.001);

        let mut once = FrequencySelector::new(1);
        once.set_parameters(params.clone());

        let mut twice = FrequencySelector::new(1);
        twice.set_parameters(params.clone());
        for _ in 0..123 {
            twice.process();
        }
        twice.set_parameters(params.clone());
        twice.set_parameters(params);

        for _ in 0..1000 {
            assert_eq!(once.process(), twice.process());
        }
    }

    #[test]
    fn test_empty_palette_holds_previous() {
        let mut selector = FrequencySelector::new(1);
        selector.set_parameters(sequential(vec![B], 0.0));
        assert_eq!(selector.current_frequency(), B);

        selector.set_parameters(sequential(vec![], 0.0));
        for _ in 0..100_000 {
            assert_eq!(selector.process(), B);
        }
    }

    #[test]
    fn test_rest_is_a_plain_value() {
        let mut selector = FrequencySelector::new(1);
        selector.set_parameters(sequential(vec![0.0], 1.0));
        assert_eq!(selector.current_frequency(), 0.0);
        assert_eq!(selector.process(), 0.0);
    }

    #[test]
    fn test_sample_rate_change_restarts() {
        let mut selector = FrequencySelector::new(1);
        selector.set_parameters(sequential(vec![A, B, C], 1.0));
        for _ in 0..44100 {
            selector.process();
        }
        assert_eq!(selector.current_frequency(), B);

        selector.set_sample_rate(48000.0);
        assert_eq!(selector.hold_samples(), 48000);
        assert_eq!(selector.current_frequency(), A);
    }
}
