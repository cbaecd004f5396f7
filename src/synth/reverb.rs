//! Stereo reverb
//!
//! Freeverb topology: eight damped comb filters in parallel feeding four
//! allpass filters in series, per channel, with the right channel's delay
//! lines spread a few samples longer than the left.

use super::oscillator::DEFAULT_SAMPLE_RATE;

/// Comb delay lengths at 44.1 kHz
const COMB_TUNINGS_44K: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];

/// Allpass delay lengths at 44.1 kHz
const ALLPASS_TUNINGS_44K: [usize; 4] = [556, 441, 341, 225];

/// Extra delay for the right channel
const STEREO_SPREAD: usize = 23;

const REFERENCE_RATE: f32 = 44100.0;
const INPUT_GAIN: f32 = 0.015;
const WET_SCALE: f32 = 3.0;
const DRY_SCALE: f32 = 2.0;
const ROOM_SCALE: f32 = 0.28;
const ROOM_OFFSET: f32 = 0.7;
const DAMP_SCALE: f32 = 0.4;

/// Scale a delay length from the reference rate
fn scale_to_rate(samples: usize, sample_rate: f32) -> usize {
    ((samples as f64 * sample_rate as f64 / REFERENCE_RATE as f64) as usize).max(1)
}

/// Reverb settings, all in 0..=1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbParameters {
    pub room_size: f32,
    pub damping: f32,
    pub wet_level: f32,
    pub dry_level: f32,
    pub width: f32,
    /// Infinite sustain, no damping
    pub freeze: bool,
}

impl Default for ReverbParameters {
    fn default() -> Self {
        Self {
            room_size: 0.5,
            damping: 0.5,
            wet_level: 0.33,
            dry_level: 0.4,
            width: 1.0,
            freeze: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Comb {
    buffer: Vec<f32>,
    index: usize,
    last: f32,
}

impl Comb {
    fn set_size(&mut self, size: usize) {
        self.buffer = vec![0.0; size];
        self.index = 0;
        self.last = 0.0;
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.last = 0.0;
    }

    #[inline]
    fn process(&mut self, input: f32, damp: f32, feedback: f32) -> f32 {
        let output = self.buffer[self.index];
        self.last = output * (1.0 - damp) + self.last * damp;
        self.buffer[self.index] = input + self.last * feedback;
        self.index += 1;
        if self.index >= self.buffer.len() {
            self.index = 0;
        }
        output
    }
}

#[derive(Debug, Clone, Default)]
struct Allpass {
    buffer: Vec<f32>,
    index: usize,
}

impl Allpass {
    fn set_size(&mut self, size: usize) {
        self.buffer = vec![0.0; size];
        self.index = 0;
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let buffered = self.buffer[self.index];
        self.buffer[self.index] = input + buffered * 0.5;
        self.index += 1;
        if self.index >= self.buffer.len() {
            self.index = 0;
        }
        buffered - input
    }
}

/// Stereo reverb processing whole blocks in place
#[derive(Debug, Clone)]
pub struct Reverb {
    parameters: ReverbParameters,
    sample_rate: f32,
    combs: [[Comb; 8]; 2],
    allpasses: [[Allpass; 4]; 2],

    // Derived gains
    damp: f32,
    feedback: f32,
    wet1: f32,
    wet2: f32,
    dry: f32,
}

impl Reverb {
    /// Create a reverb at the default sample rate
    pub fn new(parameters: ReverbParameters) -> Self {
        let mut reverb = Self {
            parameters,
            sample_rate: 0.0,
            combs: Default::default(),
            allpasses: Default::default(),
            damp: 0.0,
            feedback: 0.0,
            wet1: 0.0,
            wet2: 0.0,
            dry: 0.0,
        };
        reverb.set_sample_rate(DEFAULT_SAMPLE_RATE);
        reverb.set_parameters(parameters);
        reverb
    }

    pub fn parameters(&self) -> ReverbParameters {
        self.parameters
    }

    /// Apply new settings; values are clamped to 0..=1
    pub fn set_parameters(&mut self, parameters: ReverbParameters) {
        let clamp = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        let p = ReverbParameters {
            room_size: clamp(parameters.room_size),
            damping: clamp(parameters.damping),
            wet_level: clamp(parameters.wet_level),
            dry_level: clamp(parameters.dry_level),
            width: clamp(parameters.width),
            freeze: parameters.freeze,
        };
        self.parameters = p;

        let wet = p.wet_level * WET_SCALE;
        self.dry = p.dry_level * DRY_SCALE;
        self.wet1 = 0.5 * wet * (1.0 + p.width);
        self.wet2 = 0.5 * wet * (1.0 - p.width);

        if p.freeze {
            self.damp = 0.0;
            self.feedback = 1.0;
        } else {
            self.damp = p.damping * DAMP_SCALE;
            self.feedback = p.room_size * ROOM_SCALE + ROOM_OFFSET;
        }
    }

    /// Resize the delay lines for a new sample rate. This allocates and
    /// clears the tail. Non-positive or non-finite rates are ignored.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        if !(sample_rate.is_finite() && sample_rate > 0.0) || sample_rate == self.sample_rate {
            return;
        }
        self.sample_rate = sample_rate;
        for (channel, spread) in [0, STEREO_SPREAD].into_iter().enumerate() {
            for (comb, tuning) in self.combs[channel].iter_mut().zip(COMB_TUNINGS_44K) {
                comb.set_size(scale_to_rate(tuning + spread, sample_rate));
            }
            for (allpass, tuning) in self.allpasses[channel].iter_mut().zip(ALLPASS_TUNINGS_44K) {
                allpass.set_size(scale_to_rate(tuning + spread, sample_rate));
            }
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Clear the reverb tail
    pub fn reset(&mut self) {
        self.combs.iter_mut().flatten().for_each(Comb::clear);
        self.allpasses.iter_mut().flatten().for_each(Allpass::clear);
    }

    /// Process a stereo block in place. Only the common length of the two
    /// channels is processed.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let [combs_l, combs_r] = &mut self.combs;
        let [allpasses_l, allpasses_r] = &mut self.allpasses;

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let input = (*l + *r) * INPUT_GAIN;

            let mut out_l = 0.0;
            let mut out_r = 0.0;
            for (comb_l, comb_r) in combs_l.iter_mut().zip(combs_r.iter_mut()) {
                out_l += comb_l.process(input, self.damp, self.feedback);
                out_r += comb_r.process(input, self.damp, self.feedback);
            }
            for (allpass_l, allpass_r) in allpasses_l.iter_mut().zip(allpasses_r.iter_mut()) {
                out_l = allpass_l.process(out_l);
                out_r = allpass_r.process(out_r);
            }

            *l = out_l * self.wet1 + out_r * self.wet2 + *l * self.dry;
            *r = out_r * self.wet1 + out_l * self.wet2 + *r * self.dry;
        }
    }
}

impl Default for Reverb {
    fn default() -> Self {
        Self::new(ReverbParameters::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ambient() -> ReverbParameters {
        ReverbParameters {
            room_size: 0.9,
            damping: 0.5,
            wet_level: 0.05,
            dry_level: 0.5,
            width: 1.0,
            freeze: false,
        }
    }

    #[test]
    fn test_dry_path_gain() {
        let mut reverb = Reverb::new(ReverbParameters {
            wet_level: 0.0,
            dry_level: 0.5,
            ..ambient()
        });
        let mut left = vec![0.3; 64];
        let mut right = vec![-0.2; 64];
        reverb.process(&mut left, &mut right);
        // dry 0.5 scales to unity
        assert!(left.iter().all(|&s| (s - 0.3).abs() < 1e-6));
        assert!(right.iter().all(|&s| (s + 0.2).abs() < 1e-6));
    }

    #[test]
    fn test_impulse_leaves_a_tail() {
        let mut reverb = Reverb::new(ambient());
        let mut left = vec![0.0; 8192];
        let mut right = vec![0.0; 8192];
        left[0] = 1.0;
        right[0] = 1.0;
        reverb.process(&mut left, &mut right);

        let tail: f32 = left[2000..].iter().map(|s| s.abs()).sum();
        assert!(tail > 0.0, "expected a reverb tail");
        assert!(left.iter().chain(right.iter()).all(|s| s.is_finite()));
    }

    #[test]
    fn test_tail_decays() {
        let mut reverb = Reverb::new(ambient());
        let mut left = vec![0.0; 512];
        let mut right = vec![0.0; 512];
        left[0] = 1.0;
        reverb.process(&mut left, &mut right);

        let mut energy_at = Vec::new();
        for _ in 0..400 {
            left.fill(0.0);
            right.fill(0.0);
            reverb.process(&mut left, &mut right);
            energy_at.push(left.iter().map(|s| s * s).sum::<f32>());
        }
        assert!(energy_at[399] < energy_at[10]);
    }

    #[test]
    fn test_stereo_spread() {
        let mut reverb = Reverb::new(ambient());
        let mut left = vec![0.0; 4096];
        let mut right = vec![0.0; 4096];
        left[0] = 1.0;
        reverb.process(&mut left, &mut right);
        assert!(left[1..].iter().zip(&right[1..]).any(|(l, r)| (l - r).abs() > 1e-9));
    }

    #[test]
    fn test_sample_rate_resizes() {
        let mut reverb = Reverb::new(ambient());
        reverb.set_sample_rate(88200.0);
        assert_eq!(reverb.sample_rate(), 88200.0);
        assert_eq!(reverb.combs[0][0].buffer.len(), 2232);
        assert_eq!(reverb.combs[1][0].buffer.len(), 2278);
        reverb.set_sample_rate(-1.0);
        assert_eq!(reverb.sample_rate(), 88200.0);
    }

    #[test]
    fn test_mismatched_lengths() {
        let mut reverb = Reverb::new(ambient());
        let mut left = vec![0.5; 10];
        let mut right = vec![0.5; 4];
        reverb.process(&mut left, &mut right);
        assert_eq!(left[9], 0.5);
    }

    #[test]
    fn test_parameters_are_clamped() {
        let reverb = Reverb::new(ReverbParameters {
            room_size: 3.0,
            wet_level: f32::NAN,
            ..ambient()
        });
        assert_eq!(reverb.parameters().room_size, 1.0);
        assert_eq!(reverb.parameters().wet_level, 0.0);
    }
}
