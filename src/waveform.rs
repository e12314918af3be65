//! Toy gravitational-wave signals for the chirp designer.
//!
//! None of this is a physical inspiral model. The chirp-mass proxy only
//! scales the frequency of a damped sinusoid so heavier pairs look slower.

use crate::export::SimulationParams;
use std::f64::consts::TAU;

/// Samples in a synthesised [`Waveform`].
pub const SAMPLE_COUNT: usize = 1000;
/// The waveform spans `[0, SPAN_PER_DURATION · duration)`.
pub const SPAN_PER_DURATION: f64 = 10.0;

const DAMPING_PER_DURATION: f64 = 2.5;
const HZ_PER_CHIRP_MASS: f64 = 0.01;

/// `(m1·m2)^(3/5) / (m1+m2)^(1/5)`. Non-positive masses give non-finite or
/// meaningless results; callers are expected to pass positive masses.
pub fn chirp_mass(m1: f64, m2: f64) -> f64 {
    (m1 * m2).powf(0.6) / (m1 + m2).powf(0.2)
}

/// Damped sinusoid whose frequency tracks the chirp-mass proxy.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Waveform {
    pub times: Vec<f64>,
    pub strain: Vec<f64>,
}

impl Waveform {
    /// `h(t) = exp(−t / (2.5·duration)) · sin(2π · Mc/100 · t)` at
    /// [`SAMPLE_COUNT`] evenly spaced times, end point excluded.
    pub fn synthesize(params: &SimulationParams) -> Self {
        let span = SPAN_PER_DURATION * params.duration;
        let step = span / SAMPLE_COUNT as f64;
        let frequency = chirp_mass(params.mass_a, params.mass_b) * HZ_PER_CHIRP_MASS;
        let tau = DAMPING_PER_DURATION * params.duration;

        let times: Vec<f64> = (0..SAMPLE_COUNT).map(|k| k as f64 * step).collect();
        let strain = times
            .iter()
            .map(|&t| (-t / tau).exp() * (TAU * frequency * t).sin())
            .collect();

        Self { times, strain }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn peak(&self) -> f64 {
        self.strain.iter().fold(0.0, |m, h| m.max(h.abs()))
    }
}

/// Rising-frequency chirp: frequency sweeps `f0 → f1` as `u^1.6` while the
/// envelope `u^1.8 · e^{−1.1(1−u)}` swells towards merger at `u = 1`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InspiralChirp {
    pub times: Vec<f64>,
    pub frequency: Vec<f64>,
    pub envelope: Vec<f64>,
    pub strain: Vec<f64>,
    pub f0: f64,
    pub f1: f64,
}

impl InspiralChirp {
    pub const F0: f64 = 18.0;

    /// `samples` points over `u ∈ [0, 1]` inclusive, times scaled by the
    /// duration.
    pub fn synthesize(params: &SimulationParams, samples: usize) -> Self {
        let f0 = Self::F0;
        let f1 = 380.0 + chirp_mass(params.mass_a, params.mass_b) / 30.0 * 200.0;
        let denom = samples.saturating_sub(1).max(1) as f64;

        let mut chirp = Self {
            times: Vec::with_capacity(samples),
            frequency: Vec::with_capacity(samples),
            envelope: Vec::with_capacity(samples),
            strain: Vec::with_capacity(samples),
            f0,
            f1,
        };

        for i in 0..samples {
            let u = i as f64 / denom;
            let freq = sweep(f0, f1, u);
            let env = envelope(u);
            chirp.times.push(u * params.duration);
            chirp.frequency.push(freq);
            chirp.envelope.push(env);
            chirp.strain.push(env * (TAU * freq * u * 1.6).sin());
        }
        chirp
    }

    /// Instantaneous frequency at normalised time `u`.
    pub fn frequency_at(&self, u: f64) -> f64 {
        sweep(self.f0, self.f1, u.clamp(0.0, 1.0))
    }

    pub fn envelope_at(&self, u: f64) -> f64 {
        envelope(u.clamp(0.0, 1.0))
    }
}

fn sweep(f0: f64, f1: f64, u: f64) -> f64 {
    f0 + (f1 - f0) * u.powf(1.6)
}

fn envelope(u: f64) -> f64 {
    u.powf(1.8) * (-1.1 * (1.0 - u)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn params(mass_a: f64, mass_b: f64, duration: f64) -> SimulationParams {
        SimulationParams {
            mass_a,
            mass_b,
            duration,
        }
    }

    #[test]
    fn test_reference_scenario() {
        let p = params(30.0, 25.0, 4.0);
        let expected = (30.0f64 * 25.0).powf(0.6) / 55.0f64.powf(0.2);
        assert_relative_eq!(chirp_mass(30.0, 25.0), expected, max_relative = 1e-12);

        let wave = Waveform::synthesize(&p);
        assert_eq!(wave.len(), 1000);
        assert_eq!(wave.strain.len(), 1000);
        assert_eq!(wave.times[0], 0.0);
        assert!(*wave.times.last().unwrap() < 40.0);
        for pair in wave.times.windows(2) {
            assert_relative_eq!(pair[1] - pair[0], 0.04, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_waveform_decays() {
        let wave = Waveform::synthesize(&params(30.0, 25.0, 4.0));
        let early = wave.strain[..100].iter().fold(0.0f64, |m, h| m.max(h.abs()));
        let late = wave.strain[900..].iter().fold(0.0f64, |m, h| m.max(h.abs()));
        assert!(late < early);
        assert!(wave.peak() <= 1.0);
    }

    #[test]
    fn test_zero_mass_is_not_finite() {
        // Documented as unguarded: 0^0.6 / 0^0.2 = 0 / 0.
        assert!(!chirp_mass(0.0, 0.0).is_finite());
    }

    #[test]
    fn test_inspiral_sweeps_upward() {
        let chirp = InspiralChirp::synthesize(&params(30.0, 25.0, 3.2), 2000);
        assert_eq!(chirp.strain.len(), 2000);
        assert_relative_eq!(chirp.frequency[0], InspiralChirp::F0);
        assert_relative_eq!(*chirp.frequency.last().unwrap(), chirp.f1);
        assert_relative_eq!(*chirp.times.last().unwrap(), 3.2);
        assert_eq!(chirp.envelope[0], 0.0);
        assert_relative_eq!(*chirp.envelope.last().unwrap(), 1.0);
        assert!(chirp.frequency.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_inspiral_single_sample() {
        let chirp = InspiralChirp::synthesize(&params(10.0, 10.0, 1.0), 1);
        assert_eq!(chirp.times, vec![0.0]);
    }

    proptest! {
        #[test]
        fn prop_chirp_mass_symmetric(m1 in 0.1f64..500.0, m2 in 0.1f64..500.0) {
            prop_assert_eq!(chirp_mass(m1, m2), chirp_mass(m2, m1));
        }
    }
}
