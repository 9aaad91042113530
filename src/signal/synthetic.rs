//! Deterministic synthetic current traces.
//!
//! Used by tests and the CLI `synth` command to produce reproducible
//! appliance-like waveforms without recorded data: pure tones, square
//! waves, seeded noise, impulse trains, and mains fundamentals with
//! harmonic content.

use std::f64::consts::PI;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::Signal;
use crate::error::LoadError;

/// Seed for noise patterns so repeated runs produce identical traces
pub const NOISE_SEED: u64 = 0x5A5A_FFF0;

/// Supported deterministic waveform patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticPattern {
    Sine,
    Square,
    WhiteNoise,
    ImpulseTrain,
}

/// Configuration for a synthetic trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticSpec {
    pub pattern: SyntheticPattern,
    #[serde(default = "default_frequency_hz")]
    pub frequency_hz: f64,
    #[serde(default = "default_amplitude")]
    pub amplitude: f64,
    /// Phase offset in radians (periodic patterns only)
    #[serde(default)]
    pub phase_rad: f64,
    /// Constant offset added to every sample
    #[serde(default)]
    pub dc_offset: f64,
}

impl SyntheticSpec {
    pub fn sine(frequency_hz: f64, amplitude: f64) -> Self {
        Self {
            pattern: SyntheticPattern::Sine,
            frequency_hz,
            amplitude,
            phase_rad: 0.0,
            dc_offset: 0.0,
        }
    }

    pub fn with_phase(mut self, phase_rad: f64) -> Self {
        self.phase_rad = phase_rad;
        self
    }

    pub fn with_pattern(mut self, pattern: SyntheticPattern) -> Self {
        self.pattern = pattern;
        self
    }
}

fn default_frequency_hz() -> f64 {
    50.0
}

fn default_amplitude() -> f64 {
    1.0
}

/// Render `len` samples of the pattern at the given sampling interval
pub fn generate(
    spec: &SyntheticSpec,
    sampling_interval: f64,
    len: usize,
    label: impl Into<String>,
) -> Result<Signal, LoadError> {
    let mut rng = StdRng::seed_from_u64(NOISE_SEED);
    let impulse_interval = if spec.frequency_hz > 0.0 {
        ((1.0 / (spec.frequency_hz * sampling_interval)).round() as usize).max(1)
    } else {
        len.max(1)
    };

    let samples = (0..len)
        .map(|i| {
            let t = i as f64 * sampling_interval;
            let cycle = 2.0 * PI * spec.frequency_hz * t + spec.phase_rad;
            let value = match spec.pattern {
                SyntheticPattern::Sine => spec.amplitude * cycle.sin(),
                SyntheticPattern::Square => {
                    if cycle.sin() >= 0.0 {
                        spec.amplitude
                    } else {
                        -spec.amplitude
                    }
                }
                SyntheticPattern::WhiteNoise => {
                    if spec.amplitude > 0.0 {
                        rng.gen_range(-spec.amplitude..spec.amplitude)
                    } else {
                        0.0
                    }
                }
                SyntheticPattern::ImpulseTrain => {
                    if i % impulse_interval == 0 {
                        spec.amplitude
                    } else {
                        0.0
                    }
                }
            };
            value + spec.dc_offset
        })
        .collect();

    Signal::new(samples, sampling_interval, label)
}

/// Mains current with harmonic content, as drawn by non-linear loads
///
/// `harmonics` lists `(order, relative_amplitude)` pairs on top of a unit
/// fundamental; `noise` adds seeded uniform noise of that amplitude.
pub fn mains_current(
    fundamental_hz: f64,
    harmonics: &[(u32, f64)],
    noise: f64,
    sampling_interval: f64,
    len: usize,
    label: impl Into<String>,
) -> Result<Signal, LoadError> {
    let mut rng = StdRng::seed_from_u64(NOISE_SEED);
    let samples = (0..len)
        .map(|i| {
            let t = i as f64 * sampling_interval;
            let base = (2.0 * PI * fundamental_hz * t).sin();
            let upper: f64 = harmonics
                .iter()
                .map(|&(order, amp)| amp * (2.0 * PI * fundamental_hz * order as f64 * t).sin())
                .sum();
            let jitter = if noise > 0.0 {
                rng.gen_range(-noise..noise)
            } else {
                0.0
            };
            base + upper + jitter
        })
        .collect();

    Signal::new(samples, sampling_interval, label)
}
