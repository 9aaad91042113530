// Signal - current trace model and data loading stages
//
// This module owns everything that happens before a wavelet transform:
// reading traces from CSV/WAV, dropping invalid samples, normalizing
// amplitude, and cutting out a region of interest.
//
// Module organization:
// - loader: CSV reading, sampling interval derivation, CSV writing
// - wav: WAV reading via hound
// - clean: non-finite and outlier removal
// - normalize: zscore / minmax / robust scaling
// - segment: time-bounded cuts and fixed-length windows
// - stats: mean/std/median/quantile helpers
// - synthetic: deterministic test traces
//
// Every stage returns a new Signal; inputs are never mutated.

mod clean;
mod loader;
mod normalize;
mod segment;
pub(crate) mod stats;
pub mod synthetic;
mod wav;

pub use clean::clean;
pub use loader::{label_from_path, load_csv, save_csv, ColumnSelector, LoadOptions};
pub use normalize::{normalize, remove_dc, NormalizationMethod, NormalizedSignal};
pub use segment::{segment, windows};
pub use wav::load_wav;

use serde::Serialize;

use crate::error::LoadError;

/// Ordered real-valued current samples with timing metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    samples: Vec<f64>,
    sampling_interval: f64,
    start_time: f64,
    label: String,
}

impl Signal {
    /// Create a signal starting at t = 0
    ///
    /// # Errors
    /// `LoadError::Format` if the sampling interval is not finite and positive.
    pub fn new(
        samples: Vec<f64>,
        sampling_interval: f64,
        label: impl Into<String>,
    ) -> Result<Self, LoadError> {
        if !sampling_interval.is_finite() || sampling_interval <= 0.0 {
            return Err(LoadError::Format {
                reason: format!(
                    "sampling interval must be finite and > 0 (got {})",
                    sampling_interval
                ),
            });
        }

        Ok(Self {
            samples,
            sampling_interval,
            start_time: 0.0,
            label: label.into(),
        })
    }

    /// Shift the time origin of the first sample
    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Seconds per sample
    pub fn sampling_interval(&self) -> f64 {
        self.sampling_interval
    }

    /// Samples per second
    pub fn sample_rate(&self) -> f64 {
        1.0 / self.sampling_interval
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Half-open time span `[start, start + n·dt)` covered by the samples
    pub fn time_span(&self) -> (f64, f64) {
        (
            self.start_time,
            self.start_time + self.samples.len() as f64 * self.sampling_interval,
        )
    }

    /// Time of every sample in seconds
    pub fn time_axis(&self) -> Vec<f64> {
        (0..self.samples.len())
            .map(|i| self.start_time + i as f64 * self.sampling_interval)
            .collect()
    }

    /// First `len` samples (or the whole signal if it is shorter)
    pub fn truncated(&self, len: usize) -> Signal {
        self.derive(self.samples[..len.min(self.samples.len())].to_vec())
    }

    /// Same metadata, new samples
    pub(crate) fn derive(&self, samples: Vec<f64>) -> Signal {
        Signal {
            samples,
            sampling_interval: self.sampling_interval,
            start_time: self.start_time,
            label: self.label.clone(),
        }
    }
}

impl AsRef<Signal> for Signal {
    fn as_ref(&self) -> &Signal {
        self
    }
}
