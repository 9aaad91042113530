// Normalization - amplitude scaling before the transform
//
// Methods:
// - zscore: (x - mean) / std, population std
// - minmax: (x - min) / (max - min), output in [0, 1]
// - robust: (x - median) / IQR
//
// All methods fail with DegenerateSignal when their spread term is exactly
// zero. For zscore that means every sample is equal, so rounding residue in
// the std of a constant signal does not count as spread. `remove_dc` only
// subtracts the mean.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::stats::{mean, median, quantile, std_dev};
use super::Signal;
use crate::error::LoadError;

/// Supported normalization methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationMethod {
    #[default]
    ZScore,
    MinMax,
    Robust,
}

impl fmt::Display for NormalizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NormalizationMethod::ZScore => "zscore",
            NormalizationMethod::MinMax => "minmax",
            NormalizationMethod::Robust => "robust",
        };
        f.write_str(name)
    }
}

impl FromStr for NormalizationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zscore" => Ok(NormalizationMethod::ZScore),
            "minmax" => Ok(NormalizationMethod::MinMax),
            "robust" => Ok(NormalizationMethod::Robust),
            other => Err(format!("Unknown normalization method: {}", other)),
        }
    }
}

/// A signal after amplitude normalization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedSignal {
    signal: Signal,
    method: NormalizationMethod,
}

impl NormalizedSignal {
    pub fn as_signal(&self) -> &Signal {
        &self.signal
    }

    pub fn into_signal(self) -> Signal {
        self.signal
    }

    pub fn method(&self) -> NormalizationMethod {
        self.method
    }
}

impl AsRef<Signal> for NormalizedSignal {
    fn as_ref(&self) -> &Signal {
        &self.signal
    }
}

/// Normalize a signal with the given method
///
/// # Errors
/// - `EmptyData` for an empty signal
/// - `DegenerateSignal` when the method's spread (std, range, IQR) is zero
pub fn normalize(
    signal: &Signal,
    method: NormalizationMethod,
) -> Result<NormalizedSignal, LoadError> {
    let samples = signal.samples();
    if samples.is_empty() {
        return Err(LoadError::EmptyData {
            reason: format!("cannot normalize empty signal '{}'", signal.label()),
        });
    }

    let (center, spread, what) = match method {
        NormalizationMethod::ZScore => (mean(samples), std_dev(samples), "standard deviation"),
        NormalizationMethod::MinMax => {
            let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
            let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (min, max - min, "range (max - min)")
        }
        NormalizationMethod::Robust => {
            let iqr = quantile(samples, 0.75) - quantile(samples, 0.25);
            (median(samples), iqr, "interquartile range")
        }
    };

    let constant = samples.iter().all(|&x| x == samples[0]);
    if !spread.is_finite() || spread == 0.0 || constant {
        return Err(LoadError::DegenerateSignal {
            method: method.to_string(),
            reason: format!("{} is zero for '{}'", what, signal.label()),
        });
    }

    let scaled = samples.iter().map(|&x| (x - center) / spread).collect();
    Ok(NormalizedSignal {
        signal: signal.derive(scaled),
        method,
    })
}

/// Subtract the mean, leaving the amplitude scale untouched
///
/// # Errors
/// `EmptyData` for an empty signal.
pub fn remove_dc(signal: &Signal) -> Result<Signal, LoadError> {
    let samples = signal.samples();
    if samples.is_empty() {
        return Err(LoadError::EmptyData {
            reason: format!("cannot remove DC from empty signal '{}'", signal.label()),
        });
    }
    let m = mean(samples);
    Ok(signal.derive(samples.iter().map(|&x| x - m).collect()))
}
