// Scale sets - the ordered scales a transform is evaluated at
//
// Scales are dimensionless and measured in samples: scale s dilates the
// mother wavelet to s samples per unit of its argument. The pseudo-frequency
// of scale s is fc / (s · dt), so frequencies decrease as scales increase.

use serde::{Deserialize, Serialize};

use super::morlet::Wavelet;
use crate::error::TransformError;

/// Spacing between consecutive scales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleSpacing {
    Linear,
    #[default]
    Logarithmic,
}

/// Strictly positive, strictly ascending scales
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleSet {
    values: Vec<f64>,
}

impl ScaleSet {
    /// Validate and wrap explicit scale values
    ///
    /// # Errors
    /// `InvalidScales` if the set is empty, holds a non-finite or
    /// non-positive value, or is not strictly ascending.
    pub fn new(values: Vec<f64>) -> Result<Self, TransformError> {
        if values.is_empty() {
            return Err(invalid("scale set is empty"));
        }
        if let Some(bad) = values.iter().find(|s| !s.is_finite() || **s <= 0.0) {
            return Err(invalid(format!("scale {} is not a positive finite value", bad)));
        }
        if let Some(pair) = values.windows(2).find(|w| w[1] <= w[0]) {
            return Err(invalid(format!(
                "scales must be strictly ascending ({} followed by {})",
                pair[0], pair[1]
            )));
        }
        Ok(Self { values })
    }

    /// `count` scales from `min` to `max` inclusive
    pub fn with_spacing(
        min: f64,
        max: f64,
        count: usize,
        spacing: ScaleSpacing,
    ) -> Result<Self, TransformError> {
        if count == 0 {
            return Err(invalid("scale count must be at least 1"));
        }
        if !(min > 0.0) || !max.is_finite() {
            return Err(invalid(format!("scale range [{}, {}] is not positive", min, max)));
        }
        if count == 1 {
            return Self::new(vec![min]);
        }
        if max <= min {
            return Err(invalid(format!("scale max {} must exceed min {}", max, min)));
        }

        let steps = (count - 1) as f64;
        let values = match spacing {
            ScaleSpacing::Linear => (0..count)
                .map(|i| min + (max - min) * i as f64 / steps)
                .collect(),
            ScaleSpacing::Logarithmic => {
                let ratio = (max / min).ln();
                (0..count)
                    .map(|i| min * (ratio * i as f64 / steps).exp())
                    .collect()
            }
        };
        Self::new(values)
    }

    pub fn linear(min: f64, max: f64, count: usize) -> Result<Self, TransformError> {
        Self::with_spacing(min, max, count, ScaleSpacing::Linear)
    }

    pub fn logarithmic(min: f64, max: f64, count: usize) -> Result<Self, TransformError> {
        Self::with_spacing(min, max, count, ScaleSpacing::Logarithmic)
    }

    /// Octave-based scales: s_j = s0 · 2^(j·dj) for j = 0..=round(octaves / dj)
    ///
    /// `s0` is the smallest scale in samples, `dj` the spacing in octaves
    /// (sub-octaves per voice), `octaves` the total span.
    pub fn octaves(s0: f64, dj: f64, octaves: f64) -> Result<Self, TransformError> {
        if !(s0 > 0.0) || !(dj > 0.0) || !(octaves > 0.0) || !octaves.is_finite() {
            return Err(invalid(format!(
                "octave parameters must be positive (s0={}, dj={}, octaves={})",
                s0, dj, octaves
            )));
        }
        let j_max = (octaves / dj).round() as usize;
        Self::new((0..=j_max).map(|j| s0 * 2f64.powf(j as f64 * dj)).collect())
    }

    /// Scales whose pseudo-frequencies cover `[min_hz, max_hz]`
    ///
    /// The highest frequency maps to the smallest scale. Spacing is applied
    /// in the scale domain.
    pub fn from_frequency_range(
        min_hz: f64,
        max_hz: f64,
        count: usize,
        spacing: ScaleSpacing,
        sampling_interval: f64,
        wavelet: &dyn Wavelet,
    ) -> Result<Self, TransformError> {
        if !(min_hz > 0.0) || !(max_hz >= min_hz) || !max_hz.is_finite() {
            return Err(invalid(format!(
                "frequency range [{}, {}] Hz is invalid",
                min_hz, max_hz
            )));
        }
        let fc = wavelet.center_frequency();
        let smallest = fc / (max_hz * sampling_interval);
        let largest = fc / (min_hz * sampling_interval);
        Self::with_spacing(smallest, largest, count, spacing)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.values.iter()
    }

    pub fn min(&self) -> f64 {
        self.values[0]
    }

    pub fn max(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    /// Pseudo-frequency (Hz) of each scale: fc / (s · dt)
    pub fn frequencies(&self, sampling_interval: f64, wavelet: &dyn Wavelet) -> Vec<f64> {
        let fc = wavelet.center_frequency();
        self.values
            .iter()
            .map(|&s| fc / (s * sampling_interval))
            .collect()
    }
}

fn invalid(reason: impl Into<String>) -> TransformError {
    TransformError::InvalidScales {
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wavelet::Morlet;

    #[test]
    fn test_rejects_invalid_sets() {
        assert!(ScaleSet::new(vec![]).is_err());
        assert!(ScaleSet::new(vec![1.0, 0.0]).is_err());
        assert!(ScaleSet::new(vec![-1.0, 2.0]).is_err());
        assert!(ScaleSet::new(vec![2.0, 1.0]).is_err());
        assert!(ScaleSet::new(vec![1.0, 1.0]).is_err());
        assert!(ScaleSet::new(vec![1.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_linear_and_log_spacing() {
        let lin = ScaleSet::linear(1.0, 5.0, 5).unwrap();
        assert_eq!(lin.values(), &[1.0, 2.0, 3.0, 4.0, 5.0]);

        let log = ScaleSet::logarithmic(1.0, 8.0, 4).unwrap();
        for (a, b) in log.values().iter().zip([1.0, 2.0, 4.0, 8.0]) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_octaves_match_reference_layout() {
        // s0 = 2 samples, dj = 0.125, 7 octaves -> 57 scales up to 256
        let scales = ScaleSet::octaves(2.0, 0.125, 7.0).unwrap();
        assert_eq!(scales.len(), 57);
        assert!((scales.min() - 2.0).abs() < 1e-12);
        assert!((scales.max() - 256.0).abs() < 1e-9);
    }

    #[test]
    fn test_frequency_range_round_trips() {
        let morlet = Morlet::default();
        let scales = ScaleSet::from_frequency_range(
            10.0,
            200.0,
            32,
            ScaleSpacing::Logarithmic,
            0.001,
            &morlet,
        )
        .unwrap();
        let freqs = scales.frequencies(0.001, &morlet);
        assert!((freqs[0] - 200.0).abs() < 1e-9);
        assert!((freqs[31] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_frequencies_strictly_decrease() {
        let morlet = Morlet::default();
        for spacing in [ScaleSpacing::Linear, ScaleSpacing::Logarithmic] {
            let scales = ScaleSet::with_spacing(0.5, 300.0, 40, spacing).unwrap();
            let freqs = scales.frequencies(0.01, &morlet);
            assert!(freqs.windows(2).all(|w| w[1] < w[0]));
        }
    }

    #[test]
    fn test_single_scale() {
        let scales = ScaleSet::linear(3.0, 3.0, 1).unwrap();
        assert_eq!(scales.values(), &[3.0]);
        assert!(ScaleSet::linear(3.0, 2.0, 2).is_err());
        assert!(ScaleSet::linear(1.0, 2.0, 0).is_err());
    }
}
