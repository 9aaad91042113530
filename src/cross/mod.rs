// Cross - cross wavelet transform of two appliance signatures
//
// The cross spectrum W_ab = W_a · conj(W_b) is evaluated cell by cell on
// the shared (scale, time) grid of two transforms. Its magnitude is the
// cross power; its argument is the relative phase, positive when signal A
// leads signal B.
//
// Module organization:
// - coherence: smoothed wavelet coherence R²
// - similarity: scalar summaries over cells outside the cone of influence

mod coherence;
mod similarity;


pub use coherence::{coherence, CoherenceResult};
pub use similarity::{similarity, SimilarityReport};

use ndarray::{Array2, Axis, Zip};
use num_complex::Complex64;
use serde::Serialize;
use std::f64::consts::PI;
use tracing::debug;

use crate::error::TransformError;
use crate::signal::Signal;
use crate::wavelet::{edge_mask, CwtEngine, ScaleSet, WaveletKind, WaveletTransformResult};

/// Cross spectrum of two transforms on a shared grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossWaveletResult {
    cross: Array2<Complex64>,
    scales: ScaleSet,
    frequencies: Vec<f64>,
    coi: Vec<f64>,
    sampling_interval: f64,
    start_time: f64,
    labels: (String, String),
}

impl CrossWaveletResult {
    /// Complex cross spectrum, shape (scales, time)
    pub fn cross(&self) -> &Array2<Complex64> {
        &self.cross
    }

    pub fn scales(&self) -> &ScaleSet {
        &self.scales
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn coi(&self) -> &[f64] {
        &self.coi
    }

    pub fn sampling_interval(&self) -> f64 {
        self.sampling_interval
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Labels of signal A and signal B
    pub fn labels(&self) -> (&str, &str) {
        (&self.labels.0, &self.labels.1)
    }

    pub fn n_scales(&self) -> usize {
        self.cross.nrows()
    }

    pub fn n_times(&self) -> usize {
        self.cross.ncols()
    }

    /// Cross power |W_ab|
    pub fn power(&self) -> Array2<f64> {
        self.cross.mapv(|c| c.norm())
    }

    /// Relative phase arg(W_ab) in [-π, π]; positive when A leads B
    pub fn phase(&self) -> Array2<f64> {
        self.cross.mapv(|c| c.arg())
    }

    pub fn time_axis(&self) -> Vec<f64> {
        (0..self.n_times())
            .map(|t| self.start_time + t as f64 * self.sampling_interval)
            .collect()
    }

    pub fn edge_mask(&self) -> Array2<bool> {
        edge_mask(&self.coi, self.n_times(), self.sampling_interval)
    }

    /// Power-weighted circular mean phase per scale, outside the cone of influence
    ///
    /// `None` where a scale has no valid cell or zero cross power.
    pub fn mean_phase_by_scale(&self) -> Vec<Option<f64>> {
        let mask = self.edge_mask();
        self.cross
            .axis_iter(Axis(0))
            .zip(mask.axis_iter(Axis(0)))
            .map(|(row, edges)| {
                let sum: Complex64 = row
                    .iter()
                    .zip(edges.iter())
                    .filter(|(_, &edge)| !edge)
                    .map(|(c, _)| *c)
                    .sum();
                (sum.norm() > 0.0).then(|| sum.arg())
            })
            .collect()
    }

    /// Time lag (seconds) implied by the mean phase at one scale
    ///
    /// Positive when A leads B. `None` if the scale index is out of range or
    /// its mean phase is undefined.
    pub fn lag_seconds(&self, scale_idx: usize) -> Option<f64> {
        let frequency = *self.frequencies.get(scale_idx)?;
        let phase = (*self.mean_phase_by_scale().get(scale_idx)?)?;
        Some(phase / (2.0 * PI * frequency))
    }
}

/// Cross wavelet transform of two transforms
///
/// # Errors
/// `ShapeMismatch` unless both share the exact scale set, time length, and
/// sampling interval.
pub fn compute(
    a: &WaveletTransformResult,
    b: &WaveletTransformResult,
) -> Result<CrossWaveletResult, TransformError> {
    check_compatible(a, b)?;

    let mut cross = Array2::zeros(a.coefficients().raw_dim());
    Zip::from(&mut cross)
        .and(a.coefficients())
        .and(b.coefficients())
        .for_each(|out, &wa, &wb| *out = wa * wb.conj());

    debug!(
        "[Xwt] '{}' x '{}': {} scales x {} samples",
        a.label(),
        b.label(),
        a.n_scales(),
        a.n_times()
    );

    Ok(CrossWaveletResult {
        cross,
        scales: a.scales().clone(),
        frequencies: a.frequencies().to_vec(),
        coi: a.coi().to_vec(),
        sampling_interval: a.sampling_interval(),
        start_time: a.start_time(),
        labels: (a.label().to_string(), b.label().to_string()),
    })
}

/// Transform two raw signals with the same wavelet and scales, then cross them
pub fn compute_signals(
    a: &Signal,
    b: &Signal,
    scales: &ScaleSet,
    wavelet: WaveletKind,
    wavelet_param: f64,
) -> Result<CrossWaveletResult, TransformError> {
    let engine = CwtEngine::new(wavelet, wavelet_param)?;
    let wa = engine.compute(a, scales)?;
    let wb = engine.compute(b, scales)?;
    compute(&wa, &wb)
}

pub(crate) fn check_compatible(
    a: &WaveletTransformResult,
    b: &WaveletTransformResult,
) -> Result<(), TransformError> {
    if a.scales() != b.scales() {
        return Err(TransformError::ShapeMismatch {
            reason: format!(
                "scale sets differ ({} vs {} scales)",
                a.scales().len(),
                b.scales().len()
            ),
        });
    }
    if a.n_times() != b.n_times() {
        return Err(TransformError::ShapeMismatch {
            reason: format!(
                "time lengths differ ({} vs {} samples)",
                a.n_times(),
                b.n_times()
            ),
        });
    }
    if a.sampling_interval() != b.sampling_interval() {
        return Err(TransformError::ShapeMismatch {
            reason: format!(
                "sampling intervals differ ({} vs {} s)",
                a.sampling_interval(),
                b.sampling_interval()
            ),
        });
    }
    Ok(())
}
