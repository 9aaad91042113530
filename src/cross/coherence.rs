// Wavelet coherence
//
//   R²(s, t) = |S(W_ab / s)|² / (S(|W_a|² / s) · S(|W_b|² / s))
//
// The smoothing operator S runs in two passes:
// - time: Gaussian with σ = s samples, truncated at ±3σ, weights
//   renormalized where the window runs past either end of the signal
// - scale: boxcar over every scale within ±0.3 octaves (0.6 octaves wide)
//
// Without smoothing R² is identically 1, so the operator is what gives the
// measure meaning. Cells with a zero denominator report 0.

use ndarray::{Array1, Array2, Axis};
use num_complex::Complex64;
use serde::Serialize;
use std::ops::{Add, Mul};

use super::check_compatible;
use crate::error::TransformError;
use crate::wavelet::{edge_mask, WaveletTransformResult};

/// Gaussian truncation in standard deviations
const TIME_WINDOW_SIGMAS: f64 = 3.0;

/// Half-width of the scale boxcar in octaves
const SCALE_HALF_WIDTH_OCTAVES: f64 = 0.3;

/// Smoothed coherence field in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoherenceResult {
    coherence: Array2<f64>,
    frequencies: Vec<f64>,
    coi: Vec<f64>,
    sampling_interval: f64,
}

impl CoherenceResult {
    pub fn coherence(&self) -> &Array2<f64> {
        &self.coherence
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn edge_mask(&self) -> Array2<bool> {
        edge_mask(&self.coi, self.coherence.ncols(), self.sampling_interval)
    }

    /// Mean coherence over cells outside the cone of influence
    pub fn mean_coherence(&self) -> Option<f64> {
        let mask = self.edge_mask();
        let (sum, count) = self
            .coherence
            .iter()
            .zip(mask.iter())
            .filter(|(_, &edge)| !edge)
            .fold((0.0, 0usize), |(s, c), (&r, _)| (s + r, c + 1));
        (count > 0).then(|| sum / count as f64)
    }
}

/// Smoothed wavelet coherence of two transforms
///
/// # Errors
/// `ShapeMismatch` if the transforms do not share a grid.
pub fn coherence(
    a: &WaveletTransformResult,
    b: &WaveletTransformResult,
) -> Result<CoherenceResult, TransformError> {
    check_compatible(a, b)?;

    let scales = a.scales().values();
    let inv_scale = Array1::from_iter(scales.iter().map(|s| 1.0 / s)).insert_axis(Axis(1));

    let cross = &(a.coefficients() * &b.coefficients().mapv(|c| c.conj()))
        * &inv_scale.mapv(|v| Complex64::new(v, 0.0));
    let power_a = &a.power() * &inv_scale;
    let power_b = &b.power() * &inv_scale;

    let cross = smooth(&cross, scales);
    let power_a = smooth(&power_a, scales);
    let power_b = smooth(&power_b, scales);

    let mut coherence = Array2::zeros(cross.raw_dim());
    for ((idx, out), c) in coherence.indexed_iter_mut().zip(cross.iter()) {
        let denom = power_a[idx] * power_b[idx];
        *out = if denom > 0.0 {
            (c.norm_sqr() / denom).clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    Ok(CoherenceResult {
        coherence,
        frequencies: a.frequencies().to_vec(),
        coi: a.coi().to_vec(),
        sampling_interval: a.sampling_interval(),
    })
}

fn smooth<T>(field: &Array2<T>, scales: &[f64]) -> Array2<T>
where
    T: Copy + Default + Add<Output = T> + Mul<f64, Output = T>,
{
    let mut timed = Array2::from_elem(field.raw_dim(), T::default());
    for (i, &scale) in scales.iter().enumerate() {
        let row = field.row(i);
        let kernel = gaussian_kernel(scale);
        let half = (kernel.len() / 2) as isize;
        let n = row.len() as isize;
        for t in 0..n {
            let mut acc = T::default();
            let mut weight = 0.0;
            for (k, &w) in kernel.iter().enumerate() {
                let idx = t + k as isize - half;
                if idx >= 0 && idx < n {
                    acc = acc + row[idx as usize] * w;
                    weight += w;
                }
            }
            timed[[i, t as usize]] = acc * (1.0 / weight);
        }
    }

    let octaves: Vec<f64> = scales.iter().map(|s| s.log2()).collect();
    let mut smoothed = Array2::from_elem(field.raw_dim(), T::default());
    for (i, &center) in octaves.iter().enumerate() {
        let members: Vec<usize> = octaves
            .iter()
            .enumerate()
            .filter(|(_, &o)| (o - center).abs() <= SCALE_HALF_WIDTH_OCTAVES + 1e-12)
            .map(|(j, _)| j)
            .collect();
        let inv = 1.0 / members.len() as f64;
        for t in 0..field.ncols() {
            let mut acc = T::default();
            for &j in &members {
                acc = acc + timed[[j, t]];
            }
            smoothed[[i, t]] = acc * inv;
        }
    }
    smoothed
}

/// Gaussian weights with σ = `scale` samples, truncated at ±3σ
fn gaussian_kernel(scale: f64) -> Vec<f64> {
    let half = (TIME_WINDOW_SIGMAS * scale).ceil() as isize;
    (-half..=half)
        .map(|m| {
            let x = m as f64 / scale;
            (-0.5 * x * x).exp()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian_kernel_support() {
        let kernel = gaussian_kernel(2.0);
        assert_eq!(kernel.len(), 13);
        assert_eq!(kernel[6], 1.0);
        assert!((kernel[0] - kernel[12]).abs() < 1e-15);
        assert!(kernel[0] < 0.02);
    }

    #[test]
    fn test_smooth_preserves_constant_field() {
        let field = Array2::from_elem((4, 20), 3.0);
        let smoothed = smooth(&field, &[1.0, 1.2, 2.0, 4.0]);
        assert!(smoothed.iter().all(|v| (v - 3.0).abs() < 1e-12));
    }
}
