// WaveletTransformResult - complex coefficients plus axis metadata
//
// Coefficients are indexed (scale, time). Alongside them the result carries
// the scale set, the per-scale pseudo-frequencies, and the per-scale
// cone-of-influence boundary so that downstream consumers never need to
// recompute any of it.
//
// Cone of influence: scale i has boundary time coi[i] = √2 · s_i · dt
// seconds (the Morlet e-folding time). A cell (i, t) is edge-affected when
// it lies closer than coi[i] to either end of the signal. Edge-affected
// cells stay in the result; `edge_mask` flags them.

use ndarray::Array2;
use num_complex::Complex64;
use serde::Serialize;

use super::morlet::WaveletKind;
use super::scales::ScaleSet;

/// Output of a continuous wavelet transform
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaveletTransformResult {
    pub(crate) coefficients: Array2<Complex64>,
    pub(crate) scales: ScaleSet,
    pub(crate) frequencies: Vec<f64>,
    pub(crate) coi: Vec<f64>,
    pub(crate) sampling_interval: f64,
    pub(crate) start_time: f64,
    pub(crate) center_frequency: f64,
    pub(crate) efolding_factor: f64,
    pub(crate) wavelet: WaveletKind,
    pub(crate) wavelet_param: f64,
    pub(crate) label: String,
}

impl WaveletTransformResult {
    /// Complex coefficients, shape (scales, time)
    pub fn coefficients(&self) -> &Array2<Complex64> {
        &self.coefficients
    }

    pub fn scales(&self) -> &ScaleSet {
        &self.scales
    }

    /// Pseudo-frequency (Hz) per scale, strictly decreasing
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Edge boundary time (seconds) per scale
    pub fn coi(&self) -> &[f64] {
        &self.coi
    }

    pub fn sampling_interval(&self) -> f64 {
        self.sampling_interval
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn wavelet(&self) -> WaveletKind {
        self.wavelet
    }

    pub fn wavelet_param(&self) -> f64 {
        self.wavelet_param
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn n_scales(&self) -> usize {
        self.coefficients.nrows()
    }

    pub fn n_times(&self) -> usize {
        self.coefficients.ncols()
    }

    /// |W|², the scalogram power
    pub fn power(&self) -> Array2<f64> {
        self.coefficients.mapv(|c| c.norm_sqr())
    }

    /// Local phase arg(W) in [-π, π]
    pub fn phase(&self) -> Array2<f64> {
        self.coefficients.mapv(|c| c.arg())
    }

    /// Time of every column in seconds
    pub fn time_axis(&self) -> Vec<f64> {
        (0..self.n_times())
            .map(|t| self.start_time + t as f64 * self.sampling_interval)
            .collect()
    }

    /// Whether cell (scale_idx, t_idx) lies inside the edge-affected zone
    pub fn is_edge_affected(&self, scale_idx: usize, t_idx: usize) -> bool {
        edge_affected(
            self.coi[scale_idx],
            t_idx,
            self.n_times(),
            self.sampling_interval,
        )
    }

    /// Boolean mask, true where edge effects dominate
    pub fn edge_mask(&self) -> Array2<bool> {
        edge_mask(&self.coi, self.n_times(), self.sampling_interval)
    }

    /// Largest Fourier period (seconds) unaffected by edges at each time
    ///
    /// This is the curve renderers draw over a scalogram; it is zero at both
    /// ends of the signal and peaks in the middle.
    pub fn coi_curve(&self) -> Vec<f64> {
        let n = self.n_times();
        let denom = self.efolding_factor * self.center_frequency;
        (0..n)
            .map(|t| {
                let distance = t.min(n - 1 - t) as f64 * self.sampling_interval;
                distance / denom
            })
            .collect()
    }

    /// Whether two transforms share a scale set and time axis length
    pub fn same_grid(&self, other: &WaveletTransformResult) -> bool {
        self.scales == other.scales && self.n_times() == other.n_times()
    }
}

pub(crate) fn edge_affected(boundary: f64, t_idx: usize, n: usize, dt: f64) -> bool {
    let from_start = t_idx as f64 * dt;
    let from_end = (n - 1 - t_idx) as f64 * dt;
    from_start < boundary || from_end < boundary
}

pub(crate) fn edge_mask(coi: &[f64], n: usize, dt: f64) -> Array2<bool> {
    Array2::from_shape_fn((coi.len(), n), |(i, t)| edge_affected(coi[i], t, n, dt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_affected_boundaries() {
        // boundary 0.25 s, dt 0.1 s, 10 samples: t = 0,1,2 and 7,8,9 are affected
        let flags: Vec<bool> = (0..10).map(|t| edge_affected(0.25, t, 10, 0.1)).collect();
        assert_eq!(
            flags,
            vec![true, true, true, false, false, false, false, true, true, true]
        );
    }

    #[test]
    fn test_edge_mask_grows_with_scale() {
        let mask = edge_mask(&[0.1, 0.35], 10, 0.1);
        let affected_small = mask.row(0).iter().filter(|&&b| b).count();
        let affected_large = mask.row(1).iter().filter(|&&b| b).count();
        assert!(affected_large > affected_small);
    }
}
