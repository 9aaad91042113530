// Scalogram - power view of a wavelet transform
//
// Power is |W|², optionally divided by the signal variance so that white
// noise of any amplitude has unit expected power. Summaries that average
// over time only use cells outside the cone of influence.

use ndarray::{Array2, Axis};
use serde::Serialize;

use super::result::{edge_mask, WaveletTransformResult};
use crate::error::TransformError;

/// Power field with the axis metadata needed to render or summarize it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scalogram {
    power: Array2<f64>,
    frequencies: Vec<f64>,
    coi: Vec<f64>,
    sampling_interval: f64,
    start_time: f64,
    variance: Option<f64>,
    label: String,
}

impl Scalogram {
    pub fn from_transform(result: &WaveletTransformResult) -> Self {
        Self {
            power: result.power(),
            frequencies: result.frequencies().to_vec(),
            coi: result.coi().to_vec(),
            sampling_interval: result.sampling_interval(),
            start_time: result.start_time(),
            variance: None,
            label: result.label().to_string(),
        }
    }

    /// Divide power by the variance of the transformed signal
    ///
    /// # Errors
    /// `InvalidParameter` if `variance` is not finite and positive.
    pub fn normalized(mut self, variance: f64) -> Result<Self, TransformError> {
        if !variance.is_finite() || variance <= 0.0 {
            return Err(TransformError::InvalidParameter {
                name: "variance".to_string(),
                value: variance,
            });
        }
        self.power.mapv_inplace(|p| p / variance);
        self.variance = Some(variance);
        Ok(self)
    }

    pub fn power(&self) -> &Array2<f64> {
        &self.power
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn coi(&self) -> &[f64] {
        &self.coi
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Variance the power was divided by, if any
    pub fn variance(&self) -> Option<f64> {
        self.variance
    }

    pub fn edge_mask(&self) -> Array2<bool> {
        edge_mask(&self.coi, self.power.ncols(), self.sampling_interval)
    }

    /// Time-averaged power per scale over cells outside the cone of influence
    ///
    /// `None` for scales whose every cell is edge-affected.
    pub fn global_spectrum(&self) -> Vec<Option<f64>> {
        let mask = self.edge_mask();
        self.power
            .axis_iter(Axis(0))
            .zip(mask.axis_iter(Axis(0)))
            .map(|(row, edges)| {
                let (sum, count) = row
                    .iter()
                    .zip(edges.iter())
                    .filter(|(_, &edge)| !edge)
                    .fold((0.0, 0usize), |(s, c), (&p, _)| (s + p, c + 1));
                (count > 0).then(|| sum / count as f64)
            })
            .collect()
    }

    /// Frequency of peak power at each time index
    ///
    /// With `exclude_edges` only scales outside the cone of influence at that
    /// time compete; columns with no eligible scale yield `None`.
    pub fn dominant_frequencies(&self, exclude_edges: bool) -> Vec<Option<f64>> {
        let mask = self.edge_mask();
        self.power
            .axis_iter(Axis(1))
            .zip(mask.axis_iter(Axis(1)))
            .map(|(column, edges)| {
                column
                    .iter()
                    .zip(edges.iter())
                    .enumerate()
                    .filter(|(_, (_, &edge))| !(exclude_edges && edge))
                    .fold(None, |best: Option<(usize, f64)>, (i, (&p, _))| match best {
                        Some((_, bp)) if bp >= p => best,
                        _ => Some((i, p)),
                    })
                    .map(|(i, _)| self.frequencies[i])
            })
            .collect()
    }

    /// Power in decibels: 10 · log10(power + epsilon)
    pub fn to_db(&self, epsilon: f64) -> Array2<f64> {
        self.power.mapv(|p| 10.0 * (p + epsilon).log10())
    }
}
