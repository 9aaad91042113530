// Similarity summaries over the shared, edge-free region of two transforms
//
// Both transforms share scales and length, so their cones of influence
// coincide; every cell flagged by either is excluded from the sums.

use serde::{Deserialize, Serialize};

use super::check_compatible;
use crate::error::TransformError;
use crate::wavelet::WaveletTransformResult;

/// Scalar similarity of two appliance signatures
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityReport {
    /// Mean cross power |W_ab| over valid cells
    pub mean_cross_power: f64,
    /// Σ|W_ab| / √(Σ|W_a|² · Σ|W_b|²) over valid cells, in [0, 1]
    pub normalized_similarity: f64,
    /// Cells outside the cone of influence
    pub valid_cells: usize,
    /// Edge-affected cells left out of both sums
    pub excluded_cells: usize,
}

impl SimilarityReport {
    /// Whether the normalized similarity reaches `threshold`
    pub fn meets(&self, threshold: f64) -> bool {
        self.normalized_similarity >= threshold
    }
}

/// Similarity of two transforms, excluding edge-affected cells
///
/// # Errors
/// - `ShapeMismatch` if the transforms do not share a grid
/// - `InsufficientData` if every cell is edge-affected
pub fn similarity(
    a: &WaveletTransformResult,
    b: &WaveletTransformResult,
) -> Result<SimilarityReport, TransformError> {
    check_compatible(a, b)?;

    let mask = a.edge_mask();
    let mut cross_sum = 0.0;
    let mut energy_a = 0.0;
    let mut energy_b = 0.0;
    let mut valid_cells = 0usize;

    for ((wa, wb), &edge) in a
        .coefficients()
        .iter()
        .zip(b.coefficients().iter())
        .zip(mask.iter())
    {
        if edge {
            continue;
        }
        cross_sum += (wa * wb.conj()).norm();
        energy_a += wa.norm_sqr();
        energy_b += wb.norm_sqr();
        valid_cells += 1;
    }

    let excluded_cells = mask.len() - valid_cells;
    if valid_cells == 0 {
        return Err(TransformError::InsufficientData {
            required: 1,
            available: 0,
        });
    }

    let denom = (energy_a * energy_b).sqrt();
    let normalized_similarity = if denom > 0.0 {
        (cross_sum / denom).clamp(0.0, 1.0)
    } else {
        0.0
    };

    Ok(SimilarityReport {
        mean_cross_power: cross_sum / valid_cells as f64,
        normalized_similarity,
        valid_cells,
        excluded_cells,
    })
}
