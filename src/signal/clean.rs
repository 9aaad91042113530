// Cleaning - repair non-finite samples and z-score outliers

use tracing::debug;

use super::stats::{mean, std_dev};
use super::Signal;
use crate::error::LoadError;

/// Replace non-finite samples, and optionally samples with |z| >= threshold
///
/// Outlier z-scores are computed on the finite samples. A zero-variance
/// signal has no outliers. Rejected samples are replaced by linear
/// interpolation between the nearest kept neighbours (or the nearest kept
/// value at either end), so the signal keeps its length and every sample
/// stays at its original time.
///
/// # Errors
/// `EmptyData` if no sample is kept.
pub fn clean(signal: &Signal, outlier_threshold: Option<f64>) -> Result<Signal, LoadError> {
    let samples = signal.samples();
    let mut keep: Vec<bool> = samples.iter().map(|v| v.is_finite()).collect();

    if let Some(threshold) = outlier_threshold {
        let finite: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
        let m = mean(&finite);
        let sd = std_dev(&finite);
        if sd > 0.0 {
            for (flag, v) in keep.iter_mut().zip(samples) {
                if *flag && ((v - m) / sd).abs() >= threshold {
                    *flag = false;
                }
            }
        }
    }

    let kept: Vec<usize> = (0..samples.len()).filter(|&i| keep[i]).collect();
    let (Some(&first), Some(&last)) = (kept.first(), kept.last()) else {
        return Err(LoadError::EmptyData {
            reason: format!("no samples left after cleaning '{}'", signal.label()),
        });
    };

    let replaced = samples.len() - kept.len();
    if replaced == 0 {
        return Ok(signal.derive(samples.to_vec()));
    }

    let mut repaired = samples.to_vec();
    repaired[..first].fill(samples[first]);
    repaired[last + 1..].fill(samples[last]);
    for pair in kept.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if hi - lo < 2 {
            continue;
        }
        let span = (hi - lo) as f64;
        for i in lo + 1..hi {
            let w = (i - lo) as f64 / span;
            repaired[i] = samples[lo] + w * (samples[hi] - samples[lo]);
        }
    }

    debug!(
        "[Loader] Cleaned '{}': replaced {} of {} samples",
        signal.label(),
        replaced,
        signal.len()
    );

    Ok(signal.derive(repaired))
}
