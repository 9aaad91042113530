// Segmentation - region-of-interest cuts and fixed-length windows

use super::Signal;
use crate::error::LoadError;

/// Relative slack (in sample intervals) when comparing bounds to sample times
const BOUND_SLACK: f64 = 1e-9;

/// Samples whose time lies in `[start, end)`
///
/// Bounds are in seconds on the signal's own time axis. The returned signal
/// starts at the time of its first sample.
///
/// # Errors
/// `Range` if `start >= end`, if the bounds extend outside
/// [`Signal::time_span`], or if no sample falls inside them.
pub fn segment(signal: &Signal, start: f64, end: f64) -> Result<Signal, LoadError> {
    let (span_start, span_end) = signal.time_span();
    let dt = signal.sampling_interval();
    let slack = BOUND_SLACK * dt;
    let range_err = || LoadError::Range {
        start,
        end,
        span_start,
        span_end,
    };

    if !start.is_finite() || !end.is_finite() || start >= end {
        return Err(range_err());
    }
    if start < span_start - slack || end > span_end + slack {
        return Err(range_err());
    }

    let n = signal.len();
    let index_of = |t: f64| -> usize {
        let pos = ((t - span_start) / dt - BOUND_SLACK).ceil();
        (pos.max(0.0) as usize).min(n)
    };
    let first = index_of(start);
    let last = index_of(end);
    if first >= last {
        return Err(range_err());
    }

    Ok(signal
        .derive(signal.samples()[first..last].to_vec())
        .with_start_time(span_start + first as f64 * dt))
}

/// Split into windows of `length` samples with fractional `overlap`
///
/// The step between window starts is `floor(length · (1 - overlap))`, at
/// least one sample. A trailing partial window is not emitted.
///
/// # Errors
/// `InvalidWindow` if `length` is zero or `overlap` is outside `[0, 1)`.
pub fn windows(signal: &Signal, length: usize, overlap: f64) -> Result<Vec<Signal>, LoadError> {
    if length == 0 {
        return Err(LoadError::InvalidWindow {
            reason: "window length must be > 0".to_string(),
        });
    }
    if !(0.0..1.0).contains(&overlap) {
        return Err(LoadError::InvalidWindow {
            reason: format!("overlap must be in [0, 1) (got {})", overlap),
        });
    }

    let step = ((length as f64 * (1.0 - overlap)) as usize).max(1);
    let dt = signal.sampling_interval();
    let samples = signal.samples();

    if samples.len() < length {
        return Ok(Vec::new());
    }

    Ok((0..=samples.len() - length)
        .step_by(step)
        .map(|i| {
            signal
                .derive(samples[i..i + length].to_vec())
                .with_start_time(signal.start_time() + i as f64 * dt)
        })
        .collect())
}
