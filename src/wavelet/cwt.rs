// CWT engine - continuous wavelet transform of a single signal
//
// The transform at scale s and time n is the convolution
//
//   W(s, n) = Σ_n' x[n'] · s^{-1/2} · ψ*((n' - n) / s)
//
// evaluated either in the Fourier domain (default) or directly in time.
// The Fourier path multiplies the signal spectrum by √(2πs) · ψ̂*(sω) and
// inverts. The signal is zero-padded far enough past its end that the
// circular convolution never wraps, so both paths agree: the signal is
// treated as zero outside its span and the cone of influence marks where
// that matters.

use ndarray::Array2;
use num_complex::Complex64;
use rustfft::FftPlanner;
use std::f64::consts::PI;
use tracing::debug;

use super::morlet::{Wavelet, WaveletKind};
use super::result::WaveletTransformResult;
use super::scales::ScaleSet;
use crate::error::TransformError;
use crate::signal::Signal;

/// Kernel half-width in e-folding times; the Gaussian envelope is below
/// e^{-16} beyond it
const KERNEL_HALF_WIDTH_EFOLDS: f64 = 4.0;

/// CWT computation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CwtMethod {
    /// FFT-based convolution
    #[default]
    Fft,
    /// Direct time-domain convolution with a truncated kernel
    Direct,
}

/// Continuous wavelet transform engine
///
/// Holds only the wavelet choice; every `compute` call is a pure function
/// of its inputs.
pub struct CwtEngine {
    wavelet: Box<dyn Wavelet>,
    kind: WaveletKind,
    param: f64,
    method: CwtMethod,
}

impl CwtEngine {
    /// Create an engine for a wavelet family and its parameter (ω0 for Morlet)
    pub fn new(kind: WaveletKind, param: f64) -> Result<Self, TransformError> {
        Ok(Self {
            wavelet: kind.instantiate(param)?,
            kind,
            param,
            method: CwtMethod::Fft,
        })
    }

    pub fn with_method(mut self, method: CwtMethod) -> Self {
        self.method = method;
        self
    }

    pub fn wavelet(&self) -> &dyn Wavelet {
        self.wavelet.as_ref()
    }

    /// Smallest signal length accepted for a scale set
    ///
    /// Twice the e-folding time of the largest scale, so that at least one
    /// sample of the largest scale lies outside the cone of influence.
    pub fn min_signal_length(&self, scales: &ScaleSet) -> usize {
        (2.0 * self.wavelet.efolding_factor() * scales.max()).ceil() as usize
    }

    /// Transform a signal over a scale set
    ///
    /// # Errors
    /// - `InsufficientData` if the signal is shorter than
    ///   [`CwtEngine::min_signal_length`]
    /// - `Computation` if the signal or any coefficient is non-finite
    pub fn compute(
        &self,
        signal: &Signal,
        scales: &ScaleSet,
    ) -> Result<WaveletTransformResult, TransformError> {
        let n = signal.len();
        let required = self.min_signal_length(scales);
        if n < required.max(2) {
            return Err(TransformError::InsufficientData {
                required: required.max(2),
                available: n,
            });
        }
        if signal.samples().iter().any(|v| !v.is_finite()) {
            return Err(TransformError::Computation {
                reason: format!("signal '{}' contains non-finite samples", signal.label()),
            });
        }

        debug!(
            "[Cwt] '{}': {} samples x {} scales ({}), method={:?}",
            signal.label(),
            n,
            scales.len(),
            self.wavelet.name(),
            self.method
        );

        let coefficients = match self.method {
            CwtMethod::Fft => self.convolve_fft(signal.samples(), scales)?,
            CwtMethod::Direct => self.convolve_direct(signal.samples(), scales)?,
        };

        let dt = signal.sampling_interval();
        let efold = self.wavelet.efolding_factor();
        let coi = scales.iter().map(|&s| efold * s * dt).collect();

        Ok(WaveletTransformResult {
            coefficients,
            scales: scales.clone(),
            frequencies: scales.frequencies(dt, self.wavelet.as_ref()),
            coi,
            sampling_interval: dt,
            start_time: signal.start_time(),
            center_frequency: self.wavelet.center_frequency(),
            efolding_factor: efold,
            wavelet: self.kind,
            wavelet_param: self.param,
            label: signal.label().to_string(),
        })
    }

    fn convolve_fft(
        &self,
        samples: &[f64],
        scales: &ScaleSet,
    ) -> Result<Array2<Complex64>, TransformError> {
        let n = samples.len();
        let guard = (KERNEL_HALF_WIDTH_EFOLDS * self.wavelet.efolding_factor() * scales.max())
            .ceil() as usize;
        let fft_size = next_fast_len(n + guard);

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(fft_size);
        let ifft = planner.plan_fft_inverse(fft_size);

        let mut spectrum: Vec<Complex64> = samples
            .iter()
            .map(|&x| Complex64::new(x, 0.0))
            .collect();
        spectrum.resize(fft_size, Complex64::new(0.0, 0.0));
        fft.process(&mut spectrum);

        let omegas: Vec<f64> = (0..fft_size)
            .map(|k| angular_frequency(k, fft_size))
            .collect();
        let inv_size = 1.0 / fft_size as f64;

        let mut coefficients = Array2::zeros((scales.len(), n));
        let mut buffer = vec![Complex64::new(0.0, 0.0); fft_size];

        for (i, &scale) in scales.iter().enumerate() {
            let norm = (2.0 * PI * scale).sqrt();
            for ((slot, &x), &omega) in buffer.iter_mut().zip(&spectrum).zip(&omegas) {
                let daughter = self.wavelet.fourier_transform(scale * omega) * norm;
                *slot = x * daughter.conj();
            }
            ifft.process(&mut buffer);

            for (t, value) in buffer.iter().take(n).enumerate() {
                let value = *value * inv_size;
                if !value.is_finite() {
                    return Err(non_finite(scale, t));
                }
                coefficients[[i, t]] = value;
            }
        }

        Ok(coefficients)
    }

    fn convolve_direct(
        &self,
        samples: &[f64],
        scales: &ScaleSet,
    ) -> Result<Array2<Complex64>, TransformError> {
        let n = samples.len();
        let mut coefficients = Array2::zeros((scales.len(), n));

        for (i, &scale) in scales.iter().enumerate() {
            let half = (KERNEL_HALF_WIDTH_EFOLDS * self.wavelet.efolding_factor() * scale).ceil()
                as isize;
            let norm = 1.0 / scale.sqrt();
            let kernel: Vec<Complex64> = (-half..=half)
                .map(|m| self.wavelet.time_kernel(m as f64 / scale).conj() * norm)
                .collect();
            if kernel.iter().any(|k| !k.is_finite()) {
                return Err(TransformError::Computation {
                    reason: format!("non-finite kernel value at scale {}", scale),
                });
            }

            for t in 0..n {
                let lo = (t as isize - half).max(0) as usize;
                let hi = ((t as isize + half) as usize).min(n - 1);
                let mut acc = Complex64::new(0.0, 0.0);
                for (idx, &x) in samples.iter().enumerate().take(hi + 1).skip(lo) {
                    let k = (idx as isize - t as isize + half) as usize;
                    acc += kernel[k] * x;
                }
                if !acc.is_finite() {
                    return Err(non_finite(scale, t));
                }
                coefficients[[i, t]] = acc;
            }
        }

        Ok(coefficients)
    }
}

/// Continuous wavelet transform of `signal` over `scales`
///
/// Convenience wrapper around [`CwtEngine`] using the FFT method.
pub fn compute(
    signal: &Signal,
    scales: &ScaleSet,
    wavelet: WaveletKind,
    wavelet_param: f64,
) -> Result<WaveletTransformResult, TransformError> {
    CwtEngine::new(wavelet, wavelet_param)?.compute(signal, scales)
}

/// Angular frequency (radians per sample) of FFT bin `k`
fn angular_frequency(k: usize, size: usize) -> f64 {
    let k = if k <= size / 2 {
        k as f64
    } else {
        k as f64 - size as f64
    };
    2.0 * PI * k / size as f64
}

/// Next power of two (for FFT sizing)
fn next_fast_len(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

fn non_finite(scale: f64, t: usize) -> TransformError {
    TransformError::Computation {
        reason: format!("non-finite coefficient at scale {} sample {}", scale, t),
    }
}
