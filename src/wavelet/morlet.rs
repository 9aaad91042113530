//! Mother wavelets
//!
//! The transform only needs a handful of properties from a wavelet: its
//! Fourier-domain shape (for FFT convolution), its time-domain kernel (for
//! direct convolution), the center frequency that maps scales onto
//! pseudo-frequencies, and the e-folding time that bounds the cone of
//! influence.

use std::f64::consts::PI;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::TransformError;

/// Default Morlet nondimensional frequency ω0
pub const DEFAULT_OMEGA0: f64 = 6.0;

/// Mother wavelet interface used by the CWT engine
///
/// All quantities are per unit scale, with time measured in samples.
pub trait Wavelet: Send + Sync {
    fn name(&self) -> String;

    /// Fourier transform of the mother wavelet at angular frequency `omega`
    /// (radians per sample)
    fn fourier_transform(&self, omega: f64) -> Complex64;

    /// Mother wavelet value at `eta` samples from its center
    fn time_kernel(&self, eta: f64) -> Complex64;

    /// Pseudo-frequency in cycles per sample at unit scale
    fn center_frequency(&self) -> f64;

    /// E-folding time at unit scale, in samples
    fn efolding_factor(&self) -> f64;
}

/// Wavelet families understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveletKind {
    #[default]
    Morlet,
}

impl WaveletKind {
    /// Construct the wavelet with its family parameter
    pub fn instantiate(self, param: f64) -> Result<Box<dyn Wavelet>, TransformError> {
        match self {
            WaveletKind::Morlet => Ok(Box::new(Morlet::new(param)?)),
        }
    }
}

/// Morlet wavelet: a complex exponential under a Gaussian envelope
///
/// ψ(η) = π^{-1/4} · e^{iω0η} · e^{-η²/2}
/// ψ̂(ω) = π^{-1/4} · e^{-(ω-ω0)²/2} for ω > 0, zero otherwise
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Morlet {
    omega0: f64,
}

impl Morlet {
    pub fn new(omega0: f64) -> Result<Self, TransformError> {
        if !omega0.is_finite() || omega0 <= 0.0 {
            return Err(TransformError::InvalidParameter {
                name: "omega0".to_string(),
                value: omega0,
            });
        }
        Ok(Self { omega0 })
    }

    pub fn omega0(&self) -> f64 {
        self.omega0
    }

    /// Fourier period per unit scale: 4π / (ω0 + √(2 + ω0²))
    pub fn fourier_factor(&self) -> f64 {
        4.0 * PI / (self.omega0 + (2.0 + self.omega0 * self.omega0).sqrt())
    }
}

impl Default for Morlet {
    fn default() -> Self {
        Self {
            omega0: DEFAULT_OMEGA0,
        }
    }
}

impl Wavelet for Morlet {
    fn name(&self) -> String {
        format!("Morlet (omega0={})", self.omega0)
    }

    fn fourier_transform(&self, omega: f64) -> Complex64 {
        if omega <= 0.0 {
            return Complex64::new(0.0, 0.0);
        }
        let d = omega - self.omega0;
        Complex64::new(PI.powf(-0.25) * (-0.5 * d * d).exp(), 0.0)
    }

    fn time_kernel(&self, eta: f64) -> Complex64 {
        let envelope = PI.powf(-0.25) * (-0.5 * eta * eta).exp();
        Complex64::from_polar(envelope, self.omega0 * eta)
    }

    fn center_frequency(&self) -> f64 {
        1.0 / self.fourier_factor()
    }

    fn efolding_factor(&self) -> f64 {
        std::f64::consts::SQRT_2
    }
}
