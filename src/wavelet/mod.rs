// Wavelet - continuous wavelet transform of current traces
//
// Module organization:
// - morlet: Wavelet trait, WaveletKind, the Morlet mother wavelet
// - scales: ScaleSet construction and scale -> frequency mapping
// - cwt: CwtEngine (FFT and direct convolution)
// - result: WaveletTransformResult and cone-of-influence helpers
// - scalogram: power view, global spectrum, dominant frequency track

mod cwt;
mod morlet;
mod result;
mod scales;
mod scalogram;


pub use cwt::{compute, CwtEngine, CwtMethod};
pub use morlet::{Morlet, Wavelet, WaveletKind, DEFAULT_OMEGA0};
pub use result::WaveletTransformResult;
pub use scales::{ScaleSet, ScaleSpacing};
pub use scalogram::Scalogram;

pub(crate) use result::edge_mask;
