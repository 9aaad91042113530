// Appliance Signature - CWT/XWT analysis of appliance current traces
// Loads recorded current waveforms, computes Morlet wavelet scalograms, and
// compares appliances through cross wavelet power, phase, and coherence

// Module declarations
pub mod config;
pub mod cross;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod signal;
pub mod wavelet;

// Re-exports for convenience
pub use config::AnalysisConfig;
pub use error::{ErrorCode, ErrorKind, PipelineError};
pub use signal::{NormalizationMethod, NormalizedSignal, Signal};
pub use wavelet::{ScaleSet, WaveletKind, WaveletTransformResult};

use tracing::Level;

/// Install a stderr fmt subscriber for binaries
///
/// Verbosity 0 logs warnings, 1 info, 2 debug, 3+ trace. Calling it more
/// than once is harmless; the first subscriber stays installed.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
