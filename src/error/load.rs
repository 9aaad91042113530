// Data loading error types and constants

use crate::error::{ErrorCode, ErrorKind};
use tracing::error;

/// Data loader error code constants
///
/// Error code range: 1001-1009
pub struct LoadErrorCodes {}

impl LoadErrorCodes {
    /// Input file could not be opened or read
    pub const IO: i32 = 1001;

    /// Input structure is malformed
    pub const FORMAT: i32 = 1002;

    /// Requested column is absent from the header
    pub const MISSING_COLUMN: i32 = 1003;

    /// Requested column holds no numeric values
    pub const NON_NUMERIC_COLUMN: i32 = 1004;

    /// Timestamp column is not uniformly spaced
    pub const NON_UNIFORM_TIMESTAMPS: i32 = 1005;

    /// Zero usable rows remain
    pub const EMPTY_DATA: i32 = 1006;

    /// Normalization is undefined for the signal
    pub const DEGENERATE_SIGNAL: i32 = 1007;

    /// Segmentation bounds are invalid
    pub const RANGE: i32 = 1008;

    /// Windowing parameters are invalid
    pub const INVALID_WINDOW: i32 = 1009;
}

/// Log a load error with structured context
pub fn log_load_error(err: &LoadError, context: &str) {
    error!(
        "Load error in {}: code={}, kind={}, component=DataLoader, message={}",
        context,
        err.code(),
        err.kind(),
        err.message()
    );
}

/// Errors raised while loading, cleaning, normalizing, or segmenting signals
///
/// Error code ranges: 1001-1009
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    /// File could not be opened or read
    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    /// Malformed input structure
    #[error("Malformed input: {reason}")]
    Format { reason: String },

    /// Named column is not present
    #[error("Column '{column}' not found (available: {available})")]
    MissingColumn { column: String, available: String },

    /// Column exists but no row parses as a number
    #[error("Column '{column}' contains no numeric values")]
    NonNumericColumn { column: String },

    /// Timestamps deviate from the median step beyond tolerance
    #[error(
        "Timestamps are non-uniform: step deviation {deviation:.6} exceeds tolerance {tolerance:.6}"
    )]
    NonUniformTimestamps { deviation: f64, tolerance: f64 },

    /// No usable samples
    #[error("No usable data: {reason}")]
    EmptyData { reason: String },

    /// Normalization undefined (zero spread)
    #[error("Cannot apply {method} normalization: {reason}")]
    DegenerateSignal { method: String, reason: String },

    /// Segment bounds invalid or outside the signal span
    #[error("Invalid segment [{start}, {end}) for signal spanning [{span_start}, {span_end}]")]
    Range {
        start: f64,
        end: f64,
        span_start: f64,
        span_end: f64,
    },

    /// Window length or overlap invalid
    #[error("Invalid window: {reason}")]
    InvalidWindow { reason: String },
}

impl ErrorCode for LoadError {
    fn code(&self) -> i32 {
        match self {
            LoadError::Io { .. } => LoadErrorCodes::IO,
            LoadError::Format { .. } => LoadErrorCodes::FORMAT,
            LoadError::MissingColumn { .. } => LoadErrorCodes::MISSING_COLUMN,
            LoadError::NonNumericColumn { .. } => LoadErrorCodes::NON_NUMERIC_COLUMN,
            LoadError::NonUniformTimestamps { .. } => LoadErrorCodes::NON_UNIFORM_TIMESTAMPS,
            LoadError::EmptyData { .. } => LoadErrorCodes::EMPTY_DATA,
            LoadError::DegenerateSignal { .. } => LoadErrorCodes::DEGENERATE_SIGNAL,
            LoadError::Range { .. } => LoadErrorCodes::RANGE,
            LoadError::InvalidWindow { .. } => LoadErrorCodes::INVALID_WINDOW,
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }

    fn kind(&self) -> ErrorKind {
        match self {
            LoadError::Io { .. }
            | LoadError::Format { .. }
            | LoadError::MissingColumn { .. }
            | LoadError::NonNumericColumn { .. }
            | LoadError::NonUniformTimestamps { .. } => ErrorKind::FormatError,
            LoadError::EmptyData { .. } => ErrorKind::EmptyDataError,
            LoadError::DegenerateSignal { .. } => ErrorKind::DegenerateSignalError,
            LoadError::Range { .. } | LoadError::InvalidWindow { .. } => ErrorKind::RangeError,
        }
    }
}

impl From<csv::Error> for LoadError {
    fn from(err: csv::Error) -> Self {
        LoadError::Format {
            reason: err.to_string(),
        }
    }
}
