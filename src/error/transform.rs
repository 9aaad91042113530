// Wavelet transform error types and constants

use crate::error::{ErrorCode, ErrorKind};
use tracing::error;

/// Transform error code constants
///
/// Error code range: 2001-2005
pub struct TransformErrorCodes {}

impl TransformErrorCodes {
    /// Scale set empty, non-positive, or not ascending
    pub const INVALID_SCALES: i32 = 2001;

    /// Signal too short for the largest scale
    pub const INSUFFICIENT_DATA: i32 = 2002;

    /// Cross-transform inputs do not share scales or time axis
    pub const SHAPE_MISMATCH: i32 = 2003;

    /// NaN/Inf produced during the transform
    pub const COMPUTATION: i32 = 2004;

    /// Wavelet parameter outside its valid domain
    pub const INVALID_PARAMETER: i32 = 2005;
}

/// Log a transform error with structured context
pub fn log_transform_error(err: &TransformError, context: &str) {
    error!(
        "Transform error in {}: code={}, kind={}, component=WaveletEngine, message={}",
        context,
        err.code(),
        err.kind(),
        err.message()
    );
}

/// Errors raised by the CWT and XWT engines
///
/// Error code ranges: 2001-2005
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    /// Scale set violates its invariants
    #[error("Invalid scale set: {reason}")]
    InvalidScales { reason: String },

    /// Signal shorter than the largest scale requires
    #[error("Insufficient data: need at least {required} samples, got {available}")]
    InsufficientData { required: usize, available: usize },

    /// Inputs to the cross transform are incompatible
    #[error("Shape mismatch: {reason}")]
    ShapeMismatch { reason: String },

    /// Non-finite value produced by the transform
    #[error("Numerical failure: {reason}")]
    Computation { reason: String },

    /// Wavelet parameter is not usable
    #[error("Invalid wavelet parameter {name}={value}")]
    InvalidParameter { name: String, value: f64 },
}

impl ErrorCode for TransformError {
    fn code(&self) -> i32 {
        match self {
            TransformError::InvalidScales { .. } => TransformErrorCodes::INVALID_SCALES,
            TransformError::InsufficientData { .. } => TransformErrorCodes::INSUFFICIENT_DATA,
            TransformError::ShapeMismatch { .. } => TransformErrorCodes::SHAPE_MISMATCH,
            TransformError::Computation { .. } => TransformErrorCodes::COMPUTATION,
            TransformError::InvalidParameter { .. } => TransformErrorCodes::INVALID_PARAMETER,
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }

    fn kind(&self) -> ErrorKind {
        match self {
            TransformError::InvalidScales { .. } => ErrorKind::FormatError,
            TransformError::InsufficientData { .. } => ErrorKind::InsufficientDataError,
            TransformError::ShapeMismatch { .. } => ErrorKind::ShapeMismatchError,
            TransformError::Computation { .. } | TransformError::InvalidParameter { .. } => {
                ErrorKind::ComputationError
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_error_codes() {
        assert_eq!(
            TransformError::InsufficientData {
                required: 10,
                available: 5
            }
            .code(),
            TransformErrorCodes::INSUFFICIENT_DATA
        );
        assert_eq!(
            TransformError::Computation {
                reason: "nan".to_string()
            }
            .code(),
            TransformErrorCodes::COMPUTATION
        );
    }

    #[test]
    fn test_transform_error_messages() {
        let err = TransformError::InsufficientData {
            required: 274,
            available: 100,
        };
        assert_eq!(
            err.message(),
            "Insufficient data: need at least 274 samples, got 100"
        );
        assert_eq!(err.kind(), ErrorKind::InsufficientDataError);

        let err = TransformError::InvalidParameter {
            name: "omega0".to_string(),
            value: -1.0,
        };
        assert_eq!(err.kind(), ErrorKind::ComputationError);
    }
}
