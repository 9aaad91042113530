// Error types for the appliance signature pipeline
//
// Each pipeline stage owns an error enum with numeric codes so that CLI
// wrappers and reports can surface failures without string matching.
// Every variant also maps onto one of the taxonomy kinds in `ErrorKind`.

mod config;
mod load;
mod transform;

pub use config::{log_config_error, ConfigError, ConfigErrorCodes};
pub use load::{log_load_error, LoadError, LoadErrorCodes};
pub use transform::{log_transform_error, TransformError, TransformErrorCodes};

use serde::Serialize;
use std::fmt;

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;

    /// Taxonomy bucket this error belongs to
    fn kind(&self) -> ErrorKind;
}

/// Failure taxonomy shared by all pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Malformed or missing input structure
    FormatError,
    /// No usable rows remain after dropping invalid entries
    EmptyDataError,
    /// Not enough samples for the requested analysis
    InsufficientDataError,
    /// Normalization is undefined for the input
    DegenerateSignalError,
    /// Invalid segmentation bounds
    RangeError,
    /// Cross-transform inputs are incompatible
    ShapeMismatchError,
    /// Numerical failure during a transform
    ComputationError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Umbrella error for multi-stage pipeline calls.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ErrorCode for PipelineError {
    fn code(&self) -> i32 {
        match self {
            PipelineError::Load(err) => err.code(),
            PipelineError::Transform(err) => err.code(),
            PipelineError::Config(err) => err.code(),
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }

    fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Load(err) => err.kind(),
            PipelineError::Transform(err) => err.kind(),
            PipelineError::Config(err) => err.kind(),
        }
    }
}

/// Log a pipeline error through the stage-specific helper
pub fn log_pipeline_error(err: &PipelineError, context: &str) {
    match err {
        PipelineError::Load(err) => log_load_error(err, context),
        PipelineError::Transform(err) => log_transform_error(err, context),
        PipelineError::Config(err) => log_config_error(err, context),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_delegates_code_and_kind() {
        let err: PipelineError = TransformError::ShapeMismatch {
            reason: "scale sets differ".to_string(),
        }
        .into();
        assert_eq!(err.code(), TransformErrorCodes::SHAPE_MISMATCH);
        assert_eq!(err.kind(), ErrorKind::ShapeMismatchError);
        assert!(err.message().contains("scale sets differ"));
    }

    #[test]
    fn test_error_kind_display_matches_taxonomy_name() {
        assert_eq!(ErrorKind::RangeError.to_string(), "RangeError");
        assert_eq!(
            ErrorKind::DegenerateSignalError.to_string(),
            "DegenerateSignalError"
        );
    }
}
