// Configuration error types and constants

use crate::error::{ErrorCode, ErrorKind};
use tracing::error;

/// Configuration error code constants
///
/// Error code range: 3001-3003
pub struct ConfigErrorCodes {}

impl ConfigErrorCodes {
    /// Config file could not be read
    pub const IO: i32 = 3001;

    /// Config file is not valid JSON for the schema
    pub const PARSE: i32 = 3002;

    /// A field failed validation
    pub const INVALID_FIELD: i32 = 3003;
}

pub fn log_config_error(err: &ConfigError, context: &str) {
    error!(
        "Config error in {}: code={}, component=AnalysisConfig, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Configuration loading and validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse config: {reason}")]
    Parse { reason: String },

    #[error("Invalid config field '{field}': {reason}")]
    InvalidField { field: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl ErrorCode for ConfigError {
    fn code(&self) -> i32 {
        match self {
            ConfigError::Io { .. } => ConfigErrorCodes::IO,
            ConfigError::Parse { .. } => ConfigErrorCodes::PARSE,
            ConfigError::InvalidField { .. } => ConfigErrorCodes::INVALID_FIELD,
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }

    fn kind(&self) -> ErrorKind {
        ErrorKind::FormatError
    }
}
