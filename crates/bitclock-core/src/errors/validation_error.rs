//! Event validation errors. These are logged and the offending call
//! becomes a no-op; they never reach the caller.

use super::error_code::{self, ErrorCode};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("dimensions must be a plain object, got {found}")]
    DimensionsNotObject { found: &'static str },

    #[error("dimensions must contain at least one key")]
    EmptyDimensions,

    #[error("dimension '{key}' must be a string, number or bool, got {found}")]
    NonScalarDimension { key: String, found: &'static str },

    #[error("metrics must be a plain object of finite numbers, got {found}")]
    MetricsNotObject { found: &'static str },

    #[error("metric '{key}' must be a finite number")]
    NonFiniteMetric { key: String },

    #[error("metrics must contain at least one value")]
    EmptyMetrics,

    #[error("waterfall element must be a plain object with a string 'name'")]
    InvalidElement,
}

impl ErrorCode for ValidationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DimensionsNotObject { .. }
            | Self::EmptyDimensions
            | Self::NonScalarDimension { .. } => error_code::INVALID_DIMENSIONS,
            Self::MetricsNotObject { .. } | Self::NonFiniteMetric { .. } | Self::EmptyMetrics => {
                error_code::INVALID_METRICS
            }
            Self::InvalidElement => error_code::INVALID_ELEMENT,
        }
    }
}
