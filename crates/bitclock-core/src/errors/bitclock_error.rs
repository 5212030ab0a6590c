//! Top-level error aggregating every subsystem error via `From`.

use super::error_code::{self, ErrorCode};
use super::{ConfigError, DeliveryError, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum BitclockError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("no tokio runtime available: {reason}")]
    NoRuntime { reason: String },
}

impl ErrorCode for BitclockError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Validation(e) => e.error_code(),
            Self::Delivery(e) => e.error_code(),
            Self::NoRuntime { .. } => error_code::NO_RUNTIME,
        }
    }
}

pub type BitclockResult<T> = Result<T, BitclockError>;
