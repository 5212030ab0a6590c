//! Delivery errors. Always recovered inside the sender.

use super::error_code::{self, ErrorCode};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("network error: {reason}")]
    Network { reason: String },

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("serialization failed: {reason}")]
    Serialization { reason: String },

    #[error("no bucket configured, dropping {events} events")]
    MissingBucket { events: usize },
}

impl ErrorCode for DeliveryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Network { .. } => error_code::NETWORK_ERROR,
            Self::Status { .. } => error_code::HTTP_STATUS,
            Self::Serialization { .. } => error_code::SERIALIZATION_ERROR,
            Self::MissingBucket { .. } => error_code::MISSING_BUCKET,
        }
    }
}
