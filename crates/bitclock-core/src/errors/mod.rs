//! Error handling for bitclock.
//! One error enum per concern, `thiserror` only.

pub mod bitclock_error;
pub mod config_error;
pub mod delivery_error;
pub mod error_code;
pub mod validation_error;

pub use bitclock_error::{BitclockError, BitclockResult};
pub use config_error::ConfigError;
pub use delivery_error::DeliveryError;
pub use error_code::ErrorCode;
pub use validation_error::ValidationError;
