//! ErrorCode trait for structured log fields.

/// Every error enum provides a stable code string so log consumers can
/// group failures without parsing messages.
pub trait ErrorCode {
    /// Returns the code string (e.g., "DELIVERY_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const INVALID_DIMENSIONS: &str = "INVALID_DIMENSIONS";
pub const INVALID_METRICS: &str = "INVALID_METRICS";
pub const INVALID_ELEMENT: &str = "INVALID_ELEMENT";
pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
pub const HTTP_STATUS: &str = "HTTP_STATUS";
pub const SERIALIZATION_ERROR: &str = "SERIALIZATION_ERROR";
pub const MISSING_BUCKET: &str = "MISSING_BUCKET";
pub const NO_RUNTIME: &str = "NO_RUNTIME";
