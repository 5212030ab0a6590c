//! # bitclock-core
//!
//! Foundation crate for the bitclock telemetry client.
//! Defines the event model, validation rules, errors, configuration,
//! the one-shot primitive, and tracing setup. `bitclock-client` builds the
//! delivery pipeline on top of it.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod once;
pub mod tracing;
pub mod validation;

// Re-export the most commonly used types at the crate root.
pub use config::{ClientConfig, ConfigStore};
pub use errors::{BitclockError, BitclockResult};
pub use models::{Dimensions, Event, EventType, EventValue, Scalar, Source, WaterfallElement};
pub use once::OneShot;
