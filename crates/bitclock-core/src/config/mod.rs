//! Configuration system for bitclock.
//! TOML-based, 3-layer resolution: env > project file > defaults, then a
//! shared read/write store for runtime mutation.

pub mod client_config;
pub mod store;

pub use client_config::{ClientConfig, ConfigLayer};
pub use store::ConfigStore;
