//! Observability setup for bitclock.
//! `tracing` crate with `EnvFilter`; shared structured log events in `events`.

pub mod events;
pub mod setup;

pub use setup::{init_tracing, init_tracing_with_filter};
