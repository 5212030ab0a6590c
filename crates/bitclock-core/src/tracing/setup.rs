//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::constants::LOG_ENV_VAR;

static INIT: Once = Once::new();

/// Initialize the bitclock tracing/logging system.
///
/// Reads `BITCLOCK_LOG` for the filter, e.g.
/// `BITCLOCK_LOG=bitclock_client::scheduler=debug,bitclock=info`.
/// Falls back to `bitclock=info` if unset or invalid, so warnings stay
/// visible unless explicitly silenced.
///
/// Idempotent; a subscriber installed by the host application wins.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("bitclock=info"));
    install(filter);
}

/// Initialize tracing with an explicit filter string (tests, embedding).
pub fn init_tracing_with_filter(filter: &str) {
    install(EnvFilter::new(filter));
}

fn install(filter: EnvFilter) {
    INIT.call_once(|| {
        let result = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
        if result.is_err() {
            tracing::debug!("tracing: global subscriber already set, keeping it");
        }
    });
}
