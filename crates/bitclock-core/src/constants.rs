//! Compiled constants shared by the core and client crates.

use std::ops::RangeInclusive;
use std::time::Duration;

/// Client version reported in every delivery envelope.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default collection endpoint.
pub const DEFAULT_REPORTING_ENDPOINT: &str = "https://hub.bitclock.io";

/// Default API version segment of the event URL.
pub const DEFAULT_REPORTING_API_VERSION: &str = "v0";

/// Default maximum number of events per delivery batch.
pub const DEFAULT_MAX_CHUNK_SIZE: u32 = 200;

/// Default minimum spacing between two sends, in milliseconds.
pub const DEFAULT_REPORTING_INTERVAL_MS: u64 = 5_000;

/// Default HTTP request timeout, in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Values of `max_chunk_size` outside this range are rejected.
pub const CHUNK_SIZE_RANGE: RangeInclusive<u32> = 1..=1_000;

/// Values of `max_chunk_size` outside this range are accepted with a warning.
pub const RECOMMENDED_CHUNK_SIZE_RANGE: RangeInclusive<u32> = 50..=500;

/// Values of `reporting_interval_ms` outside this range are rejected.
pub const REPORTING_INTERVAL_RANGE: RangeInclusive<u64> = 10..=3_600_000;

/// Values of `reporting_interval_ms` outside this range are accepted with a warning.
pub const RECOMMENDED_REPORTING_INTERVAL_RANGE: RangeInclusive<u64> = 500..=300_000;

/// Lower bound for the scheduler's adaptive re-check delay.
pub const MIN_POLL_DELAY: Duration = Duration::from_millis(10);

/// Environment variable and cookie name carrying the API token.
pub const TOKEN_ENV_VAR: &str = "BITCLOCK_TOKEN";

/// Environment variable naming the deployment environment.
pub const ENV_ENV_VAR: &str = "BITCLOCK_ENV";

/// Environment variable holding the tracing filter.
pub const LOG_ENV_VAR: &str = "BITCLOCK_LOG";

/// Project config file name.
pub const CONFIG_FILE_NAME: &str = "bitclock.toml";

/// Dimension key added to every metric event.
pub const METRIC_DIMENSION_KEY: &str = "metric";
