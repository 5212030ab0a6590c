//! # bitclock-client
//!
//! Event batching and delivery for bitclock: the queue, the
//! interval-driven scheduler, the sender, and the transaction and
//! waterfall types that produce events.
//!
//! All producer calls are synchronous and non-blocking. Network I/O runs
//! on tasks spawned onto the tokio runtime the client was built on.

pub mod auth;
pub mod engine;
pub mod queue;
pub mod scheduler;
pub mod sender;
pub mod timing;
pub mod transaction;
pub mod transport;
pub mod waterfall;

pub use engine::{Bitclock, BitclockBuilder};
pub use timing::TimingSpan;
pub use transaction::Transaction;
pub use transport::{HttpTransport, PostRequest, PostResponse, Transport};
pub use waterfall::{Waterfall, WaterfallSpan};

pub use bitclock_core::{ClientConfig, ConfigStore, Dimensions, Event, EventType, EventValue};
