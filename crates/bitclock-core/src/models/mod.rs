//! Event model: the records a transaction produces and the envelope the
//! sender posts.

pub mod dimensions;
pub mod envelope;
pub mod event;
pub mod waterfall_element;

pub use dimensions::{Dimensions, Scalar};
pub use envelope::{EventEnvelope, Source};
pub use event::{Event, EventType, EventValue};
pub use waterfall_element::WaterfallElement;
