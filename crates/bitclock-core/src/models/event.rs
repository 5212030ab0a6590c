//! The unit of delivery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{Dimensions, WaterfallElement};

/// All event types the client produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Elapsed milliseconds between `tic` and its close.
    Timing,
    /// Occurrence count.
    Count,
    /// A single named metric value.
    Metric,
    /// Ordered list of waterfall elements.
    Waterfall,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timing => "timing",
            Self::Count => "count",
            Self::Metric => "metric",
            Self::Waterfall => "waterfall",
        }
    }
}

/// Measurement carried by an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventValue {
    Number(f64),
    Elements(Vec<WaterfallElement>),
}

impl EventValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Elements(_) => None,
        }
    }

    pub fn elements(&self) -> Option<&[WaterfallElement]> {
        match self {
            Self::Number(_) => None,
            Self::Elements(elements) => Some(elements),
        }
    }
}

impl From<f64> for EventValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Vec<WaterfallElement>> for EventValue {
    fn from(elements: Vec<WaterfallElement>) -> Self {
        Self::Elements(elements)
    }
}

/// A normalized, validated event ready for delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub value: EventValue,
    pub dimensions: Dimensions,
    /// Transaction-level free-form data, shared across its events.
    #[serde(default)]
    pub data: Map<String, Value>,
    pub transaction_id: Uuid,
    /// Stamped at dispatch time.
    pub timestamp: DateTime<Utc>,
}
