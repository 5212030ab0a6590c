//! Wire envelope posted to the collection endpoint.

use serde::{Deserialize, Serialize};

use super::Event;

/// Which side of the application produced the events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Client,
    #[default]
    Server,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Server => "server",
        }
    }
}

/// `{ version, env, userAgent?, source, events }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub version: String,
    pub env: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub source: Source,
    pub events: Vec<Event>,
}
