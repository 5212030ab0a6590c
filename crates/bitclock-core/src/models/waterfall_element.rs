//! One timed entry of a waterfall.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ValidationError;

/// `{ name, type?, offset, elapsed?, ...custom fields }`.
///
/// `offset` is milliseconds since the waterfall's init time; `elapsed` is
/// only present on spans that have been closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallElement {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub offset: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<f64>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl WaterfallElement {
    /// Build an element from caller-supplied data.
    ///
    /// `offset` and `elapsed` in the input are ignored; both are computed.
    pub fn from_value(data: Value, offset: f64) -> Result<Self, ValidationError> {
        let Value::Object(mut map) = data else {
            return Err(ValidationError::InvalidElement);
        };
        let name = match map.remove("name") {
            Some(Value::String(name)) => name,
            _ => return Err(ValidationError::InvalidElement),
        };
        let mut element = Self {
            name,
            kind: None,
            offset,
            elapsed: None,
            fields: Map::new(),
        };
        element.absorb(map);
        Ok(element)
    }

    /// Merge final fields into the element (span close). Non-object input
    /// is ignored.
    pub fn merge_fields(&mut self, data: Value) {
        if let Value::Object(mut map) = data {
            if let Some(Value::String(name)) = map.remove("name") {
                self.name = name;
            }
            self.absorb(map);
        }
    }

    /// `type` is held in exactly one place: `kind` when it is a string,
    /// `fields` otherwise. The latest value wins.
    fn absorb(&mut self, map: Map<String, Value>) {
        for (key, value) in map {
            match (key.as_str(), value) {
                ("offset" | "elapsed", _) => {}
                ("type", Value::String(kind)) => {
                    self.fields.remove("type");
                    self.kind = Some(kind);
                }
                ("type", value) => {
                    self.kind = None;
                    self.fields.insert(key, value);
                }
                (_, value) => {
                    self.fields.insert(key, value);
                }
            }
        }
    }
}
