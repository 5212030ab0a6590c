//! Flat, scalar-valued dimension maps used for server-side grouping.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A dimension value. Nested objects, arrays and `null` are not scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl Scalar {
    /// Convert a JSON value into a scalar, if it is one.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::String(s) => Some(Self::String(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

/// Ordered map of dimension name to scalar value.
///
/// Ordering is by key, so two maps with the same entries serialize and
/// key identically regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dimensions(BTreeMap<String, Scalar>);

impl Dimensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a dimension, returning `self` for chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Option<Scalar> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Scalar> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Scalar)> {
        self.0.iter()
    }

    /// Merge `other` into `self`; entries of `other` win on conflict.
    pub fn merge(&mut self, other: &Dimensions) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Left-to-right merge without mutating either side.
    pub fn merged(&self, other: &Dimensions) -> Dimensions {
        let mut out = self.clone();
        out.merge(other);
        out
    }

    /// Stable identity key for keyed timers. Equal maps produce equal keys.
    pub fn key(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| {
                let tag = match v {
                    Scalar::Bool(_) => 'b',
                    Scalar::Number(_) => 'n',
                    Scalar::String(_) => 's',
                };
                format!("{}:{k}={tag}{v}", k.len())
            })
            .collect::<Vec<_>>()
            .join(";")
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Scalar>> FromIterator<(K, V)> for Dimensions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<Dimensions> for Value {
    fn from(dimensions: Dimensions) -> Self {
        dimensions.to_value()
    }
}
