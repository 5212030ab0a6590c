//! Shape validation for caller-supplied dimensions and metrics.
//!
//! Callers pass loosely typed `serde_json::Value`s; these functions turn
//! them into the strict model types or explain why they can't.

use serde_json::Value;

use crate::errors::ValidationError;
use crate::models::{Dimensions, Scalar};

/// Short type name used in error messages.
fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parse a dimension map. Empty maps are allowed here so that call-site
/// dimensions can be merged onto transaction dimensions first; use
/// [`validate_dimensions`] on the merged result.
pub fn parse_dimensions(value: &Value) -> Result<Dimensions, ValidationError> {
    let Value::Object(map) = value else {
        return Err(ValidationError::DimensionsNotObject {
            found: kind_of(value),
        });
    };
    let mut dimensions = Dimensions::new();
    for (key, value) in map {
        let scalar =
            Scalar::from_value(value).ok_or_else(|| ValidationError::NonScalarDimension {
                key: key.clone(),
                found: kind_of(value),
            })?;
        dimensions.insert(key.clone(), scalar);
    }
    Ok(dimensions)
}

/// A dimension map is deliverable only when it has at least one key.
pub fn validate_dimensions(dimensions: &Dimensions) -> Result<(), ValidationError> {
    if dimensions.is_empty() {
        return Err(ValidationError::EmptyDimensions);
    }
    Ok(())
}

/// Parse and fully validate a standalone dimension map.
pub fn parse_valid_dimensions(value: &Value) -> Result<Dimensions, ValidationError> {
    let dimensions = parse_dimensions(value)?;
    validate_dimensions(&dimensions)?;
    Ok(dimensions)
}

/// Validate a metrics map: every value must be a finite number.
///
/// All-or-nothing: one bad value rejects the whole map. Keys come back in
/// sorted order.
pub fn validate_metrics(value: &Value) -> Result<Vec<(String, f64)>, ValidationError> {
    let Value::Object(map) = value else {
        return Err(ValidationError::MetricsNotObject {
            found: kind_of(value),
        });
    };
    if map.is_empty() {
        return Err(ValidationError::EmptyMetrics);
    }
    map.iter()
        .map(|(key, value)| match value.as_f64() {
            Some(n) if n.is_finite() => Ok((key.clone(), n)),
            _ => Err(ValidationError::NonFiniteMetric { key: key.clone() }),
        })
        .collect()
}
