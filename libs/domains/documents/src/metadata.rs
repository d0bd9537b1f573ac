//! Document metadata: a string-keyed map of scalar or nested values.
//!
//! Values are validated when they enter the system. `null` and arrays are
//! rejected because the vector store cannot filter or round-trip them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{DocumentError, DocumentResult};

pub type Metadata = BTreeMap<String, MetadataValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Map(Metadata),
}

/// Why a JSON value cannot be used as metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidMetadata(String);

impl fmt::Display for InvalidMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvalidMetadata {}

impl MetadataValue {
    fn from_json(value: Value, path: &str) -> Result<Self, InvalidMetadata> {
        match value {
            Value::Bool(b) => Ok(MetadataValue::Bool(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(MetadataValue::Int(i)),
                None => n.as_f64().map(MetadataValue::Float).ok_or_else(|| {
                    InvalidMetadata(format!("metadata value at '{path}' is not a finite number"))
                }),
            },
            Value::String(s) => Ok(MetadataValue::Str(s)),
            Value::Object(map) => map_from_json(map, path).map(MetadataValue::Map),
            Value::Null => Err(InvalidMetadata(format!(
                "metadata value at '{path}' is null"
            ))),
            Value::Array(_) => Err(InvalidMetadata(format!(
                "metadata value at '{path}' is an array; use a string, number, boolean or object"
            ))),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

fn map_from_json(map: Map<String, Value>, parent: &str) -> Result<Metadata, InvalidMetadata> {
    map.into_iter()
        .map(|(key, value)| {
            let path = if parent.is_empty() {
                key.clone()
            } else {
                format!("{parent}.{key}")
            };
            MetadataValue::from_json(value, &path).map(|v| (key, v))
        })
        .collect()
}

impl TryFrom<Value> for MetadataValue {
    type Error = InvalidMetadata;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        MetadataValue::from_json(value, "")
    }
}

impl From<MetadataValue> for Value {
    fn from(value: MetadataValue) -> Self {
        match value {
            MetadataValue::Bool(b) => Value::Bool(b),
            MetadataValue::Int(i) => Value::Number(i.into()),
            MetadataValue::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
            MetadataValue::Str(s) => Value::String(s),
            MetadataValue::Map(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Str(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Str(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

/// Validate a JSON object as metadata.
pub fn metadata_from_json(map: Map<String, Value>) -> Result<Metadata, InvalidMetadata> {
    map_from_json(map, "")
}

/// `{ index: position }`, the metadata given to documents that arrive without any.
pub fn index_metadata(position: usize) -> Metadata {
    Metadata::from([("index".to_string(), MetadataValue::Int(position as i64))])
}

/// Interpret the free-form metadata text typed next to a document.
///
/// - a JSON object becomes the metadata, after validation
/// - any other non-empty text (plain words, JSON scalars, arrays) is kept
///   verbatim as `{ value: <trimmed text> }`
/// - empty text falls back to `{ index: position }`
pub fn interpret_metadata(raw: &str, position: usize) -> DocumentResult<Metadata> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(index_metadata(position));
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => metadata_from_json(map)
            .map_err(|e| DocumentError::validation(format!("invalid metadata: {e}"))),
        _ => Ok(Metadata::from([(
            "value".to_string(),
            MetadataValue::Str(trimmed.to_string()),
        )])),
    }
}

/// Flatten metadata for stores that only accept scalar values: nested maps
/// are encoded as JSON strings.
pub fn flatten_for_store(metadata: &Metadata) -> Map<String, Value> {
    metadata
        .iter()
        .map(|(key, value)| {
            let flat = match value {
                MetadataValue::Map(_) => Value::String(Value::from(value.clone()).to_string()),
                scalar => Value::from(scalar.clone()),
            };
            (key.clone(), flat)
        })
        .collect()
}

/// Read metadata returned by a store. `null` entries are dropped rather than
/// failing the whole response.
pub fn metadata_from_store(value: Value) -> Result<Metadata, InvalidMetadata> {
    match value {
        Value::Null => Ok(Metadata::new()),
        Value::Object(map) => map
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| MetadataValue::from_json(v, &k).map(|v| (k, v)))
            .collect(),
        other => Err(InvalidMetadata(format!(
            "expected a metadata object, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_object_is_parsed() {
        let metadata = interpret_metadata(r#"{"a":1}"#, 0).unwrap();
        assert_eq!(metadata, Metadata::from([("a".into(), MetadataValue::Int(1))]));
    }

    #[test]
    fn test_plain_text_is_kept_as_value() {
        let metadata = interpret_metadata("  not json ", 3).unwrap();
        assert_eq!(
            metadata,
            Metadata::from([("value".into(), MetadataValue::from("not json"))])
        );
    }

    #[test]
    fn test_empty_falls_back_to_index() {
        assert_eq!(interpret_metadata("   ", 2).unwrap(), index_metadata(2));
    }

    #[test]
    fn test_json_scalar_is_treated_as_text() {
        let metadata = interpret_metadata("42", 0).unwrap();
        assert_eq!(metadata["value"], MetadataValue::from("42"));
    }

    #[test]
    fn test_null_value_is_rejected() {
        let err = interpret_metadata(r#"{"a":null}"#, 0).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn test_nested_array_is_rejected_with_path() {
        let err = interpret_metadata(r#"{"outer":{"tags":["x"]}}"#, 0).unwrap_err();
        assert!(err.to_string().contains("outer.tags"));
    }

    #[test]
    fn test_number_kinds() {
        let value: MetadataValue = serde_json::from_value(json!(1.5)).unwrap();
        assert_eq!(value, MetadataValue::Float(1.5));

        let value: MetadataValue = serde_json::from_value(json!(-7)).unwrap();
        assert_eq!(value, MetadataValue::Int(-7));
    }

    #[test]
    fn test_serialize_roundtrip_shape() {
        let metadata = interpret_metadata(r#"{"category":"pricing","meta":{"v":true}}"#, 0).unwrap();
        assert_eq!(
            serde_json::to_value(&metadata).unwrap(),
            json!({"category": "pricing", "meta": {"v": true}})
        );
    }

    #[test]
    fn test_flatten_encodes_nested_maps() {
        let metadata = interpret_metadata(r#"{"a":1,"nested":{"b":"c"}}"#, 0).unwrap();
        let flat = flatten_for_store(&metadata);
        assert_eq!(flat["a"], json!(1));
        assert_eq!(flat["nested"], json!(r#"{"b":"c"}"#));
    }

    #[test]
    fn test_metadata_from_store_skips_nulls() {
        let metadata = metadata_from_store(json!({"a": "x", "b": null})).unwrap();
        assert_eq!(metadata.len(), 1);
        assert!(metadata_from_store(Value::Null).unwrap().is_empty());
        assert!(metadata_from_store(json!([1])).is_err());
    }
}
