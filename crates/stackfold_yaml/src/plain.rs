//! Conversion of documents to plain data (JSON values).

use serde_yaml::{Mapping, Value};

use crate::error::{DocumentError, DocumentResult};
use crate::node::{describe, TaggedNode};

/// Convert a document tree to JSON, canonicalizing every tagged node.
pub fn to_plain_data(value: &Value) -> DocumentResult<serde_json::Value> {
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => serde_json::to_value(n)?,
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Sequence(items) => serde_json::Value::Array(
            items
                .iter()
                .map(to_plain_data)
                .collect::<DocumentResult<Vec<_>>>()?,
        ),
        Value::Mapping(map) => mapping_to_plain_data(map)?,
        Value::Tagged(tagged) => TaggedNode::from_tagged(tagged)?.to_plain_data()?,
    })
}

pub(crate) fn mapping_to_plain_data(map: &Mapping) -> DocumentResult<serde_json::Value> {
    let mut object = serde_json::Map::new();
    for (key, value) in map {
        object.insert(key_to_string(key)?, to_plain_data(value)?);
    }
    Ok(serde_json::Value::Object(object))
}

/// Render a scalar mapping key as a string.
pub fn key_to_string(key: &Value) -> DocumentResult<String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_string()),
        other => Err(DocumentError::InvalidKey(describe(other).to_string())),
    }
}
