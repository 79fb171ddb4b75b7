//! Keyed access to JSON request bodies.

use serde_json::{Map, Value};

use super::error::ApiError;

/// A JSON object body.
///
/// Lookups of required keys fail with [`ApiError::MissingField`], which the
/// classifier reports as a client error but still logs, since a missing key
/// often points at a handler reading the wrong field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Parses a JSON object. Non-object JSON is a validation failure.
    pub fn from_slice(body: &[u8]) -> Result<Self, ApiError> {
        match serde_json::from_slice::<Value>(body)? {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ApiError::ValidationFailure(format!(
                "expected a JSON object, got {}",
                type_name(&other)
            ))),
        }
    }

    pub fn require(&self, key: &str) -> Result<&Value, ApiError> {
        self.0.get(key).ok_or_else(|| ApiError::missing_field(key))
    }

    /// Required string value. A present key of another type is a validation
    /// failure, not a missing key.
    pub fn require_str(&self, key: &str) -> Result<&str, ApiError> {
        let value = self.require(key)?;
        value.as_str().ok_or_else(|| {
            ApiError::ValidationFailure(format!("`{key}` must be a string, got {}", type_name(value)))
        })
    }

    #[must_use]
    pub fn optional(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
