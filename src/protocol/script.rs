//! Element-reference wrap/unwrap across the script-execution boundary.
//!
//! Script arguments and return values cross the JSON boundary, and element
//! handles embedded anywhere inside them must survive the trip. An element
//! reference on the wire is an object with a reserved sentinel key (the
//! legacy `ELEMENT` key or the W3C key); everything else is plain JSON.
//!
//! [`ScriptValue`] models this explicitly as a tagged variant, so the
//! transform is total: scalars, arrays, nested objects, and the element
//! case are all covered, and a malformed element reference is rejected as a
//! classified script error rather than an uncaught failure.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value};

use crate::error::{Error, Result};

// ============================================================================
// Sentinel Keys
// ============================================================================

/// Legacy JSON wire protocol element-reference key.
pub const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

/// W3C element-reference key.
pub const W3C_ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

// ============================================================================
// ScriptValue
// ============================================================================

/// A script argument or return value with element references made explicit.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    /// JSON null.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON number.
    Number(serde_json::Number),
    /// JSON string.
    String(String),
    /// JSON array, recursively transformed.
    Array(Vec<ScriptValue>),
    /// Plain JSON object, recursively transformed.
    Object(Vec<(String, ScriptValue)>),
    /// An element reference by opaque handle id.
    Element(String),
}

impl ScriptValue {
    /// Convenience constructor for an element reference.
    #[inline]
    #[must_use]
    pub fn element(id: impl Into<String>) -> Self {
        Self::Element(id.into())
    }

    /// Returns the element handle id if this is an element reference.
    #[inline]
    #[must_use]
    pub fn as_element(&self) -> Option<&str> {
        match self {
            Self::Element(id) => Some(id),
            _ => None,
        }
    }
}

impl From<&str> for ScriptValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for ScriptValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ScriptValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

// ============================================================================
// Wrap
// ============================================================================

/// Wraps a [`ScriptValue`] into wire JSON.
///
/// Element references become sentinel objects carrying both the legacy and
/// the W3C key, so either server dialect can resolve them.
#[must_use]
pub fn wrap(value: &ScriptValue) -> Value {
    match value {
        ScriptValue::Null => Value::Null,
        ScriptValue::Bool(b) => Value::Bool(*b),
        ScriptValue::Number(n) => Value::Number(n.clone()),
        ScriptValue::String(s) => Value::String(s.clone()),
        ScriptValue::Array(items) => Value::Array(items.iter().map(wrap).collect()),
        ScriptValue::Object(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (key, item) in entries {
                map.insert(key.clone(), wrap(item));
            }
            Value::Object(map)
        }
        ScriptValue::Element(id) => {
            let mut map = Map::with_capacity(2);
            map.insert(LEGACY_ELEMENT_KEY.to_string(), Value::String(id.clone()));
            map.insert(W3C_ELEMENT_KEY.to_string(), Value::String(id.clone()));
            Value::Object(map)
        }
    }
}

/// Wraps a slice of script arguments into a wire JSON array.
#[must_use]
pub fn wrap_args(args: &[ScriptValue]) -> Value {
    Value::Array(args.iter().map(wrap).collect())
}

// ============================================================================
// Unwrap
// ============================================================================

/// Unwraps wire JSON into a [`ScriptValue`], recognizing element-reference
/// sentinels under either key.
///
/// # Errors
///
/// Returns a classified script error when a sentinel key is present but its
/// value is not a string — a malformed element reference must not pass
/// through as a plain object.
pub fn unwrap(value: &Value) -> Result<ScriptValue> {
    match value {
        Value::Null => Ok(ScriptValue::Null),
        Value::Bool(b) => Ok(ScriptValue::Bool(*b)),
        Value::Number(n) => Ok(ScriptValue::Number(n.clone())),
        Value::String(s) => Ok(ScriptValue::String(s.clone())),
        Value::Array(items) => items
            .iter()
            .map(unwrap)
            .collect::<Result<Vec<_>>>()
            .map(ScriptValue::Array),
        Value::Object(map) => {
            if let Some(reference) = map
                .get(W3C_ELEMENT_KEY)
                .or_else(|| map.get(LEGACY_ELEMENT_KEY))
            {
                return match reference {
                    Value::String(id) => Ok(ScriptValue::Element(id.clone())),
                    other => Err(Error::script_error(format!(
                        "malformed element reference: {other}"
                    ))),
                };
            }

            let mut entries = Vec::with_capacity(map.len());
            for (key, item) in map {
                entries.push((key.clone(), unwrap(item)?));
            }
            Ok(ScriptValue::Object(entries))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
