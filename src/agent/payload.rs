//! Inbound payload parsing
//!
//! Request bodies are untrusted. JSON payloads are checked against the
//! input type's derived schema before deserialisation so that a violation
//! (missing field, wrong type, wrong array length) is reported in full.

use crate::error::{AgentError, AgentResult};
use crate::schema::{schema_for, validate_instance};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Parse a JSON body and validate it against `T`'s schema
pub fn parse_json_payload<T: DeserializeOwned + JsonSchema>(body: &[u8]) -> AgentResult<T> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AgentError::invalid_input(format!("Request body is not valid JSON: {e}")))?;
    parse_json_value(value)
}

/// Validate an already-parsed JSON value against `T`'s schema
pub fn parse_json_value<T: DeserializeOwned + JsonSchema>(value: Value) -> AgentResult<T> {
    let schema = schema_for::<T>().map_err(AgentError::internal_error)?;
    validate_instance(&schema, &value).map_err(AgentError::invalid_input)?;

    serde_json::from_value(value).map_err(|e| AgentError::invalid_input(e.to_string()))
}

/// Read a body as UTF-8 text
pub fn parse_text_payload(body: &[u8]) -> AgentResult<String> {
    String::from_utf8(body.to_vec())
        .map_err(|e| AgentError::invalid_input(format!("Request body is not UTF-8 text: {e}")))
}

/// Read a text body that must itself contain a JSON object
pub fn parse_embedded_json_object(body: &[u8]) -> AgentResult<Map<String, Value>> {
    let text = parse_text_payload(body)?;
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(other) => Err(AgentError::invalid_input(format!(
            "Expected a JSON object in the request text, got {}",
            json_type_name(&other)
        ))),
        Err(e) => Err(AgentError::invalid_input(format!(
            "Request text does not contain valid JSON: {e}"
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
