//! JSON Schema helpers
//!
//! Typed inputs and outputs derive `JsonSchema`; the derived schema is what
//! untrusted JSON (request bodies and model output alike) is checked against
//! before it is deserialised.

use schemars::JsonSchema;
use serde_json::Value;

/// Generate the JSON schema for `T`
pub fn schema_for<T: JsonSchema>() -> Result<Value, String> {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema).map_err(|e| format!("Schema serialization error: {e}"))
}

/// Validate `instance` against `schema`, collecting every violation
pub fn validate_instance(schema: &Value, instance: &Value) -> Result<(), String> {
    let validator = jsonschema::validator_for(schema)
        .map_err(|e| format!("Schema compilation error: {e}"))?;

    validator.validate(instance).map_err(|errors| {
        let error_messages: Vec<String> = errors
            .map(|e| format!("At '{}': {}", e.instance_path, e))
            .collect();
        error_messages.join("; ")
    })
}

/// Rewrite a derived schema for providers that enforce it in strict mode.
///
/// Strict mode rejects `$schema` and `title` at the root, does not accept
/// string length bounds, and requires every object to list all of its
/// properties as required and forbid extra ones. Dropped bounds are still
/// enforced by local validation against the original schema.
pub fn strict_schema(schema: &Value) -> Value {
    let mut strict = schema.clone();
    if let Value::Object(root) = &mut strict {
        root.remove("$schema");
        root.remove("title");
    }
    close_objects(&mut strict);
    strict
}

fn close_objects(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove("minLength");
            map.remove("maxLength");
            if let Some(Value::Object(properties)) = map.get("properties") {
                let required: Vec<Value> = properties.keys().cloned().map(Value::String).collect();
                map.insert("required".to_string(), Value::Array(required));
                map.insert("additionalProperties".to_string(), Value::Bool(false));
            }
            map.values_mut().for_each(close_objects);
        }
        Value::Array(items) => items.iter_mut().for_each(close_objects),
        _ => {}
    }
}
