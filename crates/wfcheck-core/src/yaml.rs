use serde_yaml::{Mapping, Value};

/// Dynamic kind of a YAML node, as shown in error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "map",
        Value::Tagged(_) => "tagged",
    }
}

/// Whether the node is a scalar that can stand in for a string.
pub fn is_string_like(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(_) | Value::Number(_) | Value::String(_)
    )
}

/// Coerce a string-like scalar into its shortest canonical string form.
///
/// Booleans become `true`/`false`, integers keep their digits, and floats
/// use the host's shortest round-trip representation. Already-string values
/// pass through unchanged, which makes the coercion idempotent.
pub fn canonical_string(value: &Value) -> Option<String> {
    match value {
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                Some(n.to_string())
            }
        }
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// String form of a mapping key, for whitelist checks and error paths.
///
/// YAML 1.1 scalars like `on` and `off` parse as booleans, so boolean keys
/// are rendered back to their workflow spelling.
pub fn key_string(key: &Value) -> Option<String> {
    match key {
        Value::Bool(true) => Some("on".to_string()),
        Value::Bool(false) => Some("off".to_string()),
        other => canonical_string(other),
    }
}

/// Look up the `on` block of a workflow mapping.
///
/// A bare `on:` key parses as `Value::Bool(true)` under YAML 1.1, so both
/// spellings are checked.
pub fn on_block(map: &Mapping) -> Option<&Value> {
    map.get("on").or_else(|| map.get(Value::Bool(true)))
}
