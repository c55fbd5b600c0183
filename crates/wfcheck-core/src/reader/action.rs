use indexmap::IndexMap;
use serde_yaml::Value;

use super::{join, ErrorSink};
use crate::error::{ObjectClass, RootError, SchemaError};
use crate::model::{ActionInput, ActionMetadata};
use crate::yaml::{is_string_like, key_string, value_kind};

/// Result of reading an action metadata document.
#[derive(Debug)]
pub struct ActionRead {
    pub action: ActionMetadata,
    pub errors: Vec<SchemaError>,
}

/// Read an `action.yml` document into a typed model.
///
/// Only the `inputs` section is modeled; unknown keys, at the top level and
/// inside inputs, are silently tolerated.
pub fn read_action(src: &str) -> Result<ActionRead, RootError> {
    let root: Value = serde_yaml::from_str(src)?;
    let map = match root {
        Value::Mapping(map) => map,
        other => {
            return Err(RootError::NotAMap {
                kind: value_kind(&other),
                document: "action",
            })
        }
    };

    let mut sink = ErrorSink::new();
    let mut inputs = IndexMap::new();

    match map.get("inputs") {
        None | Some(Value::Null) => {}
        Some(Value::Mapping(input_map)) => {
            for (key, body) in input_map {
                let Some(id) = key_string(key) else {
                    continue;
                };
                let path = join("inputs", &id);
                if let Some(input) = read_input(body, &path, &mut sink) {
                    inputs.insert(id, input);
                }
            }
        }
        Some(_) => sink.push(
            ObjectClass::Action,
            "inputs",
            "`inputs` must be a map of action inputs",
        ),
    }

    Ok(ActionRead {
        action: ActionMetadata { inputs },
        errors: sink.into_errors(),
    })
}

fn read_input(body: &Value, path: &str, sink: &mut ErrorSink) -> Option<ActionInput> {
    let Some(map) = body.as_mapping() else {
        sink.push(ObjectClass::Action, path, "Action input must be a map");
        return None;
    };

    let description = match map.get("description") {
        Some(value) => match value.as_str() {
            Some(text) => text.to_string(),
            None => {
                sink.push(
                    ObjectClass::Action,
                    join(path, "description"),
                    "`description` must be a string",
                );
                return None;
            }
        },
        None => {
            sink.push(
                ObjectClass::Action,
                path,
                "Action input must have a `description`",
            );
            return None;
        }
    };

    let required = match map.get("required") {
        None => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => {
            sink.push(
                ObjectClass::Action,
                join(path, "required"),
                "`required` must be a boolean",
            );
            None
        }
    };

    // An explicit `default: null` is recorded as no default.
    let default = match map.get("default") {
        None | Some(Value::Null) => None,
        Some(value) if is_string_like(value) => crate::yaml::canonical_string(value),
        Some(_) => {
            sink.push(
                ObjectClass::Action,
                join(path, "default"),
                "`default` must be a string",
            );
            None
        }
    };

    let deprecation_message = match map.get("deprecationMessage") {
        None => None,
        Some(value) => match value.as_str() {
            Some(text) => Some(text.to_string()),
            None => {
                sink.push(
                    ObjectClass::Action,
                    join(path, "deprecationMessage"),
                    "`deprecationMessage` must be a string",
                );
                None
            }
        },
    };

    Some(ActionInput {
        description,
        required,
        default,
        deprecation_message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_action() {
        let result = read_action("name: Setup\nruns:\n  using: node20\n").unwrap();
        assert!(result.errors.is_empty());
        assert!(result.action.inputs.is_empty());
    }

    #[test]
    fn test_inputs_parsed() {
        let result = read_action(
            r#"
name: Setup
inputs:
  must_set:
    description: mandatory
    required: true
  optional:
    description: has a fallback
    default: fallback
  retired:
    description: going away
    deprecationMessage: use must_set instead
"#,
        )
        .unwrap();
        assert!(result.errors.is_empty());
        assert_eq!(result.action.inputs.len(), 3);

        let must_set = &result.action.inputs["must_set"];
        assert!(must_set.is_required());
        assert!(!must_set.has_default());

        let optional = &result.action.inputs["optional"];
        assert!(!optional.is_required());
        assert_eq!(optional.default.as_deref(), Some("fallback"));

        assert_eq!(
            result.action.inputs["retired"].deprecation_message.as_deref(),
            Some("use must_set instead")
        );
    }

    #[test]
    fn test_null_default_counts_as_default_less() {
        let result = read_action(
            "inputs:\n  must_set:\n    description: mandatory\n    required: true\n    default: null\n",
        )
        .unwrap();
        assert!(result.errors.is_empty());
        assert!(!result.action.inputs["must_set"].has_default());
    }

    #[test]
    fn test_description_required() {
        let result =
            read_action("inputs:\n  must_set:\n    required: true\n").unwrap();
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "inputs.must_set");
        assert_eq!(
            result.errors[0].message,
            "Action input must have a `description`"
        );
        assert!(result.action.inputs.is_empty());
    }

    #[test]
    fn test_non_map_inputs_skipped() {
        let result = read_action("inputs: nope\n").unwrap();
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "inputs");
        assert!(result.action.inputs.is_empty());
    }

    #[test]
    fn test_unknown_top_level_keys_tolerated() {
        let result = read_action(
            "name: X\nauthor: Y\nbranding:\n  icon: zap\nruns:\n  using: docker\n",
        )
        .unwrap();
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_unknown_input_fields_tolerated() {
        let result = read_action(
            "inputs:\n  must_set:\n    description: d\n    mandatory: true\n",
        )
        .unwrap();
        assert!(result.errors.is_empty());
        assert!(result.action.inputs.contains_key("must_set"));
    }

    #[test]
    fn test_non_map_root() {
        let err = read_action("- a\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "This sequence YAML is simply the opportunity to begin again, this time with a valid action YAML"
        );
    }
}
