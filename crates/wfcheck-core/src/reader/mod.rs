pub mod action;
pub mod workflow;

pub use action::{read_action, ActionRead};
pub use workflow::{read_workflow, WorkflowRead};

use crate::error::{ObjectClass, SchemaError};

/// Accumulator for localized schema errors.
///
/// Readers never bail out on a local violation; they record it here and
/// keep walking siblings.
pub(crate) struct ErrorSink {
    errors: Vec<SchemaError>,
}

impl ErrorSink {
    pub(crate) fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub(crate) fn push(
        &mut self,
        object: ObjectClass,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.errors.push(SchemaError::new(object, path, message));
    }

    pub(crate) fn into_errors(self) -> Vec<SchemaError> {
        self.errors
    }
}

/// Append a map key to a dotted path.
pub(crate) fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

/// Message for keys outside a whitelist. A single key reads as
/// "`x` is not a valid job field"; several list alphabetically.
pub(crate) fn unknown_fields_message(noun: &str, mut fields: Vec<String>) -> String {
    fields.sort();
    let list = fields
        .iter()
        .map(|f| format!("`{f}`"))
        .collect::<Vec<_>>()
        .join(", ");
    if fields.len() == 1 {
        format!("{list} is not a valid {noun}")
    } else {
        format!("{list} are not valid {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_paths() {
        assert_eq!(join("", "on"), "on");
        assert_eq!(join("on", "push"), "on.push");
        assert_eq!(join("jobs.build", "runs-on"), "jobs.build.runs-on");
    }

    #[test]
    fn test_unknown_fields_message() {
        assert_eq!(
            unknown_fields_message("job field", vec!["wheels".to_string()]),
            "`wheels` is not a valid job field"
        );
        assert_eq!(
            unknown_fields_message(
                "input field",
                vec!["zeta".to_string(), "alpha".to_string()]
            ),
            "`alpha`, `zeta` are not valid input fields"
        );
    }
}
