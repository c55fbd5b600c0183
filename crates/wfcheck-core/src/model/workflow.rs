use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::job::{Job, ScalarKind};

/// A parsed workflow document.
///
/// `path` is set by the document cache after a successful filesystem parse;
/// a partial model produced alongside schema errors may leave it unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub path: Option<PathBuf>,
    pub name: Option<String>,
    pub on: Vec<EventConfig>,
    pub jobs: IndexMap<String, Job>,
}

impl Workflow {
    /// The `workflow_call` input declarations, when the workflow is callable.
    pub fn workflow_call_inputs(&self) -> Option<&IndexMap<String, WorkflowInput>> {
        self.on.iter().find_map(|event| match event {
            EventConfig::WorkflowCall { inputs } => Some(inputs),
            _ => None,
        })
    }
}

/// One entry of the `on` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventConfig {
    PullRequest,
    Push,
    WorkflowCall {
        inputs: IndexMap<String, WorkflowInput>,
    },
    WorkflowDispatch {
        inputs: IndexMap<String, WorkflowInput>,
    },
}

impl EventConfig {
    pub fn name(&self) -> &'static str {
        match self {
            EventConfig::PullRequest => "pull_request",
            EventConfig::Push => "push",
            EventConfig::WorkflowCall { .. } => "workflow_call",
            EventConfig::WorkflowDispatch { .. } => "workflow_dispatch",
        }
    }
}

/// A declared workflow input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInput {
    pub description: Option<String>,
    pub required: Option<bool>,
    pub ty: InputType,
}

impl WorkflowInput {
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }

    pub fn has_default(&self) -> bool {
        self.ty.has_default()
    }
}

/// Input type discriminated by the `type` field.
///
/// `choice` and `environment` are only legal under `workflow_dispatch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputType {
    Boolean { default: Option<bool> },
    Number { default: Option<f64> },
    String { default: Option<String> },
    Choice {
        options: Vec<String>,
        default: Option<String>,
    },
    Environment { default: Option<String> },
}

impl InputType {
    pub fn name(&self) -> &'static str {
        match self {
            InputType::Boolean { .. } => "boolean",
            InputType::Number { .. } => "number",
            InputType::String { .. } => "string",
            InputType::Choice { .. } => "choice",
            InputType::Environment { .. } => "environment",
        }
    }

    pub fn has_default(&self) -> bool {
        match self {
            InputType::Boolean { default } => default.is_some(),
            InputType::Number { default } => default.is_some(),
            InputType::String { default } => default.is_some(),
            InputType::Choice { default, .. } => default.is_some(),
            InputType::Environment { default } => default.is_some(),
        }
    }

    /// Whether a caller-supplied scalar of `kind` satisfies this input type.
    pub fn accepts(&self, kind: ScalarKind) -> bool {
        match self {
            InputType::Boolean { .. } => kind == ScalarKind::Boolean,
            InputType::Number { .. } => kind == ScalarKind::Number,
            InputType::String { .. } | InputType::Choice { .. } => true,
            InputType::Environment { .. } => kind == ScalarKind::String,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_type_compatibility_table() {
        let boolean = InputType::Boolean { default: None };
        assert!(boolean.accepts(ScalarKind::Boolean));
        assert!(!boolean.accepts(ScalarKind::Number));
        assert!(!boolean.accepts(ScalarKind::String));

        let number = InputType::Number { default: None };
        assert!(number.accepts(ScalarKind::Number));
        assert!(!number.accepts(ScalarKind::String));

        let string = InputType::String { default: None };
        assert!(string.accepts(ScalarKind::Boolean));
        assert!(string.accepts(ScalarKind::Number));
        assert!(string.accepts(ScalarKind::String));

        let choice = InputType::Choice {
            options: vec!["a".to_string()],
            default: None,
        };
        assert!(choice.accepts(ScalarKind::Number));

        let environment = InputType::Environment { default: None };
        assert!(environment.accepts(ScalarKind::String));
        assert!(!environment.accepts(ScalarKind::Boolean));
    }

    #[test]
    fn test_required_without_default() {
        let input = WorkflowInput {
            description: None,
            required: Some(true),
            ty: InputType::Boolean { default: Some(true) },
        };
        assert!(input.is_required());
        assert!(input.has_default());
    }
}
