use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fmt;

use super::specifier::{ActionSpecifier, WorkflowSpecifier};

/// A job either runs steps on a runner or calls a reusable workflow,
/// never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Job {
    Steps(StepsJob),
    Uses(UsesJob),
}

impl Job {
    pub fn name(&self) -> Option<&str> {
        match self {
            Job::Steps(job) => job.name.as_deref(),
            Job::Uses(job) => job.name.as_deref(),
        }
    }
}

/// A job that runs an ordered list of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepsJob {
    pub name: Option<String>,
    pub if_cond: Option<String>,
    pub needs: Vec<String>,
    pub runs_on: RunsOn,
    pub env: IndexMap<String, String>,
    pub steps: Vec<Step>,
}

/// A job that delegates to a callable workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsesJob {
    pub name: Option<String>,
    pub if_cond: Option<String>,
    pub needs: Vec<String>,
    pub uses: WorkflowSpecifier,
    pub with: IndexMap<String, Scalar>,
}

/// The runner selection of a steps job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunsOn {
    Image(String),
    Labels(Vec<String>),
    Group { group: String, labels: Vec<String> },
}

/// A step either runs a shell command or uses an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    Run(RunStep),
    Uses(UsesStep),
}

impl Step {
    /// Human label for a step: its id, else its name, else `step[<index>]`.
    pub fn label(&self, index: usize) -> String {
        let (id, name) = match self {
            Step::Run(step) => (step.id.as_deref(), step.name.as_deref()),
            Step::Uses(step) => (step.id.as_deref(), step.name.as_deref()),
        };
        id.or(name)
            .map(str::to_string)
            .unwrap_or_else(|| format!("step[{index}]"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStep {
    pub id: Option<String>,
    pub name: Option<String>,
    pub if_cond: Option<String>,
    pub run: String,
    pub env: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsesStep {
    pub id: Option<String>,
    pub name: Option<String>,
    pub if_cond: Option<String>,
    pub uses: ActionSpecifier,
    pub with: IndexMap<String, Scalar>,
}

/// A `with:` value. Only scalars are admissible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    String(String),
}

impl Scalar {
    /// Convert a YAML scalar node, rejecting collections and null.
    pub fn from_value(value: &Value) -> Option<Scalar> {
        match value {
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => n.as_f64().map(Scalar::Number),
            Value::String(s) => Some(Scalar::String(s.clone())),
            _ => None,
        }
    }

    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Bool(_) => ScalarKind::Boolean,
            Scalar::Number(_) => ScalarKind::Number,
            Scalar::String(_) => ScalarKind::String,
        }
    }
}

/// The kind of a caller-supplied scalar, as named in analyzer messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarKind {
    Boolean,
    Number,
    String,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::Boolean => "boolean",
            ScalarKind::Number => "number",
            ScalarKind::String => "string",
        };
        f.write_str(name)
    }
}
