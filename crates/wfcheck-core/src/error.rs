use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Class of object a schema error is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectClass {
    Workflow,
    Event,
    Job,
    Input,
    Step,
    Action,
    Output,
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectClass::Workflow => "workflow",
            ObjectClass::Event => "event",
            ObjectClass::Job => "job",
            ObjectClass::Input => "input",
            ObjectClass::Step => "step",
            ObjectClass::Action => "action",
            ObjectClass::Output => "output",
        };
        f.write_str(name)
    }
}

/// A single localized schema violation.
///
/// `path` is a dotted JSON-pointer-like string (`.` for map traversal,
/// `[i]` for sequence indices) that resolves to the erroneous node, or to
/// its immediate parent when the node is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaError {
    pub object: ObjectClass,
    pub path: String,
    pub message: String,
}

impl SchemaError {
    pub fn new(
        object: ObjectClass,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            object,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Failure to obtain any tree at all from a document.
///
/// Structural schema violations never surface here; readers accumulate
/// those as [`SchemaError`] values instead.
#[derive(Debug, Error)]
pub enum RootError {
    #[error("failed to parse YAML document")]
    Yaml(#[from] serde_yaml::Error),

    #[error("This {kind} YAML is simply the opportunity to begin again, this time with a valid {document} YAML")]
    NotAMap {
        kind: &'static str,
        document: &'static str,
    },
}

/// Domain error raised by the document cache for a single target.
///
/// Cloneable so a cached failure can be handed to every caller that raced
/// on the same key.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FileError {
    #[error("workflow `{source_name}` has schema errors")]
    WorkflowSchema {
        source_name: String,
        errors: Vec<SchemaError>,
    },

    #[error("action `{specifier}` has schema errors")]
    ActionSchema {
        specifier: String,
        errors: Vec<SchemaError>,
    },

    #[error("could not find workflow `{target}`")]
    WorkflowNotFound {
        target: String,
        referenced_by: Option<String>,
    },

    #[error("could not find action `{specifier}`")]
    ActionNotFound {
        specifier: String,
        referenced_by: String,
    },

    #[error("GitHub API rate limit exhausted")]
    RateLimited { reset_epoch: u64 },

    #[error("GitHub API request was unauthorized")]
    Unauthorized,

    #[error("GitHub API request failed with status {status}")]
    Api { status: u16 },
}

impl FileError {
    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            FileError::WorkflowSchema { .. } => "WORKFLOW_SCHEMA",
            FileError::ActionSchema { .. } => "ACTION_SCHEMA",
            FileError::WorkflowNotFound { .. } => "WORKFLOW_NOT_FOUND",
            FileError::ActionNotFound { .. } => "ACTION_NOT_FOUND",
            FileError::RateLimited { .. } => "RATE_LIMITED",
            FileError::Unauthorized => "UNAUTHORIZED",
            FileError::Api { .. } => "API",
        }
    }

    /// The schema-error list carried by schema variants.
    pub fn schema_errors(&self) -> Option<&[SchemaError]> {
        match self {
            FileError::WorkflowSchema { errors, .. }
            | FileError::ActionSchema { errors, .. } => Some(errors),
            _ => None,
        }
    }

    /// The path of the document that referenced the missing target, if any.
    pub fn referenced_by(&self) -> Option<&str> {
        match self {
            FileError::WorkflowNotFound { referenced_by, .. } => referenced_by.as_deref(),
            FileError::ActionNotFound { referenced_by, .. } => Some(referenced_by),
            _ => None,
        }
    }
}

/// Analyzer-level failure. The first of these aborts the run.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    File(#[from] FileError),

    #[error("{message}")]
    Runtime { message: String },
}

impl AnalyzeError {
    pub fn runtime(message: impl Into<String>) -> Self {
        AnalyzeError::Runtime {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            AnalyzeError::File(inner) => inner.code(),
            AnalyzeError::Runtime { .. } => "WORKFLOW_RUNTIME",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_error_message_interpolates_kind() {
        let err = RootError::NotAMap {
            kind: "sequence",
            document: "workflow",
        };
        assert_eq!(
            err.to_string(),
            "This sequence YAML is simply the opportunity to begin again, this time with a valid workflow YAML"
        );
    }

    #[test]
    fn test_error_codes() {
        let schema = FileError::WorkflowSchema {
            source_name: "ci.yml".to_string(),
            errors: Vec::new(),
        };
        assert_eq!(schema.code(), "WORKFLOW_SCHEMA");
        assert_eq!(AnalyzeError::File(schema).code(), "WORKFLOW_SCHEMA");
        assert_eq!(AnalyzeError::runtime("boom").code(), "WORKFLOW_RUNTIME");
    }

    #[test]
    fn test_object_class_serializes_lowercase() {
        let err = SchemaError::new(ObjectClass::Job, "jobs.build", "bad");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"object\":\"job\""));
    }
}
