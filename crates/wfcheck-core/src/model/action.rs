use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Metadata of an action (`action.yml` / `action.yaml`).
///
/// Only the `inputs` section is modeled; other keys are tolerated and
/// ignored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionMetadata {
    pub inputs: IndexMap<String, ActionInput>,
}

/// A declared action input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionInput {
    pub description: String,
    pub required: Option<bool>,
    pub default: Option<String>,
    pub deprecation_message: Option<String>,
}

impl ActionInput {
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }

    /// An explicit `default: null` supplies no value and counts as
    /// default-less.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_default_less() {
        let input = ActionInput {
            description: "mandatory".to_string(),
            required: Some(true),
            default: None,
            deprecation_message: None,
        };
        assert!(input.is_required());
        assert!(!input.has_default());
    }

    #[test]
    fn test_optional_by_default() {
        let input = ActionInput {
            description: "extra".to_string(),
            required: None,
            default: Some("fallback".to_string()),
            deprecation_message: None,
        };
        assert!(!input.is_required());
        assert!(input.has_default());
    }
}
