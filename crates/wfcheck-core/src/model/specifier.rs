use serde::{Deserialize, Serialize};

/// Target of a job-level `uses:` (a callable workflow).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowSpecifier {
    Filesystem { path: String },
    Repository(RepoWorkflowRef),
}

/// A workflow in a remote repository, e.g.
/// `owner/repo/.github/workflows/ci.yml@v2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoWorkflowRef {
    pub owner: String,
    pub repo: String,
    pub git_ref: String,
    pub filename: String,
    /// The raw `uses:` string, kept for cache keys and messages.
    pub specifier: String,
}

impl WorkflowSpecifier {
    /// Parse a job-level `uses:` value.
    ///
    /// Relative paths become filesystem references. Anything else must be
    /// exactly `owner/repo/.github/workflows/<file>.(yml|yaml)@<ref>`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.starts_with("./") || raw.starts_with("../") {
            return Ok(WorkflowSpecifier::Filesystem {
                path: raw.to_string(),
            });
        }

        let (head, git_ref) = match raw.split_once('@') {
            Some((head, git_ref)) => (head, Some(git_ref)),
            None => (raw, None),
        };

        let segments: Vec<&str> = head.split('/').collect();
        let well_formed = segments.len() == 5
            && segments[2] == ".github"
            && segments[3] == "workflows"
            && (segments[4].ends_with(".yml") || segments[4].ends_with(".yaml"));
        if !well_formed {
            return Err(
                "Workflow specifier must be in format `{owner}/{repo}/.github/workflows/{filename}.yml@{ref}`"
                    .to_string(),
            );
        }

        let git_ref = match git_ref {
            Some(r) if !r.is_empty() => r,
            _ => {
                return Err(format!(
                    "Must specify GitHub workflow ref in format `{head}@{{ref}}`"
                ))
            }
        };

        Ok(WorkflowSpecifier::Repository(RepoWorkflowRef {
            owner: segments[0].to_string(),
            repo: segments[1].to_string(),
            git_ref: git_ref.to_string(),
            filename: segments[4].to_string(),
            specifier: raw.to_string(),
        }))
    }
}

/// Target of a step-level `uses:` (an action).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionSpecifier {
    Docker { uri: String },
    Filesystem { path: String },
    Repository(RepoActionRef),
}

/// An action in a remote repository, e.g. `owner/repo/subdir@v3`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoActionRef {
    pub owner: String,
    pub repo: String,
    pub subdirectory: Option<String>,
    pub git_ref: String,
    /// The raw `uses:` string, kept for cache keys and messages.
    pub specifier: String,
}

impl RepoActionRef {
    /// Repository-relative path of the action metadata file with the given
    /// filename (`action.yml` or `action.yaml`).
    pub fn metadata_path(&self, filename: &str) -> String {
        match &self.subdirectory {
            Some(subdir) => format!("{subdir}/{filename}"),
            None => filename.to_string(),
        }
    }
}

impl ActionSpecifier {
    /// Parse a step-level `uses:` value.
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.starts_with("docker://") {
            return Ok(ActionSpecifier::Docker {
                uri: raw.to_string(),
            });
        }
        if raw.starts_with("./") || raw.starts_with("../") {
            return Ok(ActionSpecifier::Filesystem {
                path: raw.to_string(),
            });
        }

        let (head, git_ref) = match raw.split_once('@') {
            Some((head, git_ref)) => (head, Some(git_ref)),
            None => (raw, None),
        };

        let segments: Vec<&str> = head.split('/').collect();
        if segments.len() < 2 || segments.iter().any(|s| s.is_empty()) {
            return Err(
                "Action specifier must be in format `{owner}/{repo}@{ref}`".to_string()
            );
        }

        let git_ref = match git_ref {
            Some(r) if !r.is_empty() => r,
            _ => {
                return Err(format!(
                    "Must specify GitHub action ref in format `{head}@{{ref}}`"
                ))
            }
        };

        let subdirectory = if segments.len() > 2 {
            Some(segments[2..].join("/"))
        } else {
            None
        };

        Ok(ActionSpecifier::Repository(RepoActionRef {
            owner: segments[0].to_string(),
            repo: segments[1].to_string(),
            subdirectory,
            git_ref: git_ref.to_string(),
            specifier: raw.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_specifier_filesystem() {
        let spec = WorkflowSpecifier::parse("./.github/workflows/verify.yml").unwrap();
        assert_eq!(
            spec,
            WorkflowSpecifier::Filesystem {
                path: "./.github/workflows/verify.yml".to_string()
            }
        );
        assert!(matches!(
            WorkflowSpecifier::parse("../shared/.github/workflows/ci.yaml").unwrap(),
            WorkflowSpecifier::Filesystem { .. }
        ));
    }

    #[test]
    fn test_workflow_specifier_repository() {
        let raw = "eighty4/l3/.github/workflows/verify.yml@main";
        match WorkflowSpecifier::parse(raw).unwrap() {
            WorkflowSpecifier::Repository(r) => {
                assert_eq!(r.owner, "eighty4");
                assert_eq!(r.repo, "l3");
                assert_eq!(r.git_ref, "main");
                assert_eq!(r.filename, "verify.yml");
                assert_eq!(r.specifier, raw);
            }
            other => panic!("expected repository specifier, got {other:?}"),
        }
    }

    #[test]
    fn test_workflow_specifier_requires_ref() {
        let err = WorkflowSpecifier::parse("a/b/.github/workflows/ci.yml").unwrap_err();
        assert_eq!(
            err,
            "Must specify GitHub workflow ref in format `a/b/.github/workflows/ci.yml@{ref}`"
        );
    }

    #[test]
    fn test_workflow_specifier_requires_five_segments() {
        for bad in [
            "a/b@v1",
            "a/b/c/d/e.yml@v1",
            "a/b/.github/workflows/ci.toml@v1",
            "a/b/.github/actions/ci.yml@v1",
        ] {
            assert!(WorkflowSpecifier::parse(bad).is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn test_action_specifier_docker() {
        assert_eq!(
            ActionSpecifier::parse("docker://alpine:3.19").unwrap(),
            ActionSpecifier::Docker {
                uri: "docker://alpine:3.19".to_string()
            }
        );
    }

    #[test]
    fn test_action_specifier_filesystem() {
        assert!(matches!(
            ActionSpecifier::parse("./.github/actions/setup").unwrap(),
            ActionSpecifier::Filesystem { .. }
        ));
    }

    #[test]
    fn test_action_specifier_repository() {
        match ActionSpecifier::parse("actions/checkout@v4").unwrap() {
            ActionSpecifier::Repository(r) => {
                assert_eq!(r.owner, "actions");
                assert_eq!(r.repo, "checkout");
                assert_eq!(r.subdirectory, None);
                assert_eq!(r.git_ref, "v4");
            }
            other => panic!("expected repository specifier, got {other:?}"),
        }
    }

    #[test]
    fn test_action_specifier_subdirectory() {
        match ActionSpecifier::parse("github/codeql-action/upload-sarif@v3").unwrap() {
            ActionSpecifier::Repository(r) => {
                assert_eq!(r.subdirectory.as_deref(), Some("upload-sarif"));
                assert_eq!(r.metadata_path("action.yml"), "upload-sarif/action.yml");
            }
            other => panic!("expected repository specifier, got {other:?}"),
        }
    }

    #[test]
    fn test_action_specifier_rejects_missing_ref() {
        assert!(ActionSpecifier::parse("actions/checkout").is_err());
        assert!(ActionSpecifier::parse("actions/checkout@").is_err());
        assert!(ActionSpecifier::parse("checkout@v4").is_err());
    }
}
