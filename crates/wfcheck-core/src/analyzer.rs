use futures::future::try_join_all;
use log::debug;
use regex::Regex;
use std::sync::{Arc, LazyLock};

use crate::cache::DocumentCache;
use crate::error::AnalyzeError;
use crate::fetch::{ContentFetcher, FileFetcher};
use crate::model::{
    ActionSpecifier, Job, Scalar, ScalarKind, Step, StepsJob, UsesJob, WorkflowSpecifier,
};

static EXPRESSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{\{.*\}\}").unwrap());

/// Cross-document analyzer: resolves every `uses:` edge of a workflow and
/// checks that required callee inputs are satisfiable at the call site.
pub struct Analyzer {
    cache: DocumentCache,
}

impl Analyzer {
    pub fn new(files: Arc<dyn FileFetcher>, contents: Arc<dyn ContentFetcher>) -> Self {
        Self {
            cache: DocumentCache::new(files, contents),
        }
    }

    /// Validate the workflow at the given project-relative path.
    ///
    /// Jobs are analyzed concurrently; within a job, steps are analyzed in
    /// source order so error labels reflect step indices. The first error
    /// aborts the run.
    pub async fn analyze(&self, path: &str) -> Result<(), AnalyzeError> {
        let workflow = self.cache.workflow_from_filesystem(path, None).await?;
        debug!("analyzing {path}: {} jobs", workflow.jobs.len());
        try_join_all(
            workflow
                .jobs
                .iter()
                .map(|(id, job)| self.analyze_job(path, id, job)),
        )
        .await?;
        Ok(())
    }

    async fn analyze_job(&self, origin: &str, id: &str, job: &Job) -> Result<(), AnalyzeError> {
        match job {
            Job::Uses(job) => self.analyze_workflow_call(origin, id, job).await,
            Job::Steps(job) => self.analyze_steps(origin, id, job).await,
        }
    }

    async fn analyze_workflow_call(
        &self,
        origin: &str,
        id: &str,
        job: &UsesJob,
    ) -> Result<(), AnalyzeError> {
        let callee = match &job.uses {
            WorkflowSpecifier::Filesystem { path } => {
                self.cache
                    .workflow_from_filesystem(path, Some(origin))
                    .await?
            }
            WorkflowSpecifier::Repository(spec) => {
                self.cache.workflow_from_repository(spec, origin).await?
            }
        };

        let Some(inputs) = callee.workflow_call_inputs() else {
            return Err(AnalyzeError::runtime(format!(
                "job `{id}` using a workflow requires `on.workflow_call:` in the called workflow"
            )));
        };

        for (input_id, input) in inputs {
            if !input.is_required() || input.has_default() {
                continue;
            }
            match job.with.get(input_id) {
                None => {
                    return Err(AnalyzeError::runtime(format!(
                        "input `{input_id}` is required to call workflow from job `{id}`"
                    )))
                }
                Some(value) => {
                    if let Some(kind) = supplied_kind(value) {
                        if !input.ty.accepts(kind) {
                            return Err(AnalyzeError::runtime(format!(
                                "input `{input_id}` is a `{}` input and job `{id}` cannot call workflow with a `{kind}` value",
                                input.ty.name()
                            )));
                        }
                    }
                }
            }
        }

        Ok(())
    }

    async fn analyze_steps(
        &self,
        origin: &str,
        id: &str,
        job: &StepsJob,
    ) -> Result<(), AnalyzeError> {
        for (index, step) in job.steps.iter().enumerate() {
            let Step::Uses(uses_step) = step else {
                continue;
            };
            // Docker and local actions have no metadata endpoint to check.
            let ActionSpecifier::Repository(spec) = &uses_step.uses else {
                continue;
            };

            let action = self.cache.action_from_repository(spec, origin).await?;
            for (input_id, input) in &action.inputs {
                if input.is_required()
                    && !input.has_default()
                    && !uses_step.with.contains_key(input_id)
                {
                    return Err(AnalyzeError::runtime(format!(
                        "input `{input_id}` is required to call action `{}` from `{}` in job `{id}`",
                        spec.specifier,
                        step.label(index)
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Kind of a caller-supplied scalar for type checking.
///
/// A string containing `${{…}}` whose remaining content is empty after
/// eliding every expression has no knowable kind; analysis is
/// expression-unaware and never flags it.
fn supplied_kind(value: &Scalar) -> Option<ScalarKind> {
    if let Scalar::String(text) = value {
        if text.contains("${{") && EXPRESSION_RE.replace_all(text, "").trim().is_empty() {
            return None;
        }
    }
    Some(value.kind())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supplied_kind_plain_scalars() {
        assert_eq!(
            supplied_kind(&Scalar::Bool(true)),
            Some(ScalarKind::Boolean)
        );
        assert_eq!(
            supplied_kind(&Scalar::Number(2.0)),
            Some(ScalarKind::Number)
        );
        assert_eq!(
            supplied_kind(&Scalar::String("text".to_string())),
            Some(ScalarKind::String)
        );
    }

    #[test]
    fn test_supplied_kind_pure_expression_is_unknown() {
        for raw in [
            "${{ inputs.run_tests }}",
            "  ${{ github.ref }}  ",
            "${{ a }} ${{ b }}",
        ] {
            assert_eq!(supplied_kind(&Scalar::String(raw.to_string())), None);
        }
    }

    #[test]
    fn test_supplied_kind_mixed_text_is_string() {
        assert_eq!(
            supplied_kind(&Scalar::String("ref-${{ github.sha }}".to_string())),
            Some(ScalarKind::String)
        );
        assert_eq!(
            supplied_kind(&Scalar::String("no expression".to_string())),
            Some(ScalarKind::String)
        );
    }
}
