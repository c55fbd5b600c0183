use log::warn;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

use crate::error::{FileError, ObjectClass, SchemaError};
use crate::fetch::{fetch_action_metadata, ContentFetcher, FetchError, FileFetcher};
use crate::model::{ActionMetadata, RepoActionRef, RepoWorkflowRef, Workflow};
use crate::reader::{read_action, read_workflow};

type DocResult<T> = Result<Arc<T>, FileError>;
type CellMap<T> = Mutex<HashMap<String, Arc<OnceCell<DocResult<T>>>>>;

/// Memoized loader for workflow and action documents.
///
/// Any distinct target is fetched and parsed at most once per cache
/// lifetime; concurrent requests for the same key share one pending
/// computation, and failures are cached so a broken callee is not retried.
pub struct DocumentCache {
    files: Arc<dyn FileFetcher>,
    contents: Arc<dyn ContentFetcher>,
    fs_workflows: CellMap<Workflow>,
    repo_workflows: CellMap<Workflow>,
    repo_actions: CellMap<ActionMetadata>,
}

impl DocumentCache {
    pub fn new(files: Arc<dyn FileFetcher>, contents: Arc<dyn ContentFetcher>) -> Self {
        Self {
            files,
            contents,
            fs_workflows: Mutex::new(HashMap::new()),
            repo_workflows: Mutex::new(HashMap::new()),
            repo_actions: Mutex::new(HashMap::new()),
        }
    }

    /// Load a workflow by project-relative path.
    pub async fn workflow_from_filesystem(
        &self,
        path: &str,
        referenced_by: Option<&str>,
    ) -> DocResult<Workflow> {
        let key = canonical_path(path);
        let cell = cell_for(&self.fs_workflows, &key).await;
        cell.get_or_init(|| async {
            self.load_filesystem_workflow(&key, referenced_by).await
        })
        .await
        .clone()
    }

    /// Load a workflow out of a remote repository.
    pub async fn workflow_from_repository(
        &self,
        spec: &RepoWorkflowRef,
        referenced_by: &str,
    ) -> DocResult<Workflow> {
        let cell = cell_for(&self.repo_workflows, &spec.specifier).await;
        cell.get_or_init(|| async {
            let path = format!(".github/workflows/{}", spec.filename);
            let bytes = self
                .contents
                .fetch(&spec.owner, &spec.repo, &spec.git_ref, &path)
                .await
                .map_err(|err| {
                    translate_fetch(err, || FileError::WorkflowNotFound {
                        target: spec.specifier.clone(),
                        referenced_by: Some(referenced_by.to_string()),
                    })
                })?;
            let workflow = parse_workflow(&bytes, &spec.specifier)?;
            Ok(Arc::new(workflow))
        })
        .await
        .clone()
    }

    /// Load the metadata of a remote repository action.
    pub async fn action_from_repository(
        &self,
        spec: &RepoActionRef,
        referenced_by: &str,
    ) -> DocResult<ActionMetadata> {
        let cell = cell_for(&self.repo_actions, &spec.specifier).await;
        cell.get_or_init(|| async {
            let bytes = fetch_action_metadata(&*self.contents, spec)
                .await
                .map_err(|err| {
                    translate_fetch(err, || FileError::ActionNotFound {
                        specifier: spec.specifier.clone(),
                        referenced_by: referenced_by.to_string(),
                    })
                })?;
            let action = parse_action(&bytes, &spec.specifier)?;
            Ok(Arc::new(action))
        })
        .await
        .clone()
    }

    async fn load_filesystem_workflow(
        &self,
        key: &str,
        referenced_by: Option<&str>,
    ) -> DocResult<Workflow> {
        let bytes = self.files.fetch(Path::new(key)).await.map_err(|err| {
            if let crate::fetch::FileFetchError::Io { .. } = &err {
                warn!("reading {key}: {err}");
            }
            FileError::WorkflowNotFound {
                target: key.to_string(),
                referenced_by: referenced_by.map(str::to_string),
            }
        })?;
        let mut workflow = parse_workflow(&bytes, key)?;
        workflow.path = Some(PathBuf::from(key));
        Ok(Arc::new(workflow))
    }
}

async fn cell_for<T>(map: &CellMap<T>, key: &str) -> Arc<OnceCell<DocResult<T>>> {
    map.lock()
        .await
        .entry(key.to_string())
        .or_default()
        .clone()
}

/// Filesystem workflow keys drop the leading `./` so a path and its
/// dot-relative spelling share a cache entry.
fn canonical_path(path: &str) -> String {
    path.strip_prefix("./").unwrap_or(path).to_string()
}

fn parse_workflow(bytes: &[u8], source_name: &str) -> Result<Workflow, FileError> {
    let text = String::from_utf8_lossy(bytes);
    match read_workflow(&text) {
        Ok(read) if read.errors.is_empty() => Ok(read.workflow),
        Ok(read) => Err(FileError::WorkflowSchema {
            source_name: source_name.to_string(),
            errors: read.errors,
        }),
        Err(root) => Err(FileError::WorkflowSchema {
            source_name: source_name.to_string(),
            errors: vec![SchemaError::new(ObjectClass::Workflow, "", root.to_string())],
        }),
    }
}

fn parse_action(bytes: &[u8], specifier: &str) -> Result<ActionMetadata, FileError> {
    let text = String::from_utf8_lossy(bytes);
    match read_action(&text) {
        Ok(read) if read.errors.is_empty() => Ok(read.action),
        Ok(read) => Err(FileError::ActionSchema {
            specifier: specifier.to_string(),
            errors: read.errors,
        }),
        Err(root) => Err(FileError::ActionSchema {
            specifier: specifier.to_string(),
            errors: vec![SchemaError::new(ObjectClass::Action, "", root.to_string())],
        }),
    }
}

fn translate_fetch(err: FetchError, not_found: impl FnOnce() -> FileError) -> FileError {
    match err {
        FetchError::NotFound => not_found(),
        // Transport failures are indistinguishable from missing targets at
        // this boundary.
        FetchError::Network(cause) => {
            warn!("network failure treated as not-found: {cause}");
            not_found()
        }
        FetchError::RateLimited { reset_epoch } => FileError::RateLimited { reset_epoch },
        FetchError::Unauthorized => FileError::Unauthorized,
        FetchError::Api { status } => FileError::Api { status },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    use crate::fetch::{FileFetchError, ProjectFiles};

    struct CountingFiles {
        inner: ProjectFiles,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FileFetcher for CountingFiles {
        async fn fetch(&self, path: &Path) -> Result<Vec<u8>, FileFetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(path).await
        }
    }

    struct StaticContents {
        objects: HashMap<String, Vec<u8>>,
        calls: AtomicUsize,
    }

    impl StaticContents {
        fn new(objects: &[(&str, &str)]) -> Self {
            Self {
                objects: objects
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }

        fn empty() -> Self {
            Self::new(&[])
        }
    }

    #[async_trait]
    impl ContentFetcher for StaticContents {
        async fn fetch(
            &self,
            owner: &str,
            repo: &str,
            git_ref: &str,
            path: &str,
        ) -> Result<Vec<u8>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.objects
                .get(&format!("{owner}/{repo}@{git_ref}:{path}"))
                .cloned()
                .ok_or(FetchError::NotFound)
        }
    }

    const VALID_WORKFLOW: &str =
        "on: [push]\njobs:\n  build:\n    runs-on: ubuntu-latest\n    steps:\n      - run: make\n";

    fn project_with(files: &[(&str, &str)]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        let workflows = tmp.path().join(".github/workflows");
        fs::create_dir_all(&workflows).unwrap();
        for (name, content) in files {
            fs::write(workflows.join(name), content).unwrap();
        }
        tmp
    }

    fn cache_over(tmp: &TempDir, contents: StaticContents) -> (DocumentCache, Arc<CountingFiles>) {
        let files = Arc::new(CountingFiles {
            inner: ProjectFiles::new(tmp.path()),
            calls: AtomicUsize::new(0),
        });
        let cache = DocumentCache::new(files.clone(), Arc::new(contents));
        (cache, files)
    }

    #[tokio::test]
    async fn test_filesystem_workflow_fetched_once() {
        let tmp = project_with(&[("ci.yml", VALID_WORKFLOW)]);
        let (cache, files) = cache_over(&tmp, StaticContents::empty());

        let first = cache
            .workflow_from_filesystem(".github/workflows/ci.yml", None)
            .await
            .unwrap();
        // The dot-relative spelling hits the same entry.
        let second = cache
            .workflow_from_filesystem("./.github/workflows/ci.yml", None)
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(files.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            first.path.as_deref(),
            Some(Path::new(".github/workflows/ci.yml"))
        );
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_fetch() {
        let tmp = project_with(&[("ci.yml", VALID_WORKFLOW)]);
        let (cache, files) = cache_over(&tmp, StaticContents::empty());

        let (a, b) = tokio::join!(
            cache.workflow_from_filesystem(".github/workflows/ci.yml", None),
            cache.workflow_from_filesystem(".github/workflows/ci.yml", None),
        );
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(files.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_are_cached() {
        let tmp = project_with(&[]);
        let (cache, files) = cache_over(&tmp, StaticContents::empty());

        for _ in 0..2 {
            let err = cache
                .workflow_from_filesystem(".github/workflows/missing.yml", Some("ci.yml"))
                .await
                .unwrap_err();
            assert_eq!(err.code(), "WORKFLOW_NOT_FOUND");
            assert_eq!(err.referenced_by(), Some("ci.yml"));
        }
        assert_eq!(files.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_schema_errors_wrapped() {
        let tmp = project_with(&[("bad.yml", "on: [push]\njobs: {}\n")]);
        let (cache, _) = cache_over(&tmp, StaticContents::empty());

        let err = cache
            .workflow_from_filesystem(".github/workflows/bad.yml", None)
            .await
            .unwrap_err();
        match &err {
            FileError::WorkflowSchema { source_name, errors } => {
                assert_eq!(source_name, ".github/workflows/bad.yml");
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].path, "jobs");
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_repository_workflow_fetch() {
        let tmp = project_with(&[]);
        let contents = StaticContents::new(&[(
            "octo/kit@v2:.github/workflows/ci.yml",
            VALID_WORKFLOW,
        )]);
        let (cache, _) = cache_over(&tmp, contents);

        let spec = RepoWorkflowRef {
            owner: "octo".to_string(),
            repo: "kit".to_string(),
            git_ref: "v2".to_string(),
            filename: "ci.yml".to_string(),
            specifier: "octo/kit/.github/workflows/ci.yml@v2".to_string(),
        };
        let workflow = cache
            .workflow_from_repository(&spec, ".github/workflows/caller.yml")
            .await
            .unwrap();
        assert!(workflow.path.is_none());
        assert!(workflow.jobs.contains_key("build"));
    }

    #[tokio::test]
    async fn test_repository_action_schema_error() {
        let tmp = project_with(&[]);
        let contents = StaticContents::new(&[(
            "eighty4/l3@v3:setup/action.yml",
            "inputs:\n  must_set:\n    required: true\n",
        )]);
        let (cache, _) = cache_over(&tmp, contents);

        let spec = RepoActionRef {
            owner: "eighty4".to_string(),
            repo: "l3".to_string(),
            subdirectory: Some("setup".to_string()),
            git_ref: "v3".to_string(),
            specifier: "eighty4/l3/setup@v3".to_string(),
        };
        let err = cache
            .action_from_repository(&spec, ".github/workflows/ci.yml")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ACTION_SCHEMA");
        assert_eq!(err.schema_errors().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_surfaces_distinctly() {
        struct RateLimiting;

        #[async_trait]
        impl ContentFetcher for RateLimiting {
            async fn fetch(
                &self,
                _owner: &str,
                _repo: &str,
                _git_ref: &str,
                _path: &str,
            ) -> Result<Vec<u8>, FetchError> {
                Err(FetchError::RateLimited {
                    reset_epoch: 1_700_000_000,
                })
            }
        }

        let tmp = project_with(&[]);
        let files = Arc::new(ProjectFiles::new(tmp.path()));
        let cache = DocumentCache::new(files, Arc::new(RateLimiting));

        let spec = RepoActionRef {
            owner: "octo".to_string(),
            repo: "kit".to_string(),
            subdirectory: None,
            git_ref: "v1".to_string(),
            specifier: "octo/kit@v1".to_string(),
        };
        let err = cache
            .action_from_repository(&spec, "ci.yml")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            FileError::RateLimited {
                reset_epoch: 1_700_000_000
            }
        );
    }
}
