pub mod file;
pub mod github;

pub use file::ProjectFiles;
pub use github::{GraphqlContentFetcher, RestContentFetcher};

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::RepoActionRef;

/// Failure reading a file under the project root.
#[derive(Debug, Error)]
pub enum FileFetchError {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure fetching a repository object from GitHub.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("object not found")]
    NotFound,

    #[error("rate limited, resets at epoch {reset_epoch}")]
    RateLimited { reset_epoch: u64 },

    #[error("unauthorized")]
    Unauthorized,

    #[error("unexpected status {status}")]
    Api { status: u16 },

    #[error("network error: {0}")]
    Network(String),
}

/// Capability to read a file relative to a project root.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    async fn fetch(&self, path: &Path) -> Result<Vec<u8>, FileFetchError>;
}

/// Capability to read an object out of a remote repository at a ref.
///
/// Implementations must be safe to invoke concurrently for distinct keys.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(
        &self,
        owner: &str,
        repo: &str,
        git_ref: &str,
        path: &str,
    ) -> Result<Vec<u8>, FetchError>;
}

/// Fetch the metadata document of a repository action.
///
/// Tries `action.yml` first and retries once with `action.yaml` when the
/// first filename is not found.
pub async fn fetch_action_metadata(
    fetcher: &dyn ContentFetcher,
    spec: &RepoActionRef,
) -> Result<Vec<u8>, FetchError> {
    let first = fetcher
        .fetch(
            &spec.owner,
            &spec.repo,
            &spec.git_ref,
            &spec.metadata_path("action.yml"),
        )
        .await;
    match first {
        Err(FetchError::NotFound) => {
            fetcher
                .fetch(
                    &spec.owner,
                    &spec.repo,
                    &spec.git_ref,
                    &spec.metadata_path("action.yaml"),
                )
                .await
        }
        other => other,
    }
}
