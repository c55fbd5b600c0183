use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{FileFetchError, FileFetcher};

/// File fetcher rooted at a project directory.
#[derive(Debug, Clone)]
pub struct ProjectFiles {
    root: PathBuf,
}

impl ProjectFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl FileFetcher for ProjectFiles {
    async fn fetch(&self, path: &Path) -> Result<Vec<u8>, FileFetchError> {
        let full = self.root.join(path);
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(bytes),
            Err(source) if source.kind() == ErrorKind::NotFound => {
                Err(FileFetchError::NotFound { path: full })
            }
            Err(source) => Err(FileFetchError::Io { path: full, source }),
        }
    }
}
