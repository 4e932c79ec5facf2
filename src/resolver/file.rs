//! File transport for manifest candidates
//!
//! Reads candidates from a local directory laid out like the deployed site,
//! e.g. `public/data/races.json` for the candidate `/data/races.json`.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

use super::ManifestTransport;
use crate::utils::error::FetchError;

/// Reads candidate documents below a root directory
#[derive(Debug, Clone)]
pub struct FileTransport {
    root: PathBuf,
}

impl FileTransport {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a candidate location to a path below the root
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidLocation` for empty locations and for any
    /// location that would escape the root
    pub fn resolve_path(&self, location: &str) -> Result<PathBuf, FetchError> {
        let relative = Path::new(location.trim_start_matches('/'));

        if relative.as_os_str().is_empty() {
            return Err(FetchError::InvalidLocation(location.to_string()));
        }

        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(FetchError::InvalidLocation(location.to_string()));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ManifestTransport for FileTransport {
    async fn retrieve(&self, location: &str) -> Result<String, FetchError> {
        let path = self.resolve_path(location)?;
        tracing::debug!(path = %path.display(), "Reading manifest candidate");

        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| FetchError::Io {
                path: path.display().to_string(),
                source,
            })
    }
}
