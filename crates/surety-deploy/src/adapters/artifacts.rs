//! # Artifact Store
//!
//! Loads build artifacts (`<dir>/<Name>.json` with `contractName`, `abi` and
//! `bytecode`) produced by the component toolchain.

use crate::domain::interface::Artifact;
use crate::errors::ArtifactError;
use std::path::PathBuf;
use tracing::debug;

/// Directory of build artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Creates a store reading from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the artifact for `name`.
    #[must_use]
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Loads the artifact for `name`.
    pub async fn load(&self, name: &str) -> Result<Artifact, ArtifactError> {
        let path = self.path_of(name);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| ArtifactError::Io {
                path: path.clone(),
                source,
            })?;
        let artifact: Artifact =
            serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Parse {
                path: path.clone(),
                source,
            })?;

        debug!(
            artifact = %name,
            entries = artifact.abi.len(),
            path = %path.display(),
            "Loaded artifact"
        );
        Ok(artifact)
    }
}
