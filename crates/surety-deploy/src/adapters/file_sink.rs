//! # File Sink
//!
//! Writes the descriptor to a path on the local filesystem.
//!
//! The bytes go to a temporary file in the target directory which is then
//! renamed over the target, so readers never observe a partial descriptor.

use crate::errors::PublishError;
use crate::ports::outbound::DescriptorSink;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Descriptor sink backed by a file.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Creates a sink writing to `path`. Missing parent directories are
    /// created on write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl DescriptorSink for FileSink {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    async fn write(&self, bytes: &[u8]) -> Result<(), PublishError> {
        let path = self.path.clone();
        let bytes = bytes.to_vec();

        tokio::task::spawn_blocking(move || write_atomically(&path, &bytes))
            .await
            .map_err(|e| PublishError::Write {
                sink: self.name(),
                message: e.to_string(),
            })?
            .map_err(|e| PublishError::Write {
                sink: self.name(),
                message: e.to_string(),
            })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_creates_file_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client").join("src").join("deployments.json");
        let sink = FileSink::new(&path);

        sink.write(b"{}").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"{}");
    }

    #[tokio::test]
    async fn test_write_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployments.json");
        std::fs::write(&path, b"old content that is longer").unwrap();

        FileSink::new(&path).write(b"new").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new");
        // Only the target remains; the temporary file was renamed away.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_write_into_a_file_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let sink = FileSink::new(blocker.join("deployments.json"));
        let err = sink.write(b"{}").await.unwrap_err();

        assert!(matches!(err, PublishError::Write { ref sink, .. } if sink.contains("not-a-dir")));
    }
}
