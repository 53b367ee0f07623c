//! Asynchronous file-append collaborator.
//!
//! The tracker never blocks on the log file: appends are spawned
//! fire-and-forget and their outcome is observed only via the completion
//! result, which on failure turns into an error-level console emission.

use async_trait::async_trait;
use std::io;
use std::path::Path;
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Error detail carried by a file sink completion.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to create log file: {0}")]
    Create(#[source] io::Error),
    #[error("failed to append to log file: {0}")]
    Append(#[source] io::Error),
}

/// Byte-append primitive over the log file.
///
/// No atomicity or locking guarantees beyond the underlying filesystem's;
/// concurrent appends may interleave.
#[async_trait]
pub trait FileSink: Send + Sync {
    /// Create the file at `path`, truncating any existing content.
    async fn create_or_truncate(&self, path: &Path) -> Result<(), SinkError>;

    /// Append `bytes` to the file at `path`, creating it if absent.
    async fn append(&self, path: &Path, bytes: &[u8]) -> Result<(), SinkError>;
}

/// Default sink backed by `tokio::fs`.
pub struct TokioFileSink;

#[async_trait]
impl FileSink for TokioFileSink {
    async fn create_or_truncate(&self, path: &Path) -> Result<(), SinkError> {
        tokio::fs::write(path, b"").await.map_err(SinkError::Create)
    }

    async fn append(&self, path: &Path, bytes: &[u8]) -> Result<(), SinkError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(SinkError::Append)?;
        file.write_all(bytes).await.map_err(SinkError::Append)?;
        file.flush().await.map_err(SinkError::Append)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_create_then_append() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.log");
        let sink = TokioFileSink;

        sink.create_or_truncate(&path).await.unwrap();
        sink.append(&path, b"first\n").await.unwrap();
        sink.append(&path, b"second\n").await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }

    #[tokio::test]
    async fn test_create_truncates_existing_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.log");
        let sink = TokioFileSink;

        sink.append(&path, b"stale\n").await.unwrap();
        sink.create_or_truncate(&path).await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(contents.is_empty());
    }

    #[tokio::test]
    async fn test_append_creates_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fresh.log");
        let sink = TokioFileSink;

        sink.append(&path, b"line\n").await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, "line\n");
    }

    #[tokio::test]
    async fn test_append_to_unwritable_path_fails() {
        let dir = tempdir().unwrap();
        // A path whose parent directory does not exist.
        let path = dir.path().join("missing").join("out.log");
        let sink = TokioFileSink;

        let err = sink.append(&path, b"line\n").await.unwrap_err();
        assert!(matches!(err, SinkError::Append(_)));
    }
}
