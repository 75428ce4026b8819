use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source directory does not exist or is not a directory: {0}")]
    SourceMissing(PathBuf),

    #[error("Archive destination exists and is not a regular file: {0}")]
    ArchiveConflict(PathBuf),

    #[error("Archive operation failed: {0}")]
    Archive(String),

    #[error("Upload rejected: authentication failure: {0}")]
    UploadAuth(String),

    #[error("Upload failed: network error: {0}")]
    UploadNetwork(String),

    #[error("Upload rejected by storage backend: {0}")]
    UploadRejected(String),

    #[error("Node control failed: {0}")]
    NodeControl(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SnapshotError>;
