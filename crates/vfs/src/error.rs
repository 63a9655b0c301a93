//! Error vocabulary the VFS adapter surface reports to its caller.

use striper::StriperError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VfsError {
    #[error("path does not match the pool:namespace/name grammar: {0}")]
    InvalidPath(String),

    #[error("WAL journal paths are not supported: {0}")]
    WalUnsupported(String),

    #[error("short read: got {got} of {expected} bytes")]
    ShortRead { got: usize, expected: usize },

    #[error("file does not exist")]
    DoesNotExist,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("corruption detected: {0}")]
    Corruption(String),
}

impl From<StriperError> for VfsError {
    fn from(e: StriperError) -> Self {
        match e {
            StriperError::NotFound(_) => VfsError::DoesNotExist,
            StriperError::BadMetadata(msg) => VfsError::Corruption(msg),
            other => VfsError::Io(other.to_string()),
        }
    }
}
