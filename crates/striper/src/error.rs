//! Error vocabulary surfaced by the striper and lease manager.

use striper_adapter::AdapterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StriperError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("lock busy")]
    Busy,

    #[error("lease lost")]
    LostLease,

    #[error("bad metadata: {0}")]
    BadMetadata(String),

    #[error("short write: accepted {accepted} of {requested} bytes")]
    ShortWrite { accepted: usize, requested: usize },

    #[error("adapter I/O error: {0}")]
    AdapterIo(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<AdapterError> for StriperError {
    fn from(e: AdapterError) -> Self {
        match e {
            AdapterError::NotFound(s) => StriperError::NotFound(s),
            AdapterError::AlreadyExists(s) => StriperError::AlreadyExists(s),
            AdapterError::Busy { .. } => StriperError::Busy,
            AdapterError::NotLocked { .. } => StriperError::LostLease,
            AdapterError::Blocklisted => StriperError::LostLease,
            AdapterError::Io(s) => StriperError::AdapterIo(s),
        }
    }
}

pub type Result<T> = std::result::Result<T, StriperError>;
