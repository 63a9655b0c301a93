//! Error types for the object-store adapter boundary

use thiserror::Error;

/// Errors an [`crate::ObjectStore`] implementation may report.
///
/// This is the vocabulary the striper core reasons about; a concrete
/// adapter (RADOS, a test double, anything else) is expected to map its
/// own failure modes onto these variants.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("object already exists: {0}")]
    AlreadyExists(String),

    #[error("lock busy on {oid}/{lock_name}")]
    Busy { oid: String, lock_name: String },

    #[error("lock not held by this cookie on {oid}/{lock_name}")]
    NotLocked { oid: String, lock_name: String },

    #[error("client blocklisted")]
    Blocklisted,

    #[error("adapter I/O error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, AdapterError>;
