//! Operation builders for the compound read/write calls.
//!
//! `compound_write` and `compound_read` each apply an ordered list of
//! these as a single atomic operation against one object, mirroring
//! librados's `ObjectWriteOperation` / `ObjectReadOperation`.

/// One step of a compound write, applied atomically with its siblings.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Fail the whole compound op with `AlreadyExists` if the object exists.
    CreateExclusive,
    /// Set an extended attribute.
    SetXattr { key: String, value: Vec<u8> },
    /// Truncate the object's raw (non-logical) byte length.
    Truncate(u64),
}

/// One step of a compound read.
#[derive(Debug, Clone)]
pub enum ReadOp {
    GetXattr { key: String },
}

/// The result slot for one [`ReadOp`], positionally matched to the request.
#[derive(Debug, Clone)]
pub enum ReadOpResult {
    Xattr(Vec<u8>),
}

impl ReadOpResult {
    pub fn into_xattr(self) -> Vec<u8> {
        match self {
            ReadOpResult::Xattr(v) => v,
        }
    }
}
