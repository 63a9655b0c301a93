//! Object-store adapter interface.
//!
//! This crate defines the capability set the striper core depends on --
//! not a concrete object-store client. A real binding (RADOS or
//! otherwise) implements [`ObjectStore`]; tests use [`mock::MemStore`].
//! Connection handling, placement, and RPC-level retries belong to
//! whatever implements the trait, not to this crate.

pub mod completion;
pub mod error;
pub mod mock;
pub mod ops;
pub mod store;
pub mod types;

pub use completion::{Completion, CompletionSender};
pub use error::{AdapterError, Result};
pub use ops::{ReadOp, ReadOpResult, WriteOp};
pub use store::ObjectStore;
pub use types::{Locker, Lockers};
