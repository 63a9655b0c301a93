//! The `ObjectStore` capability trait.
//!
//! The striper core is written against this trait, never against a
//! concrete client. A real deployment plugs in a RADOS binding; tests
//! plug in [`crate::mock::MemStore`]. Connection setup, pool/placement
//! handling, and RPC-level retries all live below this trait and are
//! none of the striper's business.

use async_trait::async_trait;
use bytes::Bytes;

use crate::completion::Completion;
use crate::error::AdapterError;
use crate::ops::{ReadOp, ReadOpResult, WriteOp};
use crate::types::Lockers;

/// Abstract operations the striper consumes from an object store.
///
/// Every method that starts I/O returns `Result<Completion<T>, AdapterError>`:
/// submission itself can fail synchronously (as `aio_write`/`aio_remove`
/// do in librados), and the returned [`Completion`] separately resolves
/// to the result of the op once it finishes. Callers decide when (and
/// whether, in bulk) to wait on a completion. Methods that are always
/// used synchronously in the reference design -- reading a handful of
/// xattrs back, locking, listing lockers -- return their result directly
/// instead of through a completion, matching how the striper core
/// actually calls them.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read `len` bytes starting at `offset` from `oid`.
    async fn read_extent(
        &self,
        oid: &str,
        offset: u64,
        len: u64,
    ) -> Result<Completion<Bytes>, AdapterError>;

    /// Write `data` at `offset` in `oid`.
    async fn write_extent(
        &self,
        oid: &str,
        offset: u64,
        data: Bytes,
    ) -> Result<Completion<()>, AdapterError>;

    /// Remove `oid`. Reports `NotFound` as any other error -- whether an
    /// absent object is fine is the caller's call, not this layer's.
    async fn remove_object(&self, oid: &str) -> Result<Completion<()>, AdapterError>;

    /// Apply `ops` to `oid` as a single atomic compound write.
    async fn compound_write(
        &self,
        oid: &str,
        ops: Vec<WriteOp>,
    ) -> Result<Completion<()>, AdapterError>;

    /// Apply `ops` to `oid` as a single atomic compound read, returning
    /// one result per op in order.
    async fn compound_read(
        &self,
        oid: &str,
        ops: Vec<ReadOp>,
    ) -> Result<Vec<ReadOpResult>, AdapterError>;

    /// Take an exclusive named lock on `oid`. Returns `Busy` if another
    /// cookie already holds it.
    async fn exclusive_lock(
        &self,
        oid: &str,
        lock_name: &str,
        cookie: &str,
        description: &str,
    ) -> Result<(), AdapterError>;

    /// Release a lock previously taken with `exclusive_lock`.
    async fn unlock(&self, oid: &str, lock_name: &str, cookie: &str) -> Result<(), AdapterError>;

    /// Report who currently holds (or contends for) a lock.
    async fn list_lockers(&self, oid: &str, lock_name: &str) -> Result<Lockers, AdapterError>;

    /// Hint that placement info may be stale; refresh before retrying an
    /// operation that failed with a suspicious `NotFound`.
    async fn wait_for_latest_map(&self);
}
