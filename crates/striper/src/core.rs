//! The striper core: `create`, `open`, `remove`, `read`, `write`,
//! `truncate`, `stat`, `flush`, and the allocation growth/shrink policy
//! that keeps them honest. Ported from `SimpleRADOSStriper`.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures::future;
use striper_adapter::{AdapterError, ObjectStore, ReadOp, WriteOp};
use tracing::{debug, trace, warn};

use crate::config::{Layout, Tunables};
use crate::error::{Result, StriperError};
use crate::extent::{map_range, stripe_oid};
use crate::meta::{
    decode_u64, encode_u64, XATTR_ALLOCATED, XATTR_LAYOUT_OBJECT_SIZE, XATTR_LAYOUT_STRIPE_COUNT,
    XATTR_LAYOUT_STRIPE_UNIT, XATTR_SIZE, XATTR_VERSION,
};

/// A handle onto one logical file, backed by a chain of objects rooted
/// at `name`'s stripe 0. Not `Send`-shared across tasks by design: the
/// caller is expected to serialize calls on a handle the same way SQLite
/// serializes calls on a file descriptor.
pub struct Striper {
    store: Arc<dyn ObjectStore>,
    name: String,
    layout: Layout,
    tunables: Tunables,
    size: u64,
    allocated: u64,
    version: u64,
    size_dirty: bool,
    updates: Vec<striper_adapter::Completion<()>>,
}

impl Striper {
    /// Build a handle for `name` under `tunables`. Does not touch the
    /// object store; call `create` or `open` next.
    pub fn new(store: Arc<dyn ObjectStore>, name: impl Into<String>, tunables: Tunables) -> Result<Self> {
        let layout = tunables.layout()?;
        Ok(Self {
            store,
            name: name.into(),
            layout,
            tunables,
            size: 0,
            allocated: 0,
            version: 0,
            size_dirty: false,
            updates: Vec::new(),
        })
    }

    pub(crate) fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub(crate) fn head_oid(&self) -> String {
        stripe_oid(&self.name, 0)
    }

    /// Cached logical size. Never touches the object store.
    pub fn stat(&self) -> u64 {
        self.size
    }

    /// Exclusively create the head object and its six xattrs in one
    /// compound op. The handle is not locked afterward.
    pub async fn create(&mut self) -> Result<()> {
        let head = self.head_oid();
        debug!(oid = %head, "create");
        let ops = vec![
            WriteOp::CreateExclusive,
            WriteOp::SetXattr {
                key: XATTR_VERSION.into(),
                value: encode_u64(0),
            },
            WriteOp::SetXattr {
                key: XATTR_SIZE.into(),
                value: encode_u64(0),
            },
            WriteOp::SetXattr {
                key: XATTR_ALLOCATED.into(),
                value: encode_u64(0),
            },
            WriteOp::SetXattr {
                key: XATTR_LAYOUT_STRIPE_UNIT.into(),
                value: encode_u64(self.layout.stripe_unit),
            },
            WriteOp::SetXattr {
                key: XATTR_LAYOUT_STRIPE_COUNT.into(),
                value: encode_u64(self.layout.stripe_count),
            },
            WriteOp::SetXattr {
                key: XATTR_LAYOUT_OBJECT_SIZE.into(),
                value: encode_u64(self.layout.object_size),
            },
        ];
        self.compound_write_retrying_stale_map(&head, ops).await
    }

    /// Submit a compound write, retrying exactly once after
    /// `wait_for_latest_map` if either the submission or the completion
    /// reports `NotFound` -- a stale placement view masquerading as a
    /// missing object. A second `NotFound` is reported as-is.
    async fn compound_write_retrying_stale_map(&self, oid: &str, ops: Vec<WriteOp>) -> Result<()> {
        match self.store.compound_write(oid, ops.clone()).await {
            Ok(completion) => match completion.wait_for_complete().await {
                Ok(()) => Ok(()),
                Err(e) if is_stale_placement_notfound(&e) => {
                    self.store.wait_for_latest_map().await;
                    self.store
                        .compound_write(oid, ops)
                        .await?
                        .wait_for_complete()
                        .await?;
                    Ok(())
                }
                Err(e) => Err(e.into()),
            },
            Err(e) if is_stale_placement_notfound(&e) => {
                self.store.wait_for_latest_map().await;
                self.store
                    .compound_write(oid, ops)
                    .await?
                    .wait_for_complete()
                    .await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Load `size`, `allocated`, `version` from the head object's xattrs.
    pub async fn open(&mut self) -> Result<()> {
        let head = self.head_oid();
        trace!(oid = %head, "open");
        let ops = vec![
            ReadOp::GetXattr {
                key: XATTR_SIZE.into(),
            },
            ReadOp::GetXattr {
                key: XATTR_ALLOCATED.into(),
            },
            ReadOp::GetXattr {
                key: XATTR_VERSION.into(),
            },
        ];
        let mut results = match self.store.compound_read(&head, ops.clone()).await {
            Ok(r) => r,
            Err(e) if is_stale_placement_notfound(&e) => {
                self.store.wait_for_latest_map().await;
                self.store.compound_read(&head, ops).await?
            }
            Err(e) => return Err(e.into()),
        };
        let version_raw = results.pop().unwrap().into_xattr();
        let allocated_raw = results.pop().unwrap().into_xattr();
        let size_raw = results.pop().unwrap().into_xattr();

        // A successful compound read means the head object answered with
        // xattrs in hand; one that isn't 16 decimal digits is not an
        // adapter-level failure, it's a foreign writer or corruption --
        // an invariant violation, not a recoverable error.
        let size = decode_u64(&size_raw).expect("striper.size xattr is not 16 decimal digits");
        let allocated =
            decode_u64(&allocated_raw).expect("striper.allocated xattr is not 16 decimal digits");
        let version =
            decode_u64(&version_raw).expect("striper.version xattr is not 16 decimal digits");
        if size > allocated {
            return Err(StriperError::BadMetadata(format!(
                "size {size} exceeds allocated {allocated}"
            )));
        }

        self.size = size;
        self.allocated = allocated;
        self.version = version;
        self.size_dirty = false;
        debug!(size, allocated, version, "opened");
        Ok(())
    }

    /// Shrink to zero, remove the head, and leave the handle implicitly
    /// unlocked. Caller must already hold the lease.
    pub async fn remove(&mut self) -> Result<()> {
        self.drain_updates().await?;
        self.setmeta(0, true).await?;
        let head = self.head_oid();
        self.store
            .remove_object(&head)
            .await?
            .wait_for_complete()
            .await?;
        Ok(())
    }

    /// Read `len` bytes at `off`. Short if the logical file ends inside
    /// the request; never zero-fills past EOF, that's the caller's job.
    pub async fn read(&self, buf: &mut [u8], off: u64) -> Result<usize> {
        let want = buf.len() as u64;
        let readable = if off >= self.size {
            0
        } else {
            want.min(self.size - off)
        };
        let extents = map_range(&self.layout, &self.name, off, readable);

        let submissions = extents
            .iter()
            .map(|e| self.store.read_extent(&e.oid, e.offset, e.len));
        let pending = future::try_join_all(submissions).await?;
        let chunks: Vec<Bytes> =
            future::try_join_all(pending.into_iter().map(|c| c.wait_for_complete())).await?;

        let mut out = BytesMut::with_capacity(readable as usize);
        for chunk in chunks {
            out.extend_from_slice(&chunk);
        }

        let n = out.len();
        buf[..n].copy_from_slice(&out);
        Ok(n)
    }

    /// Write `data` at `off`. Grows allocation first if needed, then
    /// issues per-extent writes, retaining their completions in `updates`
    /// for `flush` to drain later. A submission error short-circuits the
    /// loop; bytes accepted before the failing extent are still counted
    /// in the returned `ShortWrite`.
    pub async fn write(&mut self, data: &[u8], off: u64) -> Result<usize> {
        let len = data.len() as u64;
        if len == 0 {
            return Ok(0);
        }

        if self.allocated < off + len {
            self.setmeta(off + len, false).await?;
        }

        let extents = map_range(&self.layout, &self.name, off, len);
        let mut written = 0u64;
        let mut src_off = 0usize;
        for e in &extents {
            let slice = &data[src_off..src_off + e.len as usize];
            match self
                .store
                .write_extent(&e.oid, e.offset, Bytes::copy_from_slice(slice))
                .await
            {
                Ok(completion) => {
                    self.updates.push(completion);
                    src_off += e.len as usize;
                    written += e.len;
                }
                Err(_) => break,
            }
        }

        if self.size < off + written {
            self.size = off + written;
            self.size_dirty = true;
        }

        if written < len {
            return Err(StriperError::ShortWrite {
                accepted: written as usize,
                requested: len as usize,
            });
        }

        Ok(written as usize)
    }

    /// `setmeta(new_size, update_size=true)`. Growth-with-sparse is not
    /// supported: the intended caller only ever grows by writing.
    pub async fn truncate(&mut self, new_size: u64) -> Result<()> {
        if new_size > self.size {
            return Err(StriperError::Unsupported(
                "truncate cannot grow a file; write instead".into(),
            ));
        }
        self.setmeta(new_size, true).await
    }

    /// Persist a dirty size, drain every retained write completion, then
    /// ask the adapter to flush. Failed completions leave `updates`
    /// non-empty so a retry can wait on the same (idempotent) handles --
    /// but since `Completion` is single-wait, a retry after a partial
    /// failure here re-submits is not meaningful; callers should treat a
    /// flush error as needing a fresh write.
    pub async fn flush(&mut self) -> Result<()> {
        if self.size_dirty {
            let size = self.size;
            self.setmeta(size, true).await?;
        }
        self.drain_updates().await
    }

    async fn drain_updates(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.updates);
        for completion in pending {
            completion.wait_for_complete().await?;
        }
        Ok(())
    }

    /// The metadata transaction: grows allocation if `new_size` would
    /// exceed it, optionally updates `size`, and always bumps `version`
    /// if anything else changed. Waits for completion only when
    /// `allocated` itself changed -- later writes must never race past
    /// the new allocation boundary.
    async fn setmeta(&mut self, new_size: u64, update_size: bool) -> Result<()> {
        trace!(
            new_size,
            update_size,
            allocated = self.allocated,
            size = self.size,
            version = self.version,
            "setmeta"
        );

        let mut ops = Vec::new();
        let mut new_allocated = self.allocated;
        let grows = new_size > self.allocated;
        if grows {
            let mask = self.layout.mask();
            new_allocated = self.tunables.min_growth_bytes + ((self.size + mask) & !mask);
            ops.push(WriteOp::SetXattr {
                key: XATTR_ALLOCATED.into(),
                value: encode_u64(new_allocated),
            });
        }
        if update_size {
            ops.push(WriteOp::SetXattr {
                key: XATTR_SIZE.into(),
                value: encode_u64(new_size),
            });
        }
        if ops.is_empty() {
            return Ok(());
        }
        ops.push(WriteOp::SetXattr {
            key: XATTR_VERSION.into(),
            value: encode_u64(self.version + 1),
        });

        let head = self.head_oid();
        let completion = self.store.compound_write(&head, ops).await?;
        self.version += 1;
        if grows {
            // Subsequent writes must not race past the new allocation
            // boundary, so wait right here instead of retaining this one.
            completion.wait_for_complete().await?;
            self.allocated = new_allocated;
        } else {
            self.updates.push(completion);
        }

        if update_size {
            self.size = new_size;
            self.size_dirty = false;
            self.maybe_allocshrink().await?;
        }

        Ok(())
    }

    /// Shrink allocation toward `min_growth + round_up(size)` once the
    /// slack exceeds `min_growth`. Never runs on a write-driven grow, only
    /// after a size-updating `setmeta`.
    async fn maybe_allocshrink(&mut self) -> Result<()> {
        if self.size == 0 {
            if self.allocated > 0 {
                return self.allocshrink(0).await;
            }
            return Ok(());
        }

        let mask = self.layout.mask();
        let target = self.tunables.min_growth_bytes + ((self.size + mask) & !mask);
        if self.allocated > target && (self.allocated - target) > self.tunables.min_growth_bytes {
            return self.allocshrink(target).await;
        }
        Ok(())
    }

    /// Delete every tail object at or beyond `target`, wait for all of
    /// them, then commit the new `allocated`/`version` and wait for that
    /// too. This synchronous barrier is what guarantees no dangling tail
    /// object survives an interrupted shrink.
    async fn allocshrink(&mut self, target: u64) -> Result<()> {
        debug!(target, allocated = self.allocated, "allocshrink");
        let prune = target.max(self.layout.object_size);
        let mut removes = Vec::new();
        let mut stripe = prune >> self.layout.object_size_log2();
        let mut bytes_left = self.allocated.saturating_sub(prune);
        while bytes_left > 0 {
            let oid = stripe_oid(&self.name, stripe);
            removes.push(self.store.remove_object(&oid).await?);
            bytes_left = bytes_left.saturating_sub(self.layout.object_size);
            stripe += 1;
        }

        for r in removes {
            if let Err(e) = r.wait_for_complete().await {
                if matches!(e, AdapterError::NotFound(_)) {
                    debug!("tail object already gone during shrink");
                    continue;
                }
                warn!(error = %e, "tail object remove failed during shrink");
                return Err(e.into());
            }
        }

        let head = self.head_oid();
        let ops = vec![
            WriteOp::SetXattr {
                key: XATTR_ALLOCATED.into(),
                value: encode_u64(target),
            },
            WriteOp::SetXattr {
                key: XATTR_VERSION.into(),
                value: encode_u64(self.version + 1),
            },
        ];
        self.store
            .compound_write(&head, ops)
            .await?
            .wait_for_complete()
            .await?;
        self.version += 1;
        self.allocated = target;
        Ok(())
    }
}

/// Classify an adapter error observed during `create`/`open` as worth
/// one `wait_for_latest_map` + retry, per the stale-placement note.
pub fn is_stale_placement_notfound(err: &AdapterError) -> bool {
    matches!(err, AdapterError::NotFound(_))
}
