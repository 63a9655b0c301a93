//! The outward contract of Component F: thin mappings from file-like
//! calls onto a [`StriperHandle`]. This is not a binding to SQLite's C
//! ABI -- that glue, and the pool/connection bookkeeping `makestriper`
//! does in the source, belong to whatever embeds this crate. What lives
//! here is the call-for-call mapping table itself, so that embedding is
//! mechanical.

use std::sync::Arc;

use striper::{StriperHandle, Tunables};
use striper_adapter::ObjectStore;
use tracing::debug;

use crate::error::VfsError;
use crate::path::FileLoc;

/// The five SQLite lock levels, in ascending order. Only `None` and
/// anything above it matter here: SHARED and RESERVED both map onto the
/// same physical exclusive lease, per the one-writer-lease design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LockLevel {
    None,
    Shared,
    Reserved,
    Pending,
    Exclusive,
}

/// SectorSize, fixed and not configurable.
pub const SECTOR_SIZE: u32 = 65536;

/// An open logical file, as the VFS layer sees it.
pub struct CephSqliteFile {
    loc: FileLoc,
    handle: StriperHandle,
    lock_level: LockLevel,
}

impl CephSqliteFile {
    /// `Open`: create the head object if requested, then load its
    /// metadata. Mirrors `makestriper` + `create`/`open` in the source,
    /// minus the pool/ioctx plumbing -- the caller hands in a store
    /// already scoped to `loc.pool`/`loc.namespace`.
    pub async fn open(store: Arc<dyn ObjectStore>, loc: FileLoc, create: bool, tunables: Tunables) -> Result<Self, VfsError> {
        debug!(name = %loc.name, create, "vfs open");
        let mut handle = StriperHandle::new(store, loc.name.clone(), tunables)?;
        if create {
            match handle.create().await {
                Ok(()) => {}
                Err(striper::StriperError::AlreadyExists(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        handle.open().await?;
        Ok(Self {
            loc,
            handle,
            lock_level: LockLevel::None,
        })
    }

    pub fn loc(&self) -> &FileLoc {
        &self.loc
    }

    /// `Close`: the contract is unlock-then-flush; since drop cannot be
    /// async, callers must invoke this explicitly before dropping.
    pub async fn close(mut self) -> Result<(), VfsError> {
        if self.lock_level > LockLevel::None {
            self.handle.unlock().await?;
        }
        Ok(())
    }

    /// `Read(buf, off, n)`. A short read is zero-filled past the data the
    /// striper actually returned and reported via `ShortRead`, matching
    /// the source's `memset` + `SQLITE_IOERR_SHORT_READ` pair.
    pub async fn read(&self, buf: &mut [u8], off: u64) -> Result<usize, VfsError> {
        let expected = buf.len();
        let got = self.handle.read(buf, off).await?;
        if got < expected {
            buf[got..].fill(0);
            return Err(VfsError::ShortRead { got, expected });
        }
        Ok(got)
    }

    /// `Write(buf, off, n)`.
    pub async fn write(&mut self, buf: &[u8], off: u64) -> Result<usize, VfsError> {
        Ok(self.handle.write(buf, off).await?)
    }

    /// `Truncate(n)`.
    pub async fn truncate(&mut self, new_size: u64) -> Result<(), VfsError> {
        Ok(self.handle.truncate(new_size).await?)
    }

    /// `Sync`.
    pub async fn sync(&mut self) -> Result<(), VfsError> {
        Ok(self.handle.flush().await?)
    }

    /// `FileSize`.
    pub fn file_size(&self) -> u64 {
        self.handle.stat()
    }

    /// `Lock(level)`: only the transition from `None` to something
    /// greater actually touches the adapter; everything above `None` is
    /// the same exclusive lease.
    pub async fn lock(&mut self, level: LockLevel) -> Result<(), VfsError> {
        if self.lock_level == LockLevel::None && level > LockLevel::None {
            self.handle.lock(0).await?;
        }
        self.lock_level = level;
        Ok(())
    }

    /// `Unlock(level=None)`.
    pub async fn unlock(&mut self, level: LockLevel) -> Result<(), VfsError> {
        if level == LockLevel::None && self.lock_level > LockLevel::None {
            self.handle.unlock().await?;
        }
        self.lock_level = level;
        Ok(())
    }

    /// `CheckReservedLock`: is anyone (including us) holding the lease
    /// above SHARED?
    pub async fn check_reserved_lock(&self) -> Result<bool, VfsError> {
        let lockers = self.handle.list_lockers().await?;
        Ok(!lockers.lockers.is_empty())
    }

    pub fn sector_size(&self) -> u32 {
        SECTOR_SIZE
    }
}

/// `Delete`: lock, open, remove -- the source does this with a
/// throwaway handle rather than the caller's open file.
pub async fn delete(store: Arc<dyn ObjectStore>, loc: FileLoc, tunables: Tunables) -> Result<(), VfsError> {
    let mut handle = StriperHandle::new(store, loc.name, tunables)?;
    handle.lock(0).await?;
    handle.open().await?;
    handle.remove().await?;
    Ok(())
}

/// `Access`: does the file exist? `NotFound` on `open` means no.
pub async fn access(store: Arc<dyn ObjectStore>, loc: FileLoc, tunables: Tunables) -> Result<bool, VfsError> {
    if crate::path::is_wal_name(&loc.name) {
        return Ok(false);
    }
    let mut handle = StriperHandle::new(store, loc.name, tunables)?;
    match handle.open().await {
        Ok(()) => Ok(true),
        Err(striper::StriperError::NotFound(_)) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
