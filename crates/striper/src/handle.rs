//! The public file-like handle: a [`crate::core::Striper`] paired with
//! its [`crate::lease::Lease`]. This is what a VFS adapter surface (or a
//! test) actually drives; the two pieces are kept separate internally so
//! each can be tested in isolation.

use std::sync::Arc;

use striper_adapter::ObjectStore;
use tracing::warn;

use crate::core::Striper;
use crate::config::Tunables;
use crate::error::Result;
use crate::lease::{Lease, LeaseState};

/// One logical file: a striper plus the lease that guards its mutations.
pub struct StriperHandle {
    striper: Striper,
    lease: Lease,
}

impl StriperHandle {
    pub fn new(store: Arc<dyn ObjectStore>, name: impl Into<String>, tunables: Tunables) -> Result<Self> {
        let name = name.into();
        let lease = Lease::new(Arc::clone(&store), format!("{name}.0000000000000000"), tunables);
        let striper = Striper::new(store, name, tunables)?;
        Ok(Self { striper, lease })
    }

    /// Exclusive create of the head object. Does not acquire the lease.
    pub async fn create(&mut self) -> Result<()> {
        self.striper.create().await
    }

    /// Reload `size`/`allocated`/`version` from the head object.
    pub async fn open(&mut self) -> Result<()> {
        self.striper.open().await
    }

    /// Acquire the lease, then refresh metadata -- another client may
    /// have mutated the head while this one waited.
    pub async fn lock(&mut self, timeout_ms: u64) -> Result<()> {
        self.lease.lock(timeout_ms).await?;
        self.striper.open().await
    }

    /// Flush, then release the lease. A best-effort counterpart runs in
    /// `Drop` if the caller never calls this explicitly.
    pub async fn unlock(&mut self) -> Result<()> {
        self.striper.flush().await?;
        self.lease.unlock().await
    }

    pub async fn lease_state(&self) -> LeaseState {
        self.lease.state().await
    }

    pub fn stat(&self) -> u64 {
        self.striper.stat()
    }

    pub async fn read(&self, buf: &mut [u8], off: u64) -> Result<usize> {
        self.striper.read(buf, off).await
    }

    pub async fn write(&mut self, data: &[u8], off: u64) -> Result<usize> {
        self.lease.ensure_live()?;
        self.striper.write(data, off).await
    }

    pub async fn truncate(&mut self, new_size: u64) -> Result<()> {
        self.lease.ensure_live()?;
        self.striper.truncate(new_size).await
    }

    pub async fn flush(&mut self) -> Result<()> {
        self.lease.ensure_live()?;
        self.striper.flush().await
    }

    /// Remove the logical file entirely. Caller must already hold the
    /// lease; this leaves the handle implicitly unlocked afterward.
    pub async fn remove(&mut self) -> Result<()> {
        self.lease.ensure_live()?;
        self.striper.remove().await?;
        self.lease.unlock().await
    }

    pub async fn list_lockers(&self) -> Result<striper_adapter::Lockers> {
        Ok(self
            .striper
            .store()
            .list_lockers(&self.striper.head_oid(), crate::meta::LOCK_NAME)
            .await?)
    }
}

impl Drop for StriperHandle {
    fn drop(&mut self) {
        if self.lease.is_locked() {
            warn!("StriperHandle dropped while still locked; call unlock() explicitly before destruction");
        }
    }
}
