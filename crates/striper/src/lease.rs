//! The exclusive lease: `lock`, `unlock`, and the background renewal
//! keeper that makes the single-writer invariant safe across a crashing
//! or partitioned client. Ported from `SimpleRADOSStriper::lock` /
//! `unlock` / `lock_keeper_main`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use striper_adapter::{AdapterError, ObjectStore};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Tunables;
use crate::error::{Result, StriperError};
use crate::meta::{LOCK_DESCRIPTION, LOCK_NAME};

/// Where a [`Lease`] sits in its state machine. `Lost` is terminal: once
/// reached, every further mutation must be refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseState {
    Unlocked,
    Locking,
    Locked,
    Unlocking,
    Lost,
}

struct Shared {
    state: Mutex<LeaseState>,
    last_renewal: Mutex<Instant>,
    blocklisted: AtomicBool,
    locked: AtomicBool,
    shutdown: Notify,
}

/// An exclusive named lock on a head object, plus the keeper task that
/// renews it. One `Lease` belongs to exactly one striper handle; its
/// `cookie` is generated fresh per handle.
pub struct Lease {
    store: Arc<dyn ObjectStore>,
    head_oid: String,
    cookie: String,
    tunables: Tunables,
    shared: Arc<Shared>,
    keeper: Option<JoinHandle<()>>,
}

impl Lease {
    pub fn new(store: Arc<dyn ObjectStore>, head_oid: impl Into<String>, tunables: Tunables) -> Self {
        Self {
            store,
            head_oid: head_oid.into(),
            cookie: Uuid::new_v4().to_string(),
            tunables,
            shared: Arc::new(Shared {
                state: Mutex::new(LeaseState::Unlocked),
                last_renewal: Mutex::new(Instant::now()),
                blocklisted: AtomicBool::new(false),
                locked: AtomicBool::new(false),
                shutdown: Notify::new(),
            }),
            keeper: None,
        }
    }

    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    pub async fn state(&self) -> LeaseState {
        *self.shared.state.lock().await
    }

    /// Cheap, lock-free check for `Drop` impls that cannot await.
    pub fn is_locked(&self) -> bool {
        self.shared.locked.load(Ordering::Acquire)
    }

    /// Fail fast if a caller tries to mutate through a lease that has
    /// already been declared lost.
    pub fn ensure_live(&self) -> Result<()> {
        if self.shared.blocklisted.load(Ordering::Acquire) {
            Err(StriperError::LostLease)
        } else {
            Ok(())
        }
    }

    /// Acquire the lock, retrying on `Busy` until `timeout_ms` elapses
    /// (0 = forever). Every 500 ms of waiting emits a diagnostic listing
    /// of current lockers.
    pub async fn lock(&mut self, timeout_ms: u64) -> Result<()> {
        {
            let mut state = self.shared.state.lock().await;
            *state = LeaseState::Locking;
        }

        let deadline = (timeout_ms > 0).then(|| Instant::now() + Duration::from_millis(timeout_ms));
        let mut last_listing = Instant::now();
        loop {
            match self
                .store
                .exclusive_lock(&self.head_oid, LOCK_NAME, &self.cookie, LOCK_DESCRIPTION)
                .await
            {
                Ok(()) => break,
                Err(AdapterError::Busy { .. }) => {
                    if let Some(deadline) = deadline {
                        if Instant::now() >= deadline {
                            let mut state = self.shared.state.lock().await;
                            *state = LeaseState::Unlocked;
                            return Err(StriperError::Busy);
                        }
                    }
                    if last_listing.elapsed() >= Duration::from_millis(500) {
                        last_listing = Instant::now();
                        if let Ok(lockers) = self.store.list_lockers(&self.head_oid, LOCK_NAME).await {
                            info!(oid = %self.head_oid, ?lockers, "waiting on held lock");
                        }
                    }
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
                Err(e) => {
                    let mut state = self.shared.state.lock().await;
                    *state = LeaseState::Unlocked;
                    return Err(e.into());
                }
            }
        }

        *self.shared.last_renewal.lock().await = Instant::now();
        {
            let mut state = self.shared.state.lock().await;
            *state = LeaseState::Locked;
        }
        self.shared.blocklisted.store(false, Ordering::Release);
        self.shared.locked.store(true, Ordering::Release);
        self.spawn_keeper();
        debug!(oid = %self.head_oid, cookie = %self.cookie, "lease acquired");
        Ok(())
    }

    fn spawn_keeper(&mut self) {
        if self.keeper.is_some() {
            return;
        }
        let store = Arc::clone(&self.store);
        let head_oid = self.head_oid.clone();
        let cookie = self.cookie.clone();
        let shared = Arc::clone(&self.shared);
        let interval = Duration::from_millis(self.tunables.lock_renewal_interval_ms);
        let timeout = Duration::from_millis(self.tunables.lock_renewal_timeout_ms);

        self.keeper = Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = shared.shutdown.notified() => {
                        return;
                    }
                }

                match store
                    .exclusive_lock(&head_oid, LOCK_NAME, &cookie, LOCK_DESCRIPTION)
                    .await
                {
                    Ok(()) => {
                        *shared.last_renewal.lock().await = Instant::now();
                    }
                    Err(e) => {
                        warn!(error = %e, oid = %head_oid, "lease renewal failed");
                    }
                }

                let elapsed = shared.last_renewal.lock().await.elapsed();
                if elapsed > timeout {
                    warn!(oid = %head_oid, ?elapsed, "lease renewal timed out, declaring blocklisted");
                    shared.blocklisted.store(true, Ordering::Release);
                    let mut state = shared.state.lock().await;
                    *state = LeaseState::Lost;
                }
            }
        }));
    }

    async fn stop_keeper(&mut self) {
        if let Some(handle) = self.keeper.take() {
            self.shared.shutdown.notify_waiters();
            let _ = handle.await;
        }
    }

    /// Release the lock. Caller is responsible for flushing the striper
    /// first; this method only touches lease state and the adapter call.
    pub async fn unlock(&mut self) -> Result<()> {
        {
            let mut state = self.shared.state.lock().await;
            if *state != LeaseState::Locked {
                return Ok(());
            }
            *state = LeaseState::Unlocking;
        }
        self.store
            .unlock(&self.head_oid, LOCK_NAME, &self.cookie)
            .await?;
        self.stop_keeper().await;
        self.shared.locked.store(false, Ordering::Release);
        let mut state = self.shared.state.lock().await;
        *state = LeaseState::Unlocked;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use striper_adapter::mock::MemStore;

    fn store() -> Arc<MemStore> {
        Arc::new(MemStore::new())
    }

    #[tokio::test]
    async fn lock_then_unlock_round_trips() {
        let store = store();
        let mut lease = Lease::new(store, "obj.0000000000000000", Tunables::default());
        lease.lock(1000).await.unwrap();
        assert_eq!(lease.state().await, LeaseState::Locked);
        lease.unlock().await.unwrap();
        assert_eq!(lease.state().await, LeaseState::Unlocked);
    }

    #[tokio::test]
    async fn second_cookie_times_out_busy() {
        let store = store();
        let mut a = Lease::new(Arc::clone(&store) as Arc<dyn ObjectStore>, "obj.0000000000000000", Tunables::default());
        a.lock(1000).await.unwrap();

        let mut b = Lease::new(Arc::clone(&store) as Arc<dyn ObjectStore>, "obj.0000000000000000", Tunables::default());
        let err = b.lock(50).await.unwrap_err();
        assert!(matches!(err, StriperError::Busy));

        a.unlock().await.unwrap();
    }

    #[tokio::test]
    async fn ensure_live_fails_after_blocklist() {
        let store = store();
        let mut lease = Lease::new(store, "obj.0000000000000000", Tunables::default());
        lease.lock(1000).await.unwrap();
        lease.shared.blocklisted.store(true, Ordering::Release);
        assert!(matches!(lease.ensure_live(), Err(StriperError::LostLease)));
        lease.unlock().await.unwrap();
    }
}
