//! An in-memory [`ObjectStore`] for tests.
//!
//! `MemStore` keeps every object's bytes and xattrs in a `Mutex<HashMap>`
//! and resolves every completion inline before handing it back, so tests
//! can drive the striper deterministically without a real cluster.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::completion::Completion;
use crate::error::AdapterError;
use crate::ops::{ReadOp, ReadOpResult, WriteOp};
use crate::store::ObjectStore;
use crate::types::Lockers;

#[derive(Default)]
struct Object {
    data: Vec<u8>,
    xattrs: HashMap<String, Vec<u8>>,
}

struct LockState {
    cookie: String,
    description: String,
}

#[derive(Default)]
pub struct MemStore {
    objects: Mutex<HashMap<String, Object>>,
    locks: Mutex<HashMap<(String, String), LockState>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test helper: does `oid` currently exist?
    pub fn exists(&self, oid: &str) -> bool {
        self.objects.lock().unwrap().contains_key(oid)
    }

    /// Test helper: read back a raw xattr value.
    pub fn xattr(&self, oid: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(oid)
            .and_then(|o| o.xattrs.get(key).cloned())
    }
}

#[async_trait]
impl ObjectStore for MemStore {
    async fn read_extent(
        &self,
        oid: &str,
        offset: u64,
        len: u64,
    ) -> Result<Completion<Bytes>, AdapterError> {
        let result = {
            let objects = self.objects.lock().unwrap();
            match objects.get(oid) {
                None => Err(AdapterError::NotFound(oid.to_string())),
                Some(obj) => {
                    let off = offset as usize;
                    if off >= obj.data.len() {
                        Ok(Bytes::new())
                    } else {
                        let end = (off + len as usize).min(obj.data.len());
                        Ok(Bytes::copy_from_slice(&obj.data[off..end]))
                    }
                }
            }
        };
        Ok(Completion::ready(result))
    }

    async fn write_extent(
        &self,
        oid: &str,
        offset: u64,
        data: Bytes,
    ) -> Result<Completion<()>, AdapterError> {
        let result = {
            let mut objects = self.objects.lock().unwrap();
            let obj = objects.entry(oid.to_string()).or_default();
            let off = offset as usize;
            let end = off + data.len();
            if obj.data.len() < end {
                obj.data.resize(end, 0);
            }
            obj.data[off..end].copy_from_slice(&data);
            Ok(())
        };
        debug!(oid, offset, len = data.len(), "mock write_extent");
        Ok(Completion::ready(result))
    }

    async fn remove_object(&self, oid: &str) -> Result<Completion<()>, AdapterError> {
        let mut objects = self.objects.lock().unwrap();
        let result = match objects.remove(oid) {
            Some(_) => Ok(()),
            None => Err(AdapterError::NotFound(oid.to_string())),
        };
        Ok(Completion::ready(result))
    }

    async fn compound_write(
        &self,
        oid: &str,
        ops: Vec<WriteOp>,
    ) -> Result<Completion<()>, AdapterError> {
        let result = (|| {
            let mut objects = self.objects.lock().unwrap();
            if ops
                .iter()
                .any(|op| matches!(op, WriteOp::CreateExclusive))
                && objects.contains_key(oid)
            {
                return Err(AdapterError::AlreadyExists(oid.to_string()));
            }
            let obj = objects.entry(oid.to_string()).or_default();
            for op in ops {
                match op {
                    WriteOp::CreateExclusive => {}
                    WriteOp::SetXattr { key, value } => {
                        obj.xattrs.insert(key, value);
                    }
                    WriteOp::Truncate(size) => {
                        obj.data.resize(size as usize, 0);
                    }
                }
            }
            Ok(())
        })();
        Ok(Completion::ready(result))
    }

    async fn compound_read(
        &self,
        oid: &str,
        ops: Vec<ReadOp>,
    ) -> Result<Vec<ReadOpResult>, AdapterError> {
        let objects = self.objects.lock().unwrap();
        let obj = objects
            .get(oid)
            .ok_or_else(|| AdapterError::NotFound(oid.to_string()))?;
        ops.into_iter()
            .map(|op| match op {
                ReadOp::GetXattr { key } => obj
                    .xattrs
                    .get(&key)
                    .cloned()
                    .map(ReadOpResult::Xattr)
                    .ok_or_else(|| AdapterError::NotFound(format!("{oid}:{key}"))),
            })
            .collect()
    }

    async fn exclusive_lock(
        &self,
        oid: &str,
        lock_name: &str,
        cookie: &str,
        description: &str,
    ) -> Result<(), AdapterError> {
        let mut locks = self.locks.lock().unwrap();
        let key = (oid.to_string(), lock_name.to_string());
        match locks.get(&key) {
            Some(holder) if holder.cookie == cookie => Ok(()),
            Some(_) => Err(AdapterError::Busy {
                oid: oid.to_string(),
                lock_name: lock_name.to_string(),
            }),
            None => {
                locks.insert(
                    key,
                    LockState {
                        cookie: cookie.to_string(),
                        description: description.to_string(),
                    },
                );
                Ok(())
            }
        }
    }

    async fn unlock(&self, oid: &str, lock_name: &str, cookie: &str) -> Result<(), AdapterError> {
        let mut locks = self.locks.lock().unwrap();
        let key = (oid.to_string(), lock_name.to_string());
        match locks.get(&key) {
            Some(holder) if holder.cookie == cookie => {
                locks.remove(&key);
                Ok(())
            }
            _ => Err(AdapterError::NotLocked {
                oid: oid.to_string(),
                lock_name: lock_name.to_string(),
            }),
        }
    }

    async fn list_lockers(&self, oid: &str, lock_name: &str) -> Result<Lockers, AdapterError> {
        let locks = self.locks.lock().unwrap();
        let key = (oid.to_string(), lock_name.to_string());
        match locks.get(&key) {
            Some(holder) => Ok(Lockers {
                is_exclusive: true,
                tag: holder.description.clone(),
                lockers: vec![crate::types::Locker {
                    client: "mock-client".to_string(),
                    cookie: holder.cookie.clone(),
                    address: "mock://local".to_string(),
                }],
            }),
            None => Ok(Lockers::default()),
        }
    }

    async fn wait_for_latest_map(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let store = MemStore::new();
        store
            .write_extent("obj.0", 0, Bytes::from_static(b"hello"))
            .await
            .unwrap()
            .wait_for_complete()
            .await
            .unwrap();
        let got = store
            .read_extent("obj.0", 0, 5)
            .await
            .unwrap()
            .wait_for_complete()
            .await
            .unwrap();
        assert_eq!(&got[..], b"hello");
    }

    #[tokio::test]
    async fn create_exclusive_rejects_existing() {
        let store = MemStore::new();
        store
            .compound_write("obj.0", vec![WriteOp::CreateExclusive])
            .await
            .unwrap()
            .wait_for_complete()
            .await
            .unwrap();
        let err = store
            .compound_write("obj.0", vec![WriteOp::CreateExclusive])
            .await
            .unwrap()
            .wait_for_complete()
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn remove_missing_object_reports_not_found() {
        let store = MemStore::new();
        let err = store
            .remove_object("does-not-exist")
            .await
            .unwrap()
            .wait_for_complete()
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::NotFound(_)));
    }

    #[tokio::test]
    async fn second_exclusive_lock_is_busy() {
        let store = MemStore::new();
        store
            .exclusive_lock("obj.0", "striper.lock", "cookie-a", "desc")
            .await
            .unwrap();
        let err = store
            .exclusive_lock("obj.0", "striper.lock", "cookie-b", "desc")
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Busy { .. }));
    }

    #[tokio::test]
    async fn unlock_requires_matching_cookie() {
        let store = MemStore::new();
        store
            .exclusive_lock("obj.0", "striper.lock", "cookie-a", "desc")
            .await
            .unwrap();
        let err = store
            .unlock("obj.0", "striper.lock", "cookie-b")
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::NotLocked { .. }));
    }
}
