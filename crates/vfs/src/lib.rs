//! Component F: the VFS adapter surface contract.
//!
//! This crate defines how file-descriptor-shaped calls (`Open`, `Read`,
//! `Write`, `Lock`, ...) map onto a [`striper::StriperHandle`], and
//! parses the `pool:namespace/name` path grammar those calls arrive
//! wrapped in. It does not bind to SQLite's C ABI, register an
//! `sqlite3_vfs`, or manage RADOS pool/ioctx lifecycles -- those are the
//! embedding application's job.

pub mod error;
pub mod file;
pub mod path;

pub use error::VfsError;
pub use file::{access, delete, CephSqliteFile, LockLevel, SECTOR_SIZE};
pub use path::{full_pathname, is_wal_name, parse, FileLoc, Pool};
