//! A large-object striper with exclusive-lease semantics: maps a
//! logical byte-addressed file onto a chain of fixed-size objects in an
//! object store, and guards mutation of that file with a renewed
//! distributed lock.
//!
//! [`StriperHandle`] is the type most callers want: it pairs the
//! allocation/extent logic in [`core`] with the lock lifecycle in
//! [`lease`]. The two are kept as separate, independently testable
//! pieces internally.

pub mod config;
pub mod core;
pub mod error;
pub mod extent;
pub mod handle;
pub mod lease;
pub mod meta;

pub use config::{Layout, Tunables};
pub use core::Striper;
pub use error::{Result, StriperError};
pub use extent::{map_range, next_extent, parse_stripe_index, stripe_oid, Extent};
pub use handle::StriperHandle;
pub use lease::{Lease, LeaseState};
