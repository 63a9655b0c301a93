//! Tunables recognised by the striper and lease manager.
//!
//! Parsing these out of a config file or CLI is somebody else's job; this
//! module only validates the values once they arrive.

use crate::error::StriperError;

/// `object_size_log2` must fall in this range (4 KiB .. 1 GiB).
pub const MIN_OBJECT_SIZE_LOG2: u32 = 12;
pub const MAX_OBJECT_SIZE_LOG2: u32 = 30;

/// `SectorSize` reported to callers; fixed, not configurable.
pub const SECTOR_SIZE_BYTES_REPORTED: u32 = 65536;

/// The immutable per-file layout, fixed at `create` time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub stripe_unit: u64,
    pub stripe_count: u64,
    pub object_size: u64,
    object_size_log2: u32,
}

impl Layout {
    pub fn new(object_size_log2: u32) -> Result<Self, StriperError> {
        if !(MIN_OBJECT_SIZE_LOG2..=MAX_OBJECT_SIZE_LOG2).contains(&object_size_log2) {
            return Err(StriperError::InvalidConfig(format!(
                "object_size_log2 {object_size_log2} out of range [{MIN_OBJECT_SIZE_LOG2}, {MAX_OBJECT_SIZE_LOG2}]"
            )));
        }
        Ok(Self {
            stripe_unit: 1,
            stripe_count: 1,
            object_size: 1u64 << object_size_log2,
            object_size_log2,
        })
    }

    pub fn object_size_log2(&self) -> u32 {
        self.object_size_log2
    }

    pub fn mask(&self) -> u64 {
        self.object_size - 1
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(22).expect("default object_size_log2 is valid")
    }
}

/// Tunable knobs for a striper handle plus its lease keeper.
#[derive(Debug, Clone, Copy)]
pub struct Tunables {
    pub object_size_log2: u32,
    pub min_growth_bytes: u64,
    pub lock_renewal_interval_ms: u64,
    pub lock_renewal_timeout_ms: u64,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            object_size_log2: 22,
            min_growth_bytes: 1 << 27,
            lock_renewal_interval_ms: 2000,
            lock_renewal_timeout_ms: 30000,
        }
    }
}

impl Tunables {
    pub fn layout(&self) -> Result<Layout, StriperError> {
        Layout::new(self.object_size_log2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_object_size() {
        assert!(Layout::new(11).is_err());
        assert!(Layout::new(31).is_err());
    }

    #[test]
    fn accepts_boundary_values() {
        assert!(Layout::new(12).is_ok());
        assert!(Layout::new(30).is_ok());
    }

    #[test]
    fn default_layout_is_4mib() {
        let l = Layout::default();
        assert_eq!(l.object_size, 4 * 1024 * 1024);
        assert_eq!(l.stripe_unit, 1);
        assert_eq!(l.stripe_count, 1);
    }
}
