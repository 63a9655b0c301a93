//! Small value types shared across the adapter boundary.

/// One holder of a named lock, as reported by `list_lockers`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locker {
    pub client: String,
    pub cookie: String,
    pub address: String,
}

/// Result of `list_lockers`: who holds (or contends for) a lock right now.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Lockers {
    pub is_exclusive: bool,
    pub tag: String,
    pub lockers: Vec<Locker>,
}
