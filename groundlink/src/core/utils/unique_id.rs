use std::fmt::{Debug, Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

/// <sup>[`serde`](https://serde.rs)</sup>
/// Unique identifier.
///
/// Identifier which is guaranteed to be unique during the program run. Used to tell timers and
/// requests apart, so a stale timer firing after being superseded is recognized and ignored.
///
/// Identifiers are ordered by creation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct UniqueId(u64);

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

impl UniqueId {
    /// Generates unique identifier.
    pub fn new() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for UniqueId {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for UniqueId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("UniqueId").field(&self.0).finish()
    }
}

impl Display for UniqueId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:x}", self.0)
    }
}
