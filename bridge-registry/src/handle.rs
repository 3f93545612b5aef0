//! Handle allocation.
//!
//! Handles identify pending operations across the embedding boundary. They
//! are process-local: never persisted, never sent over a network, meaningless
//! outside the process that issued them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque identifier for one pending operation.
///
/// Handles are unique for the lifetime of the process, monotonically
/// increasing, and never reused. A handle carries no meaning beyond identity.
///
/// The raw-value accessors exist only for crossing a C boundary, where the
/// handle travels as a plain integer. `0` is never issued and serves as the
/// boundary's "invalid handle" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u64);

impl Handle {
    /// Reconstruct a handle received from the foreign side.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw integer form handed across the foreign boundary.
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Produces a strictly increasing stream of unique handles.
///
/// Safe to call from any number of threads; never blocks and never fails.
/// The first issued handle is `1`.
///
/// The counter is 64 bits wide and is not protected against wraparound: at
/// one allocation per nanosecond it would take centuries to exhaust, so
/// wraparound within a process lifetime is a documented non-goal rather than
/// a handled condition.
#[derive(Debug, Default)]
pub struct HandleAllocator {
    next: AtomicU64,
}

impl HandleAllocator {
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// Returns a handle strictly greater than every previously returned one.
    pub fn next(&self) -> Handle {
        Handle(self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }
}
