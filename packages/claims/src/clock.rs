//! Time source for default claim values and time-based policy checks.

use chrono::Utc;
use std::fmt;
use std::sync::Arc;

/// Source of "now", in whole seconds since the Unix epoch.
///
/// Read at the moment of use: the factory asks for the time when `make()`
/// runs, never when it is constructed.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current Unix timestamp in seconds
    fn now(&self) -> i64;
}

/// Wall clock backed by `chrono::Utc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Clock frozen at a fixed timestamp. Useful for deterministic tests and for
/// re-validating a claim set "as of" a known instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    #[inline]
    fn now(&self) -> i64 {
        self.0
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    #[inline]
    fn now(&self) -> i64 {
        (**self).now()
    }
}

/// Shared clock handle used by the factory and validator.
pub type SharedClock = Arc<dyn Clock>;

/// Default shared clock (`SystemClock`).
#[must_use]
pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}
