//! Time source abstraction.
//!
//! All timeout and retry arithmetic in the engine reads the clock through
//! this trait, so the time laws can be tested without sleeping. Production
//! code uses [`SystemClock`]; tests use a manually advanced clock.

use chrono::{DateTime, Utc};

/// Source of "now" for timeout and retry-interval computation.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time via chrono.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
