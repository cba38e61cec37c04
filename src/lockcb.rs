//! Per-datastore lock control blocks.

use crate::datastore::Datastore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lock progress for one datastore.
///
/// The acquisition driver moves an in-use block
/// `Idle -> RequestSent -> (Active | TempError | FatalError)`, with
/// `TempError -> RequestSent` on retry. The release driver moves
/// `Active -> ReleaseSent -> (Released | FatalError)`. Fatal errors are
/// never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    /// No request sent yet this cycle.
    Idle,
    /// A `<lock>` request is outstanding.
    RequestSent,
    /// The lock is held.
    Active,
    /// Lock denied by another holder; eligible for retry after the
    /// retry interval.
    TempError,
    /// Lock (or unlock) denied permanently; aborts the cycle.
    FatalError,
    /// An `<unlock>` request is outstanding.
    ReleaseSent,
    /// Unlocked during this release cycle.
    Released,
}

/// Lock control block: per-datastore record of lock progress.
#[derive(Debug, Clone)]
pub struct LockControlBlock {
    /// Which configuration datastore this block governs.
    pub datastore: Datastore,
    /// Current lock progress. Meaningful only when `in_use` is true.
    pub state: LockState,
    /// Whether this datastore needs a lock at all. Running is always in
    /// use; candidate/startup only when the server advertised the
    /// capability.
    pub in_use: bool,
    /// When the first lock request for this datastore was sent this cycle.
    pub start_time: Option<DateTime<Utc>>,
    /// When the most recent PDU for this datastore was sent. Retry
    /// eligibility for `TempError` is measured from here.
    pub last_msg_time: Option<DateTime<Utc>>,
}

impl LockControlBlock {
    /// A fresh, unused block for the given datastore.
    pub fn new(datastore: Datastore) -> Self {
        Self {
            datastore,
            state: LockState::Idle,
            in_use: false,
            start_time: None,
            last_msg_time: None,
        }
    }

    /// Reset to idle/unused. Called at cycle setup and teardown.
    pub fn reset(&mut self) {
        self.state = LockState::Idle;
        self.in_use = false;
        self.start_time = None;
        self.last_msg_time = None;
    }

    /// Whether this block no longer needs any acquisition work.
    ///
    /// An unused block is always satisfied.
    pub fn is_granted(&self) -> bool {
        !self.in_use || self.state == LockState::Active
    }

    /// Whether a `TempError` block is eligible for retry at `now`.
    ///
    /// Eligible exactly at `retry_interval_secs` elapsed since the last
    /// message; a block with no recorded send time is eligible
    /// immediately.
    pub fn retry_elapsed(&self, now: DateTime<Utc>, retry_interval_secs: u32) -> bool {
        match self.last_msg_time {
            Some(last) => {
                now.signed_duration_since(last).num_seconds() >= i64::from(retry_interval_secs)
            }
            None => true,
        }
    }
}
