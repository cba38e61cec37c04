//! Per-session lock coordination context.
//!
//! A [`LockSession`] aggregates one lock control block per datastore plus
//! the overall timing configuration and the current automated command
//! mode. It is owned by the session's event-processing thread and never
//! accessed concurrently; its lifetime matches the underlying management
//! session, and no lock state survives a disconnect.

use crate::clock::{Clock, SystemClock};
use crate::datastore::Datastore;
use crate::events::{EventAction, EventLog};
use crate::lockcb::{LockControlBlock, LockState};
use crate::rpc::{Capability, ManagedSession};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which automated sequence currently owns the session's reply handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandMode {
    /// No automated sequence in progress.
    Normal,
    /// get-locks acquisition in progress.
    AutoLock,
    /// release-locks (or cleanup unlock) in progress.
    AutoUnlock,
    /// `<discard-changes>` rollback in flight.
    AutoDiscard,
}

/// Configuration for a get-locks cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOptions {
    /// Overall budget for the whole acquisition cycle, in seconds.
    /// Zero disables the overall timeout.
    pub overall_timeout_secs: u32,

    /// Minimum delay before retrying a temporarily denied lock, in
    /// seconds.
    pub retry_interval_secs: u32,

    /// Whether a failed or aborted get-locks should automatically
    /// discard candidate changes and release any locks already acquired.
    pub cleanup_on_failure: bool,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            overall_timeout_secs: 120,
            retry_interval_secs: 1,
            cleanup_on_failure: true,
        }
    }
}

/// Lock coordination state for one managed NETCONF session.
pub struct LockSession {
    /// One control block per datastore, indexed by [`Datastore`].
    lock_cbs: [LockControlBlock; 3],

    /// Whether an acquisition cycle is in progress or locks are held.
    pub locks_active: bool,

    /// True while a temporary denial is waiting out the retry interval.
    pub locks_waiting: bool,

    /// Target of the most recently sent lock/unlock PDU.
    pub current_datastore: Datastore,

    /// Which automated sequence owns reply handling right now.
    pub command_mode: CommandMode,

    /// Overall cycle timeout in seconds (0 = disabled).
    pub overall_timeout_secs: u32,

    /// Retry gate for temporarily denied locks, in seconds.
    pub retry_interval_secs: u32,

    /// Auto-discard/auto-unlock on get-locks failure.
    pub cleanup_on_failure: bool,

    /// Start of the current acquisition/release cycle.
    pub overall_start_time: Option<DateTime<Utc>>,

    /// Protocol event log for this session.
    pub events: EventLog,

    clock: Box<dyn Clock>,
}

impl LockSession {
    /// New idle session context using the system clock.
    pub fn new() -> Self {
        Self::with_clock(Box::new(SystemClock))
    }

    /// New idle session context with an injected time source.
    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        Self {
            lock_cbs: [
                LockControlBlock::new(Datastore::Running),
                LockControlBlock::new(Datastore::Candidate),
                LockControlBlock::new(Datastore::Startup),
            ],
            locks_active: false,
            locks_waiting: false,
            current_datastore: Datastore::Running,
            command_mode: CommandMode::Normal,
            overall_timeout_secs: 0,
            retry_interval_secs: 0,
            cleanup_on_failure: false,
            overall_start_time: None,
            events: EventLog::new(),
            clock,
        }
    }

    /// Current instant from the session's time source.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Control block for one datastore.
    pub fn lock_cb(&self, ds: Datastore) -> &LockControlBlock {
        &self.lock_cbs[ds.index()]
    }

    /// Mutable control block for one datastore.
    pub fn lock_cb_mut(&mut self, ds: Datastore) -> &mut LockControlBlock {
        &mut self.lock_cbs[ds.index()]
    }

    /// Initialize the lock control blocks at the start of a get-locks
    /// cycle.
    ///
    /// Running is always requested; candidate and startup only when the
    /// server advertised the matching capability.
    pub fn setup_lock_cbs(&mut self, server: &impl ManagedSession) {
        self.locks_active = true;
        self.locks_waiting = false;
        self.current_datastore = Datastore::Running;

        for ds in Datastore::ALL {
            self.lock_cbs[ds.index()].reset();
        }

        self.lock_cb_mut(Datastore::Running).in_use = true;
        self.lock_cb_mut(Datastore::Candidate).in_use = server.supports(Capability::Candidate);
        self.lock_cb_mut(Datastore::Startup).in_use = server.supports(Capability::Startup);
    }

    /// Prepare the control blocks for a release cycle.
    ///
    /// Clears per-datastore timestamps and reports whether any unlock PDU
    /// needs to be sent at all.
    pub fn setup_unlock_cbs(&mut self) -> bool {
        if !self.locks_active {
            return false;
        }

        let mut needed = false;
        for ds in Datastore::ALL {
            let cb = &mut self.lock_cbs[ds.index()];
            cb.start_time = None;
            cb.last_msg_time = None;
            if cb.in_use && cb.state == LockState::Active {
                needed = true;
            }
        }
        needed
    }

    /// Clear all lock state back to idle.
    ///
    /// Called on completion, failure, and session teardown.
    pub fn clear_lock_cbs(&mut self) {
        self.locks_active = false;
        self.locks_waiting = false;
        self.current_datastore = Datastore::Running;
        self.command_mode = CommandMode::Normal;
        self.overall_start_time = None;

        for ds in Datastore::ALL {
            self.lock_cbs[ds.index()].reset();
        }

        let now = self.now();
        self.events.push(now, EventAction::StateCleared);
    }

    /// Whether the overall timeout is enabled and has expired at `now`.
    pub fn locks_timeout_expired(&self, now: DateTime<Utc>) -> bool {
        if self.overall_timeout_secs == 0 {
            return false;
        }
        match self.overall_start_time {
            Some(start) => {
                now.signed_duration_since(start).num_seconds()
                    >= i64::from(self.overall_timeout_secs)
            }
            None => false,
        }
    }

    /// Whether every in-use datastore holds its lock.
    pub fn all_locks_granted(&self) -> bool {
        Datastore::ALL
            .iter()
            .all(|ds| self.lock_cbs[ds.index()].is_granted())
    }

    /// Whether any in-use datastore sits in the given state.
    pub fn any_in_state(&self, state: LockState) -> bool {
        Datastore::ALL
            .iter()
            .any(|ds| self.lock_cbs[ds.index()].in_use && self.lock_cbs[ds.index()].state == state)
    }
}

impl Default for LockSession {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LockSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockSession")
            .field("lock_cbs", &self.lock_cbs)
            .field("locks_active", &self.locks_active)
            .field("locks_waiting", &self.locks_waiting)
            .field("current_datastore", &self.current_datastore)
            .field("command_mode", &self.command_mode)
            .field("overall_timeout_secs", &self.overall_timeout_secs)
            .field("retry_interval_secs", &self.retry_interval_secs)
            .field("cleanup_on_failure", &self.cleanup_on_failure)
            .field("overall_start_time", &self.overall_start_time)
            .finish_non_exhaustive()
    }
}
