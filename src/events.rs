//! Protocol event log for lock coordination.
//!
//! Every milestone of a get-locks/release-locks cycle is appended to a
//! per-session [`EventLog`]: PDUs sent, replies classified, retries,
//! timeouts, cleanup. The log is an explicit object owned by the session
//! context (constructed with it, torn down with it) rather than a
//! module-level registry, and can be exported as NDJSON (one JSON object
//! per line) for audit output.
//!
//! # Event Format
//!
//! Each record carries:
//! - `ts`: RFC3339 timestamp
//! - `action`: what happened (lock_sent, lock_granted, retry_wait, ...)
//! - `datastore`: the datastore involved, where applicable
//! - `detail`: optional freeform text (denial reason, timeout kind, ...)

use crate::datastore::Datastore;
use crate::error::{ConflockError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Actions recorded in the lock event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// get-locks cycle started
    GetLocksStart,
    /// `<lock>` PDU sent
    LockSent,
    /// lock granted by the server
    LockGranted,
    /// lock denied, will retry after the retry interval
    LockDeniedTemp,
    /// lock denied permanently
    LockDeniedFatal,
    /// waiting for a retry interval to elapse
    RetryWait,
    /// every in-use datastore is locked
    GetLocksComplete,
    /// release-locks cycle started
    ReleaseLocksStart,
    /// `<unlock>` PDU sent
    UnlockSent,
    /// unlock confirmed by the server
    UnlockConfirmed,
    /// unlock failed (not retried)
    UnlockFailed,
    /// `<discard-changes>` PDU sent
    DiscardSent,
    /// overall timeout expired
    Timeout,
    /// cleanup coordinator invoked
    CleanupStart,
    /// all lock state cleared
    StateCleared,
}

/// One record in the lock event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockEvent {
    /// When the event occurred.
    pub ts: DateTime<Utc>,

    /// What happened.
    pub action: EventAction,

    /// Datastore involved, if the action is per-datastore.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datastore: Option<Datastore>,

    /// Freeform detail (denial reason, timeout kind, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Append-only in-memory event log, one per lock session.
#[derive(Debug, Default)]
pub struct EventLog {
    records: Vec<LockEvent>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event with no datastore context.
    pub fn push(&mut self, ts: DateTime<Utc>, action: EventAction) {
        self.records.push(LockEvent {
            ts,
            action,
            datastore: None,
            detail: None,
        });
    }

    /// Append a per-datastore event.
    pub fn push_datastore(&mut self, ts: DateTime<Utc>, action: EventAction, ds: Datastore) {
        self.records.push(LockEvent {
            ts,
            action,
            datastore: Some(ds),
            detail: None,
        });
    }

    /// Append an event with freeform detail.
    pub fn push_detail(&mut self, ts: DateTime<Utc>, action: EventAction, detail: impl Into<String>) {
        self.records.push(LockEvent {
            ts,
            action,
            datastore: None,
            detail: Some(detail.into()),
        });
    }

    /// Append a per-datastore event with freeform detail.
    pub fn push_datastore_detail(
        &mut self,
        ts: DateTime<Utc>,
        action: EventAction,
        ds: Datastore,
        detail: impl Into<String>,
    ) {
        self.records.push(LockEvent {
            ts,
            action,
            datastore: Some(ds),
            detail: Some(detail.into()),
        });
    }

    /// All recorded events, oldest first.
    pub fn records(&self) -> &[LockEvent] {
        &self.records
    }

    /// Actions only, for compact assertions and display.
    pub fn actions(&self) -> Vec<EventAction> {
        self.records.iter().map(|e| e.action).collect()
    }

    /// Serialize the log as NDJSON (one JSON object per line).
    pub fn to_ndjson(&self) -> Result<String> {
        let mut out = String::new();
        for record in &self.records {
            let line = serde_json::to_string(record).map_err(|e| {
                ConflockError::Internal(format!("failed to serialize lock event: {}", e))
            })?;
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }

    /// Drop all records (used when lock state is re-initialized).
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
