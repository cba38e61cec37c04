//! The autolock engine: get-locks / release-locks coordination.
//!
//! This module implements the asynchronous state machines that acquire and
//! release exclusive configuration locks across all lockable datastores of
//! one managed session. Nothing here blocks: every entry point sends at
//! most one PDU and returns [`Progress`]; the surrounding event loop
//! re-invokes the engine when a classified reply arrives
//! ([`on_reply_progress`]) or when a retry timer fires
//! ([`on_timer_progress`]).
//!
//! A full acquisition cycle:
//!
//! ```text
//! start_get_locks          -> <lock> running sent
//! on_reply_progress(Ok)    -> <lock> candidate sent (if in use)
//! on_reply_progress(Ok)    -> <lock> startup sent   (if in use)
//! on_reply_progress(Ok)    -> Done; all locks held
//! ```
//!
//! Temporary denials park the datastore in `TempError` and are retried
//! after the configured interval; permanent denials abort the cycle and
//! automatically release whatever was already acquired (when
//! `cleanup_on_failure` is set), discarding candidate edits on the way.

mod acquire;
mod cleanup;
mod pdu;
mod release;
mod reply;

pub use reply::ReplyOutcome;

use crate::error::{ConflockError, Result};
use crate::events::EventAction;
use crate::rpc::{ManagedSession, Schema};
use crate::session::{CommandMode, LockOptions, LockSession};

/// Outcome of one engine invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// More work remains; the engine is waiting for a reply or a timer.
    Pending,
    /// The current cycle is complete.
    Done,
}

impl Progress {
    /// Whether the cycle finished with this invocation.
    pub fn is_done(&self) -> bool {
        matches!(self, Progress::Done)
    }
}

/// Start a get-locks cycle: lock every lockable datastore on the server.
///
/// Sends the first `<lock>` PDU (always for the running datastore) and
/// returns `Pending`. Subsequent progress is driven by
/// [`on_reply_progress`] and [`on_timer_progress`].
///
/// Fails with `OperationFailed` if locks are already active on this
/// session or the session is not connected.
pub fn start_get_locks<S: ManagedSession>(
    sess: &mut LockSession,
    server: &mut S,
    schema: &impl Schema,
    opts: LockOptions,
) -> Result<Progress> {
    if sess.locks_active {
        return Err(ConflockError::OperationFailed(
            "locks are already active".to_string(),
        ));
    }
    if !server.is_connected() {
        return Err(ConflockError::OperationFailed(
            "no active session to lock".to_string(),
        ));
    }

    sess.setup_lock_cbs(server);
    sess.overall_timeout_secs = opts.overall_timeout_secs;
    sess.retry_interval_secs = opts.retry_interval_secs;
    sess.cleanup_on_failure = opts.cleanup_on_failure;

    let now = sess.now();
    sess.events.push(now, EventAction::GetLocksStart);

    acquire::advance_get_locks(sess, server, schema, true)
}

/// Start a release-locks cycle: unlock every datastore locked this cycle.
///
/// A session with no active locks completes immediately without sending
/// anything.
pub fn start_release_locks<S: ManagedSession>(
    sess: &mut LockSession,
    server: &mut S,
    schema: &impl Schema,
) -> Result<Progress> {
    if !sess.locks_active {
        return Ok(Progress::Done);
    }
    if !server.is_connected() {
        return Err(ConflockError::OperationFailed(
            "active session dropped, cannot unlock".to_string(),
        ));
    }

    let needed = sess.setup_unlock_cbs();
    if needed {
        let now = sess.now();
        sess.events.push(now, EventAction::ReleaseLocksStart);
    }

    release::advance_release_locks(sess, server, schema, true)
}

/// Advance the automated sequence that owns this session's replies.
///
/// Called from the transport's reply handler with the already-classified
/// outcome of the reply to the engine's outstanding PDU.
pub fn on_reply_progress<S: ManagedSession>(
    sess: &mut LockSession,
    server: &mut S,
    schema: &impl Schema,
    outcome: ReplyOutcome,
) -> Result<Progress> {
    reply::handle_reply(sess, server, schema, outcome)
}

/// Timer re-entry used while a temporary denial waits out its retry
/// interval.
///
/// The external event loop should call this periodically whenever a prior
/// invocation returned `Pending` without an outstanding PDU (i.e. the
/// session is in its waiting state).
pub fn on_timer_progress<S: ManagedSession>(
    sess: &mut LockSession,
    server: &mut S,
    schema: &impl Schema,
) -> Result<Progress> {
    match sess.command_mode {
        CommandMode::AutoLock if sess.locks_waiting => {
            reply::finish_get_locks_step(sess, server, schema)
        }
        CommandMode::AutoLock | CommandMode::AutoDiscard => {
            // A PDU is outstanding; the only thing a timer tick can do is
            // notice that the overall budget ran out.
            let now = sess.now();
            if sess.locks_timeout_expired(now) {
                sess.events
                    .push_detail(now, EventAction::Timeout, "get-locks timeout");
                cleanup::handle_locks_cleanup(sess, server, schema);
                Err(ConflockError::Timeout("get-locks".to_string()))
            } else {
                Ok(Progress::Pending)
            }
        }
        CommandMode::AutoUnlock => {
            let now = sess.now();
            if sess.locks_timeout_expired(now) {
                sess.events
                    .push_detail(now, EventAction::Timeout, "release-locks timeout");
                sess.clear_lock_cbs();
                Err(ConflockError::Timeout("release-locks".to_string()))
            } else {
                Ok(Progress::Pending)
            }
        }
        CommandMode::Normal => Ok(Progress::Done),
    }
}

/// Release everything on session teardown.
///
/// Safe to call unconditionally; a session with no lock state is left
/// untouched. If the transport is already gone the state is cleared
/// locally without sending anything.
pub fn teardown_cleanup<S: ManagedSession>(
    sess: &mut LockSession,
    server: &mut S,
    schema: &impl Schema,
) {
    if sess.locks_active {
        cleanup::handle_locks_cleanup(sess, server, schema);
    }
}
