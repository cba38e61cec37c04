//! Reply-progress dispatch.
//!
//! The transport decodes each `<rpc-reply>` and classifies it before
//! handing it to the engine. Exactly one automated sequence owns the
//! session's replies at any time ([`CommandMode`]); this module records
//! the reply into the control block that sent the outstanding PDU and
//! re-drives the owning state machine.

use super::{acquire, cleanup, pdu, release, Progress};
use crate::datastore::Datastore;
use crate::error::{ConflockError, Result};
use crate::events::EventAction;
use crate::lockcb::LockState;
use crate::rpc::{ManagedSession, Schema};
use crate::session::{CommandMode, LockSession};

/// Classified outcome of a reply to the engine's outstanding PDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// The operation succeeded (`<ok/>`).
    Ok,
    /// RFC 6241 `lock-denied`: held by another party, may free up later.
    LockDenied,
    /// Any other `<rpc-error>`; retrying will not help.
    Error(String),
}

pub(super) fn handle_reply<S: ManagedSession>(
    sess: &mut LockSession,
    server: &mut S,
    schema: &impl Schema,
    outcome: ReplyOutcome,
) -> Result<Progress> {
    match sess.command_mode {
        CommandMode::AutoLock => handle_lock_reply(sess, server, schema, outcome),
        CommandMode::AutoUnlock => handle_unlock_reply(sess, server, schema, outcome),
        CommandMode::AutoDiscard => handle_discard_reply(sess, server, schema, outcome),
        CommandMode::Normal => Err(ConflockError::Internal(
            "reply delivered with no automated sequence in progress".to_string(),
        )),
    }
}

fn handle_lock_reply<S: ManagedSession>(
    sess: &mut LockSession,
    server: &mut S,
    schema: &impl Schema,
    outcome: ReplyOutcome,
) -> Result<Progress> {
    let ds = sess.current_datastore;
    let now = sess.now();

    match outcome {
        ReplyOutcome::Ok => {
            sess.lock_cb_mut(ds).state = LockState::Active;
            sess.events.push_datastore(now, EventAction::LockGranted, ds);
        }
        ReplyOutcome::LockDenied => {
            sess.lock_cb_mut(ds).state = LockState::TempError;
            sess.events
                .push_datastore(now, EventAction::LockDeniedTemp, ds);
        }
        ReplyOutcome::Error(msg) => {
            if ds == Datastore::Candidate {
                // A candidate lock can fail because another client left
                // uncommitted edits behind. Roll them back with
                // <discard-changes>; its reply re-enters this driver.
                match pdu::send_discard_changes_pdu(sess, server, schema) {
                    Ok(()) => return Ok(Progress::Pending),
                    Err(e) => {
                        cleanup::handle_locks_cleanup(sess, server, schema);
                        return Err(e);
                    }
                }
            }
            sess.lock_cb_mut(ds).state = LockState::FatalError;
            sess.events
                .push_datastore_detail(now, EventAction::LockDeniedFatal, ds, msg);
        }
    }

    finish_get_locks_step(sess, server, schema)
}

/// Re-drive the acquisition driver and interpret its completion.
///
/// On `Done` the cycle only counts as a success when every in-use
/// datastore actually holds its lock; anything else (e.g. a candidate
/// abandoned after a failed rollback) triggers cleanup and surfaces as
/// `OperationFailed`.
pub(super) fn finish_get_locks_step<S: ManagedSession>(
    sess: &mut LockSession,
    server: &mut S,
    schema: &impl Schema,
) -> Result<Progress> {
    match acquire::advance_get_locks(sess, server, schema, false)? {
        Progress::Pending => Ok(Progress::Pending),
        Progress::Done => {
            if sess.all_locks_granted() {
                sess.command_mode = CommandMode::Normal;
                sess.locks_waiting = false;
                let now = sess.now();
                sess.events.push(now, EventAction::GetLocksComplete);
                Ok(Progress::Done)
            } else {
                cleanup::handle_locks_cleanup(sess, server, schema);
                Err(ConflockError::OperationFailed(
                    "get-locks failed, partial locks released".to_string(),
                ))
            }
        }
    }
}

fn handle_unlock_reply<S: ManagedSession>(
    sess: &mut LockSession,
    server: &mut S,
    schema: &impl Schema,
    outcome: ReplyOutcome,
) -> Result<Progress> {
    let ds = sess.current_datastore;
    let now = sess.now();

    match outcome {
        ReplyOutcome::Ok => {
            sess.lock_cb_mut(ds).state = LockState::Released;
            sess.events
                .push_datastore(now, EventAction::UnlockConfirmed, ds);
        }
        ReplyOutcome::LockDenied | ReplyOutcome::Error(_) => {
            // Unlock failures are final; move on to the next datastore.
            sess.lock_cb_mut(ds).state = LockState::FatalError;
            sess.events.push_datastore(now, EventAction::UnlockFailed, ds);
        }
    }

    release::advance_release_locks(sess, server, schema, false)
}

fn handle_discard_reply<S: ManagedSession>(
    sess: &mut LockSession,
    server: &mut S,
    schema: &impl Schema,
    outcome: ReplyOutcome,
) -> Result<Progress> {
    sess.command_mode = CommandMode::AutoLock;

    match outcome {
        ReplyOutcome::Ok => finish_get_locks_step(sess, server, schema),
        ReplyOutcome::LockDenied | ReplyOutcome::Error(_) => {
            cleanup::handle_locks_cleanup(sess, server, schema);
            Err(ConflockError::OperationFailed(
                "discard-changes failed during candidate rollback".to_string(),
            ))
        }
    }
}
