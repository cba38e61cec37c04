//! The get-locks acquisition driver.

use super::{cleanup, pdu, Progress};
use crate::datastore::Datastore;
use crate::error::{ConflockError, Result};
use crate::events::EventAction;
use crate::lockcb::LockState;
use crate::rpc::{ManagedSession, Schema};
use crate::session::{CommandMode, LockSession};

/// Advance the acquisition state machine by at most one `<lock>` PDU.
///
/// Invoked once per external trigger: `first` is true for the initial
/// call of the cycle, false for reply/timer re-entries. Scans the
/// datastores in canonical priority order (running, candidate, startup):
/// the first in-use block still `Idle` is the send target; failing that,
/// the first `TempError` block whose retry interval has elapsed. A
/// `TempError` block that is not yet eligible parks the session in its
/// waiting state (`Pending` with no outstanding PDU); no target and no
/// waiting block means the scan is complete.
///
/// A block in `FatalError` short-circuits the whole cycle: cleanup runs
/// and the call fails with `OperationFailed`. Fatal errors are never
/// retried.
pub(super) fn advance_get_locks<S: ManagedSession>(
    sess: &mut LockSession,
    server: &mut S,
    schema: &impl Schema,
    first: bool,
) -> Result<Progress> {
    let now = sess.now();

    if first {
        sess.overall_start_time = Some(now);
    } else if sess.locks_timeout_expired(now) {
        sess.events
            .push_detail(now, EventAction::Timeout, "get-locks timeout");
        cleanup::handle_locks_cleanup(sess, server, schema);
        return Err(ConflockError::Timeout("get-locks".to_string()));
    }

    // First pass: a datastore that has not been asked yet.
    let mut target = None;
    for ds in Datastore::ALL {
        let cb = sess.lock_cb(ds);
        if !cb.in_use {
            continue;
        }
        match cb.state {
            LockState::Idle => {
                target = Some(ds);
                break;
            }
            LockState::FatalError => {
                cleanup::handle_locks_cleanup(sess, server, schema);
                return Err(ConflockError::OperationFailed(format!(
                    "fatal error getting lock on the {} config",
                    ds
                )));
            }
            _ => {}
        }
    }

    // Second pass: temporary denials whose retry interval has elapsed.
    if target.is_none() {
        let was_waiting = sess.locks_waiting;
        let mut still_waiting = false;

        for ds in Datastore::ALL {
            let cb = sess.lock_cb(ds);
            if cb.in_use && cb.state == LockState::TempError {
                if cb.retry_elapsed(now, sess.retry_interval_secs) {
                    target = Some(ds);
                    break;
                }
                still_waiting = true;
            }
        }

        if target.is_some() {
            sess.locks_waiting = false;
        } else if still_waiting {
            sess.locks_waiting = true;
            if !was_waiting {
                let ts = sess.now();
                sess.events.push(ts, EventAction::RetryWait);
            }
            return Ok(Progress::Pending);
        } else {
            // Every in-use datastore is past the request stage and none is
            // retryable: nothing left for this driver to send.
            return Ok(Progress::Done);
        }
    }

    match target {
        Some(ds) => {
            sess.command_mode = CommandMode::AutoLock;
            pdu::send_lock_pdu(sess, server, schema, ds, true)?;
            Ok(Progress::Pending)
        }
        None => Ok(Progress::Done),
    }
}
