//! The release-locks driver.
//!
//! Simpler than acquisition: unlock failures are not retried, so there is
//! no temporary-error scan and no waiting state. The overall timeout
//! force-clears lock state instead of merely aborting, because there is no
//! safe partial-unlock retry path.

use super::{pdu, Progress};
use crate::datastore::Datastore;
use crate::error::{ConflockError, Result};
use crate::events::EventAction;
use crate::lockcb::LockState;
use crate::rpc::{ManagedSession, Schema};
use crate::session::{CommandMode, LockSession};

/// Advance the release state machine by at most one `<unlock>` PDU.
///
/// Scans in canonical order for the first in-use datastore still holding
/// its lock and sends `<unlock>` for it. When none remains the cycle is
/// done: all lock state is cleared and the session no longer holds locks.
pub(super) fn advance_release_locks<S: ManagedSession>(
    sess: &mut LockSession,
    server: &mut S,
    schema: &impl Schema,
    first: bool,
) -> Result<Progress> {
    let now = sess.now();

    if first {
        sess.command_mode = CommandMode::AutoUnlock;
        sess.overall_start_time = Some(now);
    } else if sess.locks_timeout_expired(now) {
        sess.events
            .push_detail(now, EventAction::Timeout, "release-locks timeout");
        sess.clear_lock_cbs();
        return Err(ConflockError::Timeout("release-locks".to_string()));
    }

    let mut target = None;
    for ds in Datastore::ALL {
        let cb = sess.lock_cb(ds);
        if cb.in_use && cb.state == LockState::Active {
            target = Some(ds);
            break;
        }
    }

    match target {
        Some(ds) => {
            pdu::send_lock_pdu(sess, server, schema, ds, false)?;
            Ok(Progress::Pending)
        }
        None => {
            sess.clear_lock_cbs();
            Ok(Progress::Done)
        }
    }
}
