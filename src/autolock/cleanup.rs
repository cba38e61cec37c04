//! The cleanup coordinator: release whatever a failed or abandoned cycle
//! left behind.

use super::{release, Progress};
use crate::events::EventAction;
use crate::rpc::{ManagedSession, Schema};
use crate::session::{CommandMode, LockSession};

/// Release any acquired locks and clear all lock state.
///
/// Invoked when a get-locks cycle fails after acquiring zero or more
/// locks, when the session is torn down while locks are held, and after an
/// explicit release-locks completes with leftovers. Idempotent: a session
/// with no active lock state is left untouched and no PDU is ever sent for
/// it.
///
/// If the transport is already gone the state is cleared locally — there
/// is nobody left to send an `<unlock>` to. If `cleanup_on_failure` is
/// unset the caller chose not to auto-release, so state is cleared without
/// unlocking.
pub(super) fn handle_locks_cleanup<S: ManagedSession>(
    sess: &mut LockSession,
    server: &mut S,
    schema: &impl Schema,
) {
    if !sess.locks_active {
        return;
    }

    let now = sess.now();
    sess.events.push(now, EventAction::CleanupStart);

    if !server.is_connected() {
        sess.clear_lock_cbs();
        return;
    }

    if sess.cleanup_on_failure {
        sess.command_mode = CommandMode::AutoUnlock;
        match release::advance_release_locks(sess, server, schema, true) {
            // Done already cleared the state; Pending continues via the
            // reply path.
            Ok(Progress::Done) | Ok(Progress::Pending) => {}
            Err(_) => {
                // Secondary failure: the unlock could not even be sent.
                // The session is unusable; drop the state locally so the
                // caller can close it.
                sess.clear_lock_cbs();
            }
        }
    } else {
        sess.clear_lock_cbs();
    }
}
