//! Construction and dispatch of single lock/unlock/discard-changes PDUs.
//!
//! One function call builds and sends exactly one RPC. Retry and ordering
//! decisions belong to the drivers; on any failure the control block is
//! left unchanged and the error propagates.

use crate::datastore::Datastore;
use crate::error::{ConflockError, Result};
use crate::events::EventAction;
use crate::lockcb::LockState;
use crate::rpc::{require_child, require_rpc, ManagedSession, RpcRequest, Schema};
use crate::session::{CommandMode, LockSession};
use crate::xmlval::XmlValue;

/// Build and send a `<lock>` or `<unlock>` RPC targeting one datastore.
///
/// On successful send: the control block moves to `RequestSent`
/// (lock) or `ReleaseSent` (unlock), `last_msg_time` is stamped,
/// `start_time` is stamped on the first lock attempt for the datastore,
/// and the session records the datastore as the current PDU target.
pub(super) fn send_lock_pdu<S: ManagedSession>(
    sess: &mut LockSession,
    server: &mut S,
    schema: &impl Schema,
    ds: Datastore,
    is_lock: bool,
) -> Result<()> {
    let op = if is_lock { "lock" } else { "unlock" };

    let rpc = require_rpc(schema, op)?;
    // The input container holds the target parameter; a schema without it
    // cannot describe this operation.
    let _input = require_child(schema, &rpc, "input")?;

    let mut reqdata = XmlValue::new_struct(rpc.name.clone(), rpc.namespace.clone());
    let mut target = XmlValue::new_struct("target", rpc.namespace.clone());
    target.add_child(XmlValue::new_flag(ds.wire_name(), rpc.namespace.clone()));
    reqdata.add_child(target);

    if !server.is_connected() {
        return Err(ConflockError::Internal(
            "active session dropped, cannot send".to_string(),
        ));
    }

    let req = RpcRequest {
        rpc,
        data: reqdata,
        timeout_secs: server.request_timeout_secs(),
    };
    server.send_request(req).map_err(|e| e.into_conflock())?;

    let now = sess.now();
    let cb = sess.lock_cb_mut(ds);
    if is_lock {
        cb.state = LockState::RequestSent;
        if cb.start_time.is_none() {
            cb.start_time = Some(now);
        }
    } else {
        cb.state = LockState::ReleaseSent;
    }
    cb.last_msg_time = Some(now);
    sess.current_datastore = ds;

    let action = if is_lock {
        EventAction::LockSent
    } else {
        EventAction::UnlockSent
    };
    sess.events.push_datastore(now, action, ds);

    Ok(())
}

/// Build and send a `<discard-changes>` RPC.
///
/// Used on the rollback path when locking the candidate datastore failed
/// because of leftover edits. On successful send the session enters
/// AutoDiscard mode; the reply re-enters the acquisition driver.
pub(super) fn send_discard_changes_pdu<S: ManagedSession>(
    sess: &mut LockSession,
    server: &mut S,
    schema: &impl Schema,
) -> Result<()> {
    let rpc = require_rpc(schema, "discard-changes")?;

    // No parameters: the method node itself is the whole payload.
    let reqdata = XmlValue::new_flag(rpc.name.clone(), rpc.namespace.clone());

    if !server.is_connected() {
        return Err(ConflockError::Internal(
            "active session dropped, cannot send".to_string(),
        ));
    }

    let req = RpcRequest {
        rpc,
        data: reqdata,
        timeout_secs: server.request_timeout_secs(),
    };
    server.send_request(req).map_err(|e| e.into_conflock())?;

    sess.command_mode = CommandMode::AutoDiscard;
    let now = sess.now();
    sess.events.push(now, EventAction::DiscardSent);

    Ok(())
}
