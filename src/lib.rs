//! Conflock: NETCONF datastore lock coordination for command-line
//! management clients.
//!
//! A NETCONF client that wants exclusive write access to a server must
//! lock every lockable configuration datastore — running, and (when the
//! server advertises them) candidate and startup. This crate implements
//! the asynchronous state machines that acquire those locks in canonical
//! order, retry temporary denials, enforce an overall timeout, and
//! guarantee that everything acquired is released again on success,
//! failure, or shutdown, discarding stray candidate edits on the way.
//!
//! The engine is single-threaded and never blocks: each entry point sends
//! at most one PDU over the caller-supplied [`rpc::ManagedSession`] and
//! returns [`autolock::Progress`]. The surrounding event loop re-invokes
//! it with classified replies and timer ticks. See [`autolock`] for the
//! public operations.

pub mod autolock;
pub mod clock;
pub mod datastore;
pub mod error;
pub mod events;
pub mod lockcb;
pub mod rpc;
pub mod session;
pub mod xmlval;

#[cfg(test)]
pub(crate) mod test_support;

pub use autolock::{
    on_reply_progress, on_timer_progress, start_get_locks, start_release_locks, teardown_cleanup,
    Progress, ReplyOutcome,
};
pub use datastore::Datastore;
pub use error::{ConflockError, Result};
pub use session::{CommandMode, LockOptions, LockSession};
