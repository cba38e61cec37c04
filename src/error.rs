//! Error types for the conflock engine.
//!
//! Uses thiserror for derive macros. The taxonomy mirrors the failure
//! classes of the lock state machines: invariant violations, request
//! construction/send failures, schema lookup failures, permanent protocol
//! denials, and overall-timeout expiry.
//!
//! Temporary lock denials are deliberately *not* represented here: they are
//! recorded in the per-datastore control block as
//! [`LockState::TempError`](crate::lockcb::LockState::TempError) and drive
//! retries. A caller only ever observes them as
//! [`Progress::Pending`](crate::autolock::Progress::Pending).

use thiserror::Error;

/// Main error type for conflock operations.
#[derive(Error, Debug)]
pub enum ConflockError {
    /// Programming invariant violation or unexpected state.
    ///
    /// Always fatal to the current operation (e.g., a reply delivered while
    /// no automated sequence owns the session's reply handling).
    #[error("internal error: {0}")]
    Internal(String),

    /// The transport could not allocate/construct an RPC request.
    #[error("failed to allocate RPC request: {0}")]
    Allocation(String),

    /// The transport accepted the request but failed to send it.
    #[error("failed to send RPC request: {0}")]
    Transport(String),

    /// The lock/unlock/discard-changes RPC definition could not be resolved
    /// from the schema. Fatal; usually a misconfigured module library.
    #[error("RPC definition not found: {0}")]
    DefinitionNotFound(String),

    /// A datastore lock was permanently denied, or a command precondition
    /// failed. Aborts the whole cycle.
    #[error("operation failed: {0}")]
    OperationFailed(String),

    /// The overall lock/unlock timeout was exceeded.
    #[error("timed out: {0}")]
    Timeout(String),
}

impl ConflockError {
    /// Whether this error automatically triggered lock-state cleanup before
    /// it was returned.
    ///
    /// Protocol-level denials and timeouts run the cleanup coordinator
    /// before propagating, since leaving partial locks held is never
    /// correct. Transport and allocation failures are returned as-is so the
    /// caller can inspect partial state for diagnostics.
    pub fn cleanup_already_run(&self) -> bool {
        matches!(
            self,
            ConflockError::OperationFailed(_) | ConflockError::Timeout(_)
        )
    }
}

/// Result type alias for conflock operations.
pub type Result<T> = std::result::Result<T, ConflockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_errors_report_cleanup_already_run() {
        assert!(ConflockError::OperationFailed("denied".into()).cleanup_already_run());
        assert!(ConflockError::Timeout("get-locks".into()).cleanup_already_run());
    }

    #[test]
    fn transport_errors_leave_cleanup_to_the_caller() {
        assert!(!ConflockError::Internal("bad state".into()).cleanup_already_run());
        assert!(!ConflockError::Allocation("oom".into()).cleanup_already_run());
        assert!(!ConflockError::Transport("broken pipe".into()).cleanup_already_run());
        assert!(!ConflockError::DefinitionNotFound("lock".into()).cleanup_already_run());
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = ConflockError::DefinitionNotFound("unlock".to_string());
        assert_eq!(err.to_string(), "RPC definition not found: unlock");

        let err = ConflockError::Timeout("get-locks timeout".to_string());
        assert_eq!(err.to_string(), "timed out: get-locks timeout");
    }
}
