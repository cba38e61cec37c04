//! Collaborator interfaces: the management session and the schema library.
//!
//! The engine never owns a socket or an XML parser. It builds request
//! trees, hands them to a [`ManagedSession`], and is re-invoked by the
//! surrounding event loop when a reply (already decoded and classified)
//! arrives. Schema knowledge is consumed through [`Schema`], which resolves
//! RPC definitions by name the way a YANG module library would.

use crate::error::{ConflockError, Result};
use crate::xmlval::XmlValue;

/// XML namespace of the NETCONF base:1.0 operations.
pub const NETCONF_NS: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";

/// Standard capabilities the engine cares about.
///
/// Only the capabilities that gate datastore lockability are modeled;
/// everything else the server advertises is the transport's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// `urn:ietf:params:netconf:capability:candidate:1.0`
    Candidate,
    /// `urn:ietf:params:netconf:capability:startup:1.0`
    Startup,
}

/// A resolved RPC (or RPC child) definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcDef {
    /// Definition name (e.g. `lock`).
    pub name: String,
    /// Namespace URI the definition lives in.
    pub namespace: String,
}

impl RpcDef {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

/// A fully built RPC request, ready for the transport to frame and send.
#[derive(Debug, Clone)]
pub struct RpcRequest {
    /// The RPC definition this request invokes.
    pub rpc: RpcDef,
    /// The constructed parameter tree (the `<rpc>` payload).
    pub data: XmlValue,
    /// Per-request reply timeout, in seconds.
    pub timeout_secs: u32,
}

/// Errors a transport can report when asked to send a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The session is no longer connected.
    NotConnected,
    /// The transport could not construct/queue the request.
    Allocation(String),
    /// The request was constructed but could not be written.
    Io(String),
}

impl SendError {
    pub(crate) fn into_conflock(self) -> ConflockError {
        match self {
            SendError::NotConnected => {
                ConflockError::Internal("active session dropped, cannot send".to_string())
            }
            SendError::Allocation(msg) => ConflockError::Allocation(msg),
            SendError::Io(msg) => ConflockError::Transport(msg),
        }
    }
}

/// Live NETCONF management session, as seen by the lock engine.
///
/// Implementors own the SSH channel, message framing, message-id
/// bookkeeping, and reply delivery. Sending a request implicitly puts the
/// session into its reply-wait state; the engine never sends a second
/// lock/unlock PDU before the first is resolved.
pub trait ManagedSession {
    /// Whether the underlying transport is still usable.
    fn is_connected(&self) -> bool;

    /// Whether the server advertised the given capability in its hello.
    fn supports(&self, cap: Capability) -> bool;

    /// Frame and send one RPC request.
    fn send_request(&mut self, req: RpcRequest) -> std::result::Result<(), SendError>;

    /// Per-request reply timeout to stamp on outgoing requests, in seconds.
    fn request_timeout_secs(&self) -> u32 {
        30
    }
}

/// RPC definition lookup, backed by the client's loaded module library.
pub trait Schema {
    /// Resolve a top-level RPC definition by name.
    fn find_rpc(&self, name: &str) -> Option<RpcDef>;

    /// Resolve a child (e.g. the `input` container) of a definition.
    fn find_child(&self, def: &RpcDef, name: &str) -> Option<RpcDef>;
}

pub(crate) fn require_rpc(schema: &impl Schema, name: &str) -> Result<RpcDef> {
    schema
        .find_rpc(name)
        .ok_or_else(|| ConflockError::DefinitionNotFound(name.to_string()))
}

pub(crate) fn require_child(schema: &impl Schema, def: &RpcDef, name: &str) -> Result<RpcDef> {
    schema
        .find_child(def, name)
        .ok_or_else(|| ConflockError::DefinitionNotFound(format!("{}/{}", def.name, name)))
}

/// Built-in schema covering the base:1.0 operations the engine sends.
///
/// Clients with a full YANG module library will implement [`Schema`] over
/// it; this covers the common case where only the three base operations
/// are needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseSchema;

impl Schema for BaseSchema {
    fn find_rpc(&self, name: &str) -> Option<RpcDef> {
        match name {
            "lock" | "unlock" | "discard-changes" => Some(RpcDef::new(name, NETCONF_NS)),
            _ => None,
        }
    }

    fn find_child(&self, def: &RpcDef, name: &str) -> Option<RpcDef> {
        // lock and unlock take an input container with a target; the
        // discard-changes operation has no parameters.
        match (def.name.as_str(), name) {
            ("lock" | "unlock", "input") => Some(RpcDef::new(name, def.namespace.clone())),
            _ => None,
        }
    }
}
