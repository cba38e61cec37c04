//! Shared test fixtures.
//!
//! `ScriptedSession` stands in for the transport: it records every PDU the
//! engine sends and can be scripted to fail or drop the connection.
//! `ManualClock` lets the time-law tests advance the clock without
//! sleeping.

use crate::clock::Clock;
use crate::rpc::{Capability, ManagedSession, RpcRequest, SendError};
use crate::xmlval::XmlContent;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::cell::Cell;
use std::rc::Rc;

/// Manually advanced time source shared between the test and the session.
#[derive(Clone)]
pub(crate) struct ManualClock {
    current: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub(crate) fn new() -> Self {
        let epoch = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        Self {
            current: Rc::new(Cell::new(epoch)),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        self.current.set(self.current.get() + by);
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.current.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.current.get()
    }
}

/// Fake management session that records sent PDUs.
pub(crate) struct ScriptedSession {
    connected: bool,
    caps: Vec<Capability>,
    fail_next: Option<SendError>,
    pub(crate) sent: Vec<RpcRequest>,
}

impl ScriptedSession {
    pub(crate) fn new() -> Self {
        Self {
            connected: true,
            caps: Vec::new(),
            fail_next: None,
            sent: Vec::new(),
        }
    }

    pub(crate) fn with_capabilities(mut self, caps: &[Capability]) -> Self {
        self.caps = caps.to_vec();
        self
    }

    pub(crate) fn disconnect(&mut self) {
        self.connected = false;
    }

    /// Make the next send_request call fail with the given error.
    pub(crate) fn fail_next_send(&mut self, err: SendError) {
        self.fail_next = Some(err);
    }

    /// Compact labels for every PDU sent, in order: `lock:running`,
    /// `unlock:candidate`, `discard-changes`, ...
    pub(crate) fn sent_ops(&self) -> Vec<String> {
        self.sent.iter().map(op_label).collect()
    }
}

fn op_label(req: &RpcRequest) -> String {
    match req.rpc.name.as_str() {
        "lock" | "unlock" => {
            let target_child = req
                .data
                .find_child("target")
                .and_then(|t| match &t.content {
                    XmlContent::Struct(children) => children.first(),
                    _ => None,
                });
            match target_child {
                Some(ds) => format!("{}:{}", req.rpc.name, ds.name),
                None => req.rpc.name.clone(),
            }
        }
        other => other.to_string(),
    }
}

impl ManagedSession for ScriptedSession {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn supports(&self, cap: Capability) -> bool {
        self.caps.contains(&cap)
    }

    fn send_request(&mut self, req: RpcRequest) -> Result<(), SendError> {
        if !self.connected {
            return Err(SendError::NotConnected);
        }
        if let Some(err) = self.fail_next.take() {
            return Err(err);
        }
        self.sent.push(req);
        Ok(())
    }
}
