//! Configuration datastore identifiers.
//!
//! NETCONF servers expose a small, closed set of configuration datastores.
//! The engine always locks `running`; `candidate` and `startup` are only
//! locked when the server advertises the matching capability.

use serde::{Deserialize, Serialize};

/// A NETCONF configuration datastore.
///
/// The variant order is the canonical lock-acquisition priority:
/// running, then candidate, then startup. All scans in the lock and
/// unlock state machines walk [`Datastore::ALL`] in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Datastore {
    /// The running configuration (always lockable).
    Running,
    /// The candidate configuration (requires the :candidate capability).
    Candidate,
    /// The startup configuration (requires the :startup capability).
    Startup,
}

impl Datastore {
    /// All datastores in canonical priority order.
    pub const ALL: [Datastore; 3] = [Datastore::Running, Datastore::Candidate, Datastore::Startup];

    /// The element name used for the `<target>` child in lock/unlock PDUs.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Datastore::Running => "running",
            Datastore::Candidate => "candidate",
            Datastore::Startup => "startup",
        }
    }

    /// Index into per-session lock control block storage.
    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for Datastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}
