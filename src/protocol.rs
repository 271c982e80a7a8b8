//! Wire protocol for the DAG compute session.
//!
//! DESIGN
//! ======
//! One JSON object per WebSocket text frame, tagged by `type`. The handshake
//! is the single untagged exception: the first frame after open carries the
//! DAG definition and nothing else. Node descriptors stay flexible
//! (`serde_json::Value`) so renderers can show whatever the server sends.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Flat key-value parameter map. Alias to reduce noise in signatures.
pub type Params = HashMap<String, Value>;

/// Handshake payload: the ordered sequence of DAG node descriptors.
///
/// Arrival order assigns each node its index for the rest of the session.
#[derive(Debug, Clone, Deserialize)]
pub struct Handshake {
    pub dag_nodes: Vec<Value>,
}

/// Steady-state event streamed by the compute server after the handshake.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A node reported partial progress in `0..=1`.
    Progress { node_ind: usize, progress: f64 },
    /// A node finished and produced output.
    Completed { node_ind: usize, results: Value },
}

/// Outbound command sent to the compute server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Handshake acknowledgement.
    GotMessage,
    /// Mutate one runtime parameter on a node. `value` is pre-stringified;
    /// the server expects normalized fractions for percentage parameters.
    ParamUpdate {
        node_ind: usize,
        key: String,
        value: String,
    },
}

#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;
