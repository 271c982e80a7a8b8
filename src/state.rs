//! Session state repository.
//!
//! DESIGN
//! ======
//! `SessionState` is the single source of truth read by renderers. The
//! session machine is its exclusive writer: fields are private and every
//! mutation funnels through a typed setter, so the single-writer invariant
//! is carried by the type rather than by convention. Out-of-range node
//! indices are dropped with a warning — steady-state frames are noise,
//! never a reason to poison the session.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::protocol::Params;

// =============================================================================
// NODES
// =============================================================================

/// Lifecycle status of a single DAG node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    NotReady,
    InProgress,
    Completed,
}

/// One node of the remote DAG.
///
/// A node's index is its position in [`SessionState::nodes`], assigned by
/// handshake arrival order and immutable for the rest of the session. Nodes
/// are created in bulk at handshake and never removed while connected.
#[derive(Debug, Clone, Serialize)]
pub struct DagNode {
    /// Raw descriptor as received in the handshake.
    pub descriptor: Value,
    pub status: NodeStatus,
    /// Fraction in `0..=1`. `Completed` implies `1`.
    pub progress: f64,
    /// Runtime input parameters, locally echoed on every update.
    pub input: Params,
    /// Result payload recorded by the node's completion event.
    pub output: Option<Value>,
}

impl DagNode {
    fn new(descriptor: Value) -> Self {
        Self {
            descriptor,
            status: NodeStatus::NotReady,
            progress: 0.0,
            input: Params::new(),
            output: None,
        }
    }
}

// =============================================================================
// SESSION STATE
// =============================================================================

/// Connection and per-node state for one compute session.
#[derive(Debug, Default)]
pub struct SessionState {
    connected: bool,
    got_initial: bool,
    load_complete: bool,
    initial_load_progress: f64,
    nodes: Vec<DagNode>,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- read-only surface for renderers -------------------------------------

    #[must_use]
    pub fn connected(&self) -> bool {
        self.connected
    }

    #[must_use]
    pub fn got_initial(&self) -> bool {
        self.got_initial
    }

    #[must_use]
    pub fn load_complete(&self) -> bool {
        self.load_complete
    }

    #[must_use]
    pub fn initial_load_progress(&self) -> f64 {
        self.initial_load_progress
    }

    #[must_use]
    pub fn nodes(&self) -> &[DagNode] {
        &self.nodes
    }

    // -- typed setters, crate-private ----------------------------------------

    pub(crate) fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub(crate) fn set_got_initial(&mut self, got_initial: bool) {
        self.got_initial = got_initial;
    }

    /// Replace the node list with fresh nodes built from `descriptors`.
    /// Every node starts `NotReady` at progress zero.
    pub(crate) fn set_dag_nodes(&mut self, descriptors: Vec<Value>) {
        self.nodes = descriptors.into_iter().map(DagNode::new).collect();
    }

    pub(crate) fn set_status(&mut self, index: usize, status: NodeStatus) {
        if let Some(node) = self.node_mut(index) {
            node.status = status;
        }
    }

    pub(crate) fn set_progress(&mut self, index: usize, progress: f64) {
        if let Some(node) = self.node_mut(index) {
            node.progress = progress;
        }
    }

    /// Merge `params` into the node's input map. Merge, not replace: a
    /// single-key echo must not wipe previously seeded defaults.
    pub(crate) fn set_node_input(&mut self, params: Params, index: usize) {
        if let Some(node) = self.node_mut(index) {
            node.input.extend(params);
        }
    }

    pub(crate) fn set_node_output(&mut self, output: Value, index: usize) {
        if let Some(node) = self.node_mut(index) {
            node.output = Some(output);
        }
    }

    pub(crate) fn set_initial_load_progress(&mut self, progress: f64) {
        self.initial_load_progress = progress;
    }

    pub(crate) fn set_load_complete(&mut self, load_complete: bool) {
        self.load_complete = load_complete;
    }

    fn node_mut(&mut self, index: usize) -> Option<&mut DagNode> {
        let count = self.nodes.len();
        let node = self.nodes.get_mut(index);
        if node.is_none() {
            warn!(index, count, "state: node index out of range, ignoring");
        }
        node
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
