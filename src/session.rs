//! Protocol session machine — decodes inbound frames, encodes outbound
//! commands.
//!
//! DESIGN
//! ======
//! A connection lives in one of two phases. The first frame after open is
//! structurally different from everything that follows, so it gets its own
//! phase instead of being re-parsed as a steady-state event:
//! - `AwaitingInitial`: the next frame must be the DAG handshake. Accepting
//!   it seeds node state, queues the acknowledgement, and flips to `Ready`.
//!   Rejecting it surfaces an alert and stays put — no ack, no retry.
//! - `Ready`: frames are typed events. Anything unrecognized is dropped
//!   silently; one bad frame never affects the next.
//!
//! The machine is pure: `handle` consumes typed socket events and returns
//! actions for the driver to execute. No I/O happens here, which keeps every
//! protocol rule testable without a socket.

use tracing::{debug, info, warn};

use crate::protocol::{Command, Handshake, Params, ServerEvent};
use crate::state::{NodeStatus, SessionState};

// =============================================================================
// PROTOCOL CONVENTIONS
// =============================================================================

/// Node whose progress events proxy overall bootstrap progress.
pub const PRIMARY_STAGE: usize = 0;

/// Node whose completion marks the end of bootstrap. Also receives the
/// default alignment parameters at handshake.
pub const SECONDARY_STAGE: usize = 1;

/// Alignment parameters seeded onto the secondary stage. The handshake does
/// not carry them, but the stage accepts updates for both from the start.
pub const PARAM_PARALLEL_TILT: &str = "parallel_tilt";
pub const PARAM_PARALLEL_TWIST: &str = "parallel_twist";

// =============================================================================
// EVENTS, ACTIONS, ALERTS
// =============================================================================

/// Lifecycle and transport events fed into the session machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// The transport opened.
    Opened,
    /// The transport closed. Safe to deliver more than once.
    Closed,
    /// The transport reported an error without closing.
    Errored(String),
    /// One inbound text frame.
    Frame(String),
}

/// Work the driver must perform after an event is absorbed.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Serialize and send this command on the current connection.
    Send(Command),
    /// Surface this alert to the user.
    Alert(SessionAlert),
}

/// User-visible session problems. Never fatal to the process, never retried
/// automatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionAlert {
    #[error("websocket transport error: {0}")]
    Transport(String),
    #[error("cannot parse dag nodes: {0}")]
    BadHandshake(String),
}

// =============================================================================
// SESSION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    AwaitingInitial,
    Ready,
}

/// Two-phase protocol state machine for one connection at a time.
#[derive(Debug, Default)]
pub struct Session {
    phase: Phase,
    state: SessionState,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The state repository this session writes. Read-only for callers.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Absorb one socket event and return the actions it produced.
    pub fn handle(&mut self, event: SocketEvent) -> Vec<Action> {
        match event {
            SocketEvent::Opened => {
                self.phase = Phase::AwaitingInitial;
                self.state.set_connected(true);
                self.state.set_got_initial(false);
                info!("session: connected, awaiting dag handshake");
                vec![]
            }
            SocketEvent::Closed => {
                if self.state.connected() {
                    info!("session: closed");
                }
                self.phase = Phase::AwaitingInitial;
                self.state.set_connected(false);
                vec![]
            }
            SocketEvent::Errored(message) => {
                warn!(%message, "session: transport error");
                vec![Action::Alert(SessionAlert::Transport(message))]
            }
            SocketEvent::Frame(text) => match self.phase {
                Phase::AwaitingInitial => self.on_handshake(&text),
                Phase::Ready => self.on_event(&text),
            },
        }
    }

    /// Encode a parameter update and echo it into local node input.
    ///
    /// Returns `None` while disconnected: nothing to send, nothing mutated.
    /// Percentage values are sent normalized to `0..=1` but echoed locally at
    /// human scale — renderers keep showing what the user typed.
    pub fn update_param(
        &mut self,
        node_index: usize,
        key: &str,
        value: f64,
        as_percentage: bool,
    ) -> Option<Command> {
        if !self.state.connected() {
            debug!(node_index, key, "session: not connected, dropping param update");
            return None;
        }

        let wire_value = if as_percentage { value / 100.0 } else { value };

        let mut params = Params::new();
        params.insert(key.to_owned(), value.into());
        self.state.set_node_input(params, node_index);

        Some(Command::ParamUpdate {
            node_ind: node_index,
            key: key.to_owned(),
            value: format!("{wire_value}"),
        })
    }

    // -- phase handlers -------------------------------------------------------

    fn on_handshake(&mut self, text: &str) -> Vec<Action> {
        let handshake = match serde_json::from_str::<Handshake>(text) {
            Ok(handshake) if handshake.dag_nodes.is_empty() => {
                warn!("session: dag handshake rejected: empty node list");
                return vec![Action::Alert(SessionAlert::BadHandshake(
                    "dag node list is empty".to_owned(),
                ))];
            }
            Ok(handshake) => handshake,
            Err(error) => {
                warn!(%error, "session: dag handshake rejected");
                return vec![Action::Alert(SessionAlert::BadHandshake(error.to_string()))];
            }
        };

        let count = handshake.dag_nodes.len();
        self.state.set_dag_nodes(handshake.dag_nodes);
        self.seed_secondary_defaults();
        self.state.set_got_initial(true);
        self.phase = Phase::Ready;
        info!(nodes = count, "session: dag handshake accepted");

        vec![Action::Send(Command::GotMessage)]
    }

    fn on_event(&mut self, text: &str) -> Vec<Action> {
        let event = match serde_json::from_str::<ServerEvent>(text) {
            Ok(event) => event,
            Err(error) => {
                // Protocol noise: dropped without surfacing, unlike a
                // handshake parse failure.
                debug!(%error, "session: ignoring unrecognized frame");
                return vec![];
            }
        };

        match event {
            ServerEvent::Progress { node_ind, progress } => {
                if !self.state.load_complete() && node_ind == PRIMARY_STAGE {
                    self.state.set_initial_load_progress(progress);
                }
                self.state.set_status(node_ind, NodeStatus::InProgress);
                self.state.set_progress(node_ind, progress);
            }
            ServerEvent::Completed { node_ind, results } => {
                if !self.state.load_complete() && node_ind == SECONDARY_STAGE {
                    self.state.set_initial_load_progress(1.0);
                    self.state.set_load_complete(true);
                    info!("session: initial load complete");
                }
                self.state.set_status(node_ind, NodeStatus::Completed);
                self.state.set_progress(node_ind, 1.0);
                self.state.set_node_output(results, node_ind);
            }
        }

        vec![]
    }

    fn seed_secondary_defaults(&mut self) {
        let mut params = Params::new();
        params.insert(PARAM_PARALLEL_TILT.to_owned(), 0.into());
        params.insert(PARAM_PARALLEL_TWIST.to_owned(), 0.into());
        self.state.set_node_input(params, SECONDARY_STAGE);
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
