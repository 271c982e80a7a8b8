//! Client session for a remote DAG compute server.
//!
//! The server executes a directed acyclic graph of processing nodes and
//! streams per-node progress over a persistent WebSocket. This crate owns
//! the connection lifecycle, the two-phase inbound protocol (DAG handshake,
//! then steady-state events), outbound parameter updates, and the
//! single-writer session state that renderers consume read-only.

pub mod client;
pub mod protocol;
pub mod session;
pub mod state;

pub use client::{Client, ClientError};
pub use protocol::Command;
pub use session::{Action, Session, SessionAlert, SocketEvent};
pub use state::{DagNode, NodeStatus, SessionState};
