//! Connection manager — owns the WebSocket and drives the session machine.
//!
//! DESIGN
//! ======
//! The stream handle lives here and nowhere else. The session machine never
//! touches I/O: `step` feeds it one typed event at a time and executes
//! whatever actions come back, so inbound frames are processed strictly in
//! arrival order. `connect` while connected and `disconnect` while
//! disconnected are deliberate no-ops.
//!
//! LIFECYCLE
//! =========
//! 1. `connect` → `Opened` event, phase reset
//! 2. `step` in a loop → handshake, then steady-state events
//! 3. `disconnect` requests closure; the state flips when `step` observes
//!    the close, not synchronously
//! 4. `step` returns `None` once the transport is gone

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info};

use crate::protocol::Command;
use crate::session::{Action, Session, SessionAlert, SocketEvent};
use crate::state::SessionState;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Errors surfaced by connection-manager operations. Each is fatal to the
/// user action that triggered it; none are retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("websocket connect failed: {0}")]
    Connect(Box<tungstenite::Error>),
    #[error("websocket send failed: {0}")]
    Send(Box<tungstenite::Error>),
    #[error("failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A live session with a remote DAG compute server.
#[derive(Debug, Default)]
pub struct Client {
    session: Session,
    stream: Option<WsStream>,
}

impl Client {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The session state written by this connection. Read-only for callers.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        self.session.state()
    }

    /// Open the connection. No-op if already connected.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connect`] when the socket cannot be
    /// established; session state is left untouched in that case.
    pub async fn connect(&mut self, url: &str) -> Result<(), ClientError> {
        if self.session.state().connected() {
            debug!("client: already connected, ignoring connect");
            return Ok(());
        }

        let (stream, _) = connect_async(url)
            .await
            .map_err(|error| ClientError::Connect(Box::new(error)))?;

        info!(%url, "client: connected");
        self.stream = Some(stream);
        let actions = self.session.handle(SocketEvent::Opened);
        self.execute(actions).await?;
        Ok(())
    }

    /// Request transport closure. No-op if not connected.
    ///
    /// State cleanup happens when [`Client::step`] observes the close frame,
    /// not here.
    pub async fn disconnect(&mut self) -> Result<(), ClientError> {
        if !self.session.state().connected() {
            return Ok(());
        }
        if let Some(stream) = self.stream.as_mut() {
            stream
                .close(None)
                .await
                .map_err(|error| ClientError::Send(Box::new(error)))?;
        }
        Ok(())
    }

    /// Receive and process the next inbound message.
    ///
    /// Returns the alerts to surface for that message, or `None` once the
    /// transport has closed.
    pub async fn step(&mut self) -> Result<Option<Vec<SessionAlert>>, ClientError> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };

        match stream.next().await {
            None | Some(Ok(Message::Close(_))) => {
                self.on_closed();
                Ok(None)
            }
            Some(Ok(Message::Text(text))) => {
                let actions = self.session.handle(SocketEvent::Frame(text.to_string()));
                let alerts = self.execute(actions).await?;
                Ok(Some(alerts))
            }
            // Binary, ping and pong are not part of the protocol.
            Some(Ok(_)) => Ok(Some(Vec::new())),
            Some(Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed)) => {
                self.on_closed();
                Ok(None)
            }
            Some(Err(error)) => {
                // Transport errors do not close the connection from our
                // side; closure arrives as its own event.
                let actions = self.session.handle(SocketEvent::Errored(error.to_string()));
                let alerts = self.execute(actions).await?;
                Ok(Some(alerts))
            }
        }
    }

    /// Send one parameter update. No-op while disconnected: nothing is sent
    /// and no state changes.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Send`] when the connected send fails.
    pub async fn update_param(
        &mut self,
        node_index: usize,
        key: &str,
        value: f64,
        as_percentage: bool,
    ) -> Result<(), ClientError> {
        let Some(command) = self
            .session
            .update_param(node_index, key, value, as_percentage)
        else {
            return Ok(());
        };
        self.send(&command).await
    }

    fn on_closed(&mut self) {
        self.stream = None;
        self.session.handle(SocketEvent::Closed);
    }

    async fn execute(&mut self, actions: Vec<Action>) -> Result<Vec<SessionAlert>, ClientError> {
        let mut alerts = Vec::new();
        for action in actions {
            match action {
                Action::Send(command) => self.send(&command).await?,
                Action::Alert(alert) => alerts.push(alert),
            }
        }
        Ok(alerts)
    }

    async fn send(&mut self, command: &Command) -> Result<(), ClientError> {
        // Guarded send: a command queued around a close must not leak frames
        // onto a dead transport.
        let Some(stream) = self.stream.as_mut() else {
            return Ok(());
        };
        let json = serde_json::to_string(command)?;
        debug!(%json, "client: send command");
        stream
            .send(Message::Text(json.into()))
            .await
            .map_err(|error| ClientError::Send(Box::new(error)))
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
