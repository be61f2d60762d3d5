//! Client connection state machine.
//!
//! The machine never touches a socket or a thread. Its runtime feeds it
//! control frames and timer outcomes and applies the actions it returns.

use std::io;

use ticklink_core::{
    error::{ErrorKind, Result},
    Endpoint,
};
use ticklink_protocol::ControlFrame;

use crate::event_types::{Action, DisconnectReason, Disconnection, SessionEvent};

/// Actions produced by a client session.
pub type ClientActions = Vec<Action<SessionEvent>>;

/// Lifecycle of an outbound session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No session; the initial and terminal state.
    #[default]
    Disconnected,
    /// Handshakes are being sent and no reply has arrived yet.
    Connecting,
    /// The server accepted the handshake.
    Connected,
    /// A drop was sent and its confirmation is pending.
    Disconnecting,
}

impl ConnectionState {
    /// Returns true while application frames may flow.
    pub fn is_live(self) -> bool {
        matches!(self, ConnectionState::Connected | ConnectionState::Disconnecting)
    }
}

/// Connection state of one client towards one server.
#[derive(Debug, Clone)]
pub struct ClientSession {
    remote: Endpoint,
    state: ConnectionState,
}

impl ClientSession {
    /// Creates a disconnected session towards `remote`.
    pub fn new(remote: Endpoint) -> Self {
        Self { remote, state: ConnectionState::Disconnected }
    }

    /// Server this session talks to.
    pub fn remote(&self) -> Endpoint {
        self.remote
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Enters `Connecting`. Any previous session state is discarded.
    pub fn begin_connect(&mut self) {
        self.state = ConnectionState::Connecting;
    }

    /// One handshake attempt. Nothing is sent once a reply has arrived.
    pub fn handshake_attempt(&self) -> ClientActions {
        match self.state {
            ConnectionState::Connecting => vec![Action::Send(ControlFrame::ClientHandshake)],
            _ => Vec::new(),
        }
    }

    /// Applies a control frame received from the server.
    pub fn process_control(&mut self, frame: ControlFrame) -> ClientActions {
        match (self.state, frame) {
            (ConnectionState::Connecting, ControlFrame::ServerHandshake) => {
                self.state = ConnectionState::Connected;
                vec![Action::Emit(SessionEvent::Connected(self.remote))]
            }
            (state, ControlFrame::ServerDrop) if state.is_live() => {
                self.finish(DisconnectReason::ServerShutdown)
            }
            (state, ControlFrame::ServerDropConfirm) if state.is_live() => {
                self.finish(DisconnectReason::ClientShutdown)
            }
            _ => Vec::new(),
        }
    }

    /// Starts a graceful disconnect by sending a drop request.
    ///
    /// The session ends when the server confirms. Repeating the call while
    /// a confirmation is pending sends the drop again.
    pub fn begin_disconnect(&mut self) -> Result<ClientActions> {
        if !self.state.is_live() {
            return Err(ErrorKind::NotConnected);
        }
        self.state = ConnectionState::Disconnecting;
        Ok(vec![Action::Send(ControlFrame::ClientDrop)])
    }

    /// Every handshake attempt went unanswered.
    ///
    /// A reply that raced the last attempt wins: a connected session is left alone.
    pub fn handshake_exhausted(&mut self) -> ClientActions {
        match self.state {
            ConnectionState::Connected | ConnectionState::Disconnecting => Vec::new(),
            ConnectionState::Connecting | ConnectionState::Disconnected => {
                self.state = ConnectionState::Disconnected;
                vec![Action::Stop]
            }
        }
    }

    /// The socket reported an error while receiving.
    ///
    /// Errors before the handshake completes are expected (the server may
    /// not be up yet) and are swallowed so the retries can continue.
    pub fn transport_failed(&mut self, kind: io::ErrorKind) -> ClientActions {
        if !self.state.is_live() {
            return Vec::new();
        }
        self.state = ConnectionState::Disconnected;
        vec![Action::Emit(SessionEvent::TransportClosed { endpoint: self.remote, kind }), Action::Stop]
    }

    /// Ends the session locally without waiting for the server.
    pub fn force_close(&mut self) -> ClientActions {
        match self.state {
            state if state.is_live() => self.finish(DisconnectReason::ClientForced),
            ConnectionState::Connecting => {
                self.state = ConnectionState::Disconnected;
                vec![Action::Stop]
            }
            _ => Vec::new(),
        }
    }

    fn finish(&mut self, reason: DisconnectReason) -> ClientActions {
        self.state = ConnectionState::Disconnected;
        vec![
            Action::Emit(SessionEvent::Disconnected(Disconnection::new(reason, self.remote))),
            Action::Stop,
        ]
    }
}
