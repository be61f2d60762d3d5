//! Server-side protocol handling.
//!
//! Turns control frames from clients into registry updates plus the replies
//! and events the runtime should apply. Every action is addressed to the
//! endpoint it was produced for.

use std::{fmt, sync::Arc, time::Duration};

use ticklink_core::{time::Clock, Endpoint};
use ticklink_protocol::ControlFrame;
use tracing::{debug, info};

use crate::{
    event_types::{Action, DisconnectReason, Disconnection, SessionEvent},
    registry::PeerRegistry,
};

/// Actions produced by the server for one peer.
pub type ServerActions = Vec<Action<SessionEvent>>;

/// Protocol state shared by the server's receive and sweep loops.
pub struct ServerSession {
    peers: Arc<PeerRegistry>,
    clock: Arc<dyn Clock>,
    idle_timeout: Duration,
}

impl fmt::Debug for ServerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerSession")
            .field("peers", &self.peers.len())
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}

impl ServerSession {
    /// Creates a session with an empty registry.
    pub fn new(clock: Arc<dyn Clock>, idle_timeout: Duration) -> Self {
        Self { peers: Arc::new(PeerRegistry::new()), clock, idle_timeout }
    }

    /// The registry of connected peers.
    pub fn peers(&self) -> &Arc<PeerRegistry> {
        &self.peers
    }

    /// Applies a control frame received from `from`.
    pub fn process_control(&self, from: Endpoint, frame: ControlFrame) -> ServerActions {
        let now = self.clock.now();
        match frame {
            ControlFrame::ClientHandshake => {
                if self.peers.upsert(from, now) {
                    info!("Client connected: {}", from);
                } else {
                    debug!("Client {} handshook again", from);
                }
                // Every handshake is accepted and answered so a lost reply is recovered.
                vec![Action::Emit(SessionEvent::Connected(from)), Action::Send(ControlFrame::ServerHandshake)]
            }
            ControlFrame::Heartbeat => {
                if !self.peers.refresh(&from, now) {
                    debug!("Ignoring heartbeat from unknown peer {}", from);
                }
                Vec::new()
            }
            ControlFrame::ClientDrop => {
                let mut actions = Vec::with_capacity(2);
                if self.peers.remove(&from).is_some() {
                    info!("Client {} left", from);
                    actions.push(disconnected(DisconnectReason::ClientShutdown, from));
                }
                // Confirm even unknown peers so a retried drop still completes.
                actions.push(Action::Send(ControlFrame::ServerDropConfirm));
                actions
            }
            ControlFrame::ServerHandshake | ControlFrame::ServerDrop | ControlFrame::ServerDropConfirm => {
                debug!("Ignoring server-only frame {} from {}", frame.name(), from);
                Vec::new()
            }
        }
    }

    /// Evicts peers idle for longer than the timeout.
    pub fn sweep(&self) -> Vec<(Endpoint, ServerActions)> {
        self.peers
            .evict_idle(self.clock.now(), self.idle_timeout)
            .into_iter()
            .map(|endpoint| {
                info!("Client {} timed out", endpoint);
                (endpoint, vec![disconnected(DisconnectReason::Timeout, endpoint)])
            })
            .collect()
    }

    /// Drops one peer on the server's initiative.
    ///
    /// The peer does not have to be registered; the drop is sent and
    /// reported either way, without waiting for an acknowledgment.
    pub fn force_disconnect(&self, endpoint: Endpoint) -> ServerActions {
        if self.peers.remove(&endpoint).is_none() {
            debug!("Dropping unregistered endpoint {}", endpoint);
        }
        vec![Action::Send(ControlFrame::ServerDrop), disconnected(DisconnectReason::ServerForced, endpoint)]
    }

    /// Drops every peer because the server is going away.
    pub fn shutdown(&self) -> Vec<(Endpoint, ServerActions)> {
        self.peers
            .drain()
            .into_iter()
            .map(|endpoint| {
                (
                    endpoint,
                    vec![
                        Action::Send(ControlFrame::ServerDrop),
                        disconnected(DisconnectReason::ServerShutdown, endpoint),
                    ],
                )
            })
            .collect()
    }
}

fn disconnected(reason: DisconnectReason, endpoint: Endpoint) -> Action<SessionEvent> {
    Action::Emit(SessionEvent::Disconnected(Disconnection::new(reason, endpoint)))
}
