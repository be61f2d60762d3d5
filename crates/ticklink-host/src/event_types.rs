//! Event and action types for the session layer.
//!
//! - `Action`: instructions a session state machine hands to its runtime
//! - `SessionEvent`: lifecycle notifications surfaced to the user
//! - `Message`: an application frame routed to event subscribers

use std::io;

use ticklink_core::Endpoint;
use ticklink_protocol::{ControlFrame, Frame, NetworkReader};

/// Actions a session state machine requests from its runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action<E> {
    /// Send the control frame to the endpoint the action was produced for.
    Send(ControlFrame),
    /// Emit an event to the user.
    Emit(E),
    /// Stop the session's loops.
    Stop,
}

/// Why a session ended. Always set at the point of transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisconnectReason {
    /// The server heard nothing from the peer for longer than the idle timeout.
    Timeout,
    /// The server dropped the peer explicitly.
    ServerForced,
    /// The client closed its session locally without waiting for the server.
    ClientForced,
    /// The server shut down.
    ServerShutdown,
    /// The client asked to leave and the drop was confirmed.
    ClientShutdown,
}

/// A disconnect notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Disconnection {
    /// Cause of the disconnect.
    pub reason: DisconnectReason,
    /// The remote side of the session that ended.
    pub endpoint: Endpoint,
}

impl Disconnection {
    /// Creates a notification.
    pub fn new(reason: DisconnectReason, endpoint: Endpoint) -> Self {
        Self { reason, endpoint }
    }
}

/// Lifecycle events produced by client and server sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A handshake completed.
    Connected(Endpoint),
    /// A session ended.
    Disconnected(Disconnection),
    /// The socket failed while the session was live.
    TransportClosed {
        /// Remote side of the failed session.
        endpoint: Endpoint,
        /// Socket error reported by the operating system.
        kind: io::ErrorKind,
    },
}

/// An application frame delivered to event subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    frame: Frame,
    sender: Endpoint,
}

impl Message {
    /// Wraps a decoded frame received from `sender`.
    pub fn new(frame: Frame, sender: Endpoint) -> Self {
        Self { frame, sender }
    }

    /// Event name the frame was sent under.
    pub fn name(&self) -> &str {
        self.frame.name()
    }

    /// Where the frame came from.
    pub fn sender(&self) -> Endpoint {
        self.sender
    }

    /// Raw payload bytes following the event name.
    pub fn payload(&self) -> &[u8] {
        self.frame.payload()
    }

    /// A fresh reader positioned at the start of the payload.
    pub fn reader(&self) -> NetworkReader<'_> {
        self.frame.reader()
    }
}
