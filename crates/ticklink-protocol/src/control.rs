use crate::frame::encode_frame;

/// Reserved event names handled by the protocol itself.
///
/// Application code may never send these; any other name is routed to
/// application subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlFrame {
    /// Client asks to open a session.
    ClientHandshake,
    /// Server accepts a session.
    ServerHandshake,
    /// Client liveness signal.
    Heartbeat,
    /// Client asks to close its session.
    ClientDrop,
    /// Server closes the session (forced or shutdown).
    ServerDrop,
    /// Server acknowledges a client drop.
    ServerDropConfirm,
}

impl ControlFrame {
    /// Every reserved frame.
    pub const ALL: [ControlFrame; 6] = [
        ControlFrame::ClientHandshake,
        ControlFrame::ServerHandshake,
        ControlFrame::Heartbeat,
        ControlFrame::ClientDrop,
        ControlFrame::ServerDrop,
        ControlFrame::ServerDropConfirm,
    ];

    /// Wire name of the frame.
    pub const fn name(self) -> &'static str {
        match self {
            ControlFrame::ClientHandshake => "clt_handshake",
            ControlFrame::ServerHandshake => "srv_handshake",
            ControlFrame::Heartbeat => "heartbeat",
            ControlFrame::ClientDrop => "clt_drop",
            ControlFrame::ServerDrop => "srv_drop",
            ControlFrame::ServerDropConfirm => "srv_drop_confirm",
        }
    }

    /// Looks up a reserved name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|frame| frame.name() == name)
    }

    /// Returns true if `name` is reserved for the protocol.
    pub fn is_reserved(name: &str) -> bool {
        Self::from_name(name).is_some()
    }

    /// Encodes the frame; control frames carry no payload.
    pub fn encode(self) -> Vec<u8> {
        encode_frame(self.name(), None)
    }
}
