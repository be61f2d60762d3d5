#![warn(missing_docs)]

//! ticklink-host: client and server session runtimes over UDP.

/// Threaded client runtime.
pub mod client;
/// Client connection state machine.
pub mod client_session;
/// Event and action types (Action, SessionEvent, Message).
pub mod event_types;
/// Named-event dispatch bridge.
pub mod events;
/// Server-side table of connected peers.
pub mod registry;
/// Threaded server runtime.
pub mod server;
/// Server-side protocol handling.
pub mod server_session;
/// UDP transport with socket options and bounded receives.
pub mod socket;
/// Cooperative loop cancellation.
pub mod stop;

pub use client::Client;
pub use client_session::{ClientSession, ConnectionState};
pub use event_types::{Action, DisconnectReason, Disconnection, Message, SessionEvent};
pub use events::{EventHandler, EventRegistry, Notifier};
pub use registry::PeerRegistry;
pub use server::Server;
pub use server_session::ServerSession;
pub use socket::UdpTransport;
pub use stop::StopToken;
