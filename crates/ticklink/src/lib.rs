#![warn(missing_docs)]

//! Ticklink: a small public API facade for the workspace.
//!
//! This crate re-exports what an application needs to open logical
//! connections over UDP and exchange named events:
//!
//! - Sessions (`Client`, `Server`) and their notifications
//! - Payload codec (`NetworkWriter`, `NetworkReader`)
//! - Configuration (`ClientConfig`, `ServerConfig`)
//!
//! Example
//! ```no_run
//! use ticklink::prelude::*;
//!
//! let mut server = Server::new(ServerConfig::on_port(7777));
//! server.on("chat", |msg: &Message| {
//!     let text = msg.reader().read_string().unwrap_or_default();
//!     println!("{} says {}", msg.sender(), text);
//! });
//! server.start().unwrap();
//!
//! let mut client = Client::new(Endpoint::new("127.0.0.1", 7777));
//! if client.connect().unwrap() == ConnectionState::Connected {
//!     let mut payload = NetworkWriter::new();
//!     payload.write_string("hello");
//!     client.send("chat", Some(&payload)).unwrap();
//! }
//! ```

// Core configuration, errors and identity
pub use ticklink_core::{
    config::{ClientConfig, ServerConfig, SocketOptions},
    error::{DecodingErrorKind, ErrorKind, Result},
    Endpoint,
};
// Sessions and their events
pub use ticklink_host::{
    Client, ConnectionState, DisconnectReason, Disconnection, EventRegistry, Message, Server,
};
// Wire codec
pub use ticklink_protocol::{ControlFrame, NetworkReader, NetworkWriter};

/// Convenience prelude with the most commonly used items.
pub mod prelude {
    pub use crate::{
        Client, ClientConfig, ConnectionState, DisconnectReason, Disconnection, Endpoint, ErrorKind,
        Message, NetworkReader, NetworkWriter, Server, ServerConfig,
    };
}
