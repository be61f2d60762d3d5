#![warn(missing_docs)]

//! ticklink-core: foundational types shared by every layer.
//!
//! - Configuration types for clients and servers
//! - Error handling
//! - Protocol constants
//! - Endpoint identity, clock and datagram transport abstractions

/// Protocol constants shared across layers.
pub mod constants {
    use std::time::Duration;

    /// Default number of receive polls per second.
    pub const DEFAULT_TICK_RATE: u32 = 60;
    /// Largest UDP payload that fits in a single IPv4 datagram.
    pub const MAX_DATAGRAM_SIZE: usize = 65_507;
    /// Seconds of silence after which the server evicts a peer.
    pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(10);
    /// Interval between client heartbeats and between server timeout sweeps.
    pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);
    /// Number of handshake retries after the first attempt.
    pub const DEFAULT_HANDSHAKE_TRIALS: u32 = 3;
    /// Delay between handshake retries.
    pub const DEFAULT_HANDSHAKE_INTERVAL: Duration = Duration::from_secs(1);
    /// Shorter wait applied after the very first handshake attempt.
    pub const FIRST_HANDSHAKE_DELAY: Duration = Duration::from_millis(100);
    /// Maximum number of bytes in a 7-bit encoded string length prefix.
    pub const MAX_LENGTH_PREFIX_BYTES: usize = 5;
}

/// Client and server configuration.
pub mod config;
/// Endpoint identity used to key connected peers.
pub mod endpoint;
/// Error types and results.
pub mod error;
/// Time source abstraction.
pub mod time;
/// Datagram transport abstraction for pluggable I/O.
pub mod transport;

pub use endpoint::Endpoint;
