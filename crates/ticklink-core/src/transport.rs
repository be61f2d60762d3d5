//! Transport abstraction for pluggable I/O.

use std::{io::Result, net::SocketAddr};

/// Low-level datagram socket abstraction.
///
/// Sessions share one socket between their receive and heartbeat threads,
/// so every method takes `&self`. Implementations must bound `receive_packet`
/// with a timeout so loops can observe cancellation; a timed out receive
/// returns `WouldBlock` or `TimedOut`.
pub trait DatagramSocket: Send + Sync {
    /// Sends a single datagram. Connected sockets ignore `addr` and reach their peer.
    fn send_packet(&self, addr: &SocketAddr, payload: &[u8]) -> Result<usize>;

    /// Receives a single datagram.
    fn receive_packet<'a>(&self, buffer: &'a mut [u8]) -> Result<(&'a [u8], SocketAddr)>;

    /// Returns the local address the socket is bound to.
    fn local_addr(&self) -> Result<SocketAddr>;
}

/// Returns true for the error kinds a timeout-bounded receive reports when no datagram arrived.
pub fn is_poll_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut)
}
