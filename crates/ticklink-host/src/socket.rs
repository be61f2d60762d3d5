use std::{
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket},
    time::Duration,
};

use socket2::SockRef;
use ticklink_core::{config::SocketOptions, error::Result, transport::DatagramSocket};

/// Applies socket options from configuration to a UdpSocket.
fn apply_socket_options(socket: &UdpSocket, options: &SocketOptions) -> io::Result<()> {
    let sock = SockRef::from(socket);

    if let Some(size) = options.recv_buffer_size {
        sock.set_recv_buffer_size(size)?;
    }
    if let Some(size) = options.send_buffer_size {
        sock.set_send_buffer_size(size)?;
    }
    if let Some(ttl) = options.ttl {
        socket.set_ttl(ttl)?;
    }
    if options.broadcast {
        socket.set_broadcast(true)?;
    }
    Ok(())
}

/// UDP socket whose receives are bounded by the session tick interval.
///
/// A server socket is bound and talks to anyone; a client socket is
/// connected to its server so the OS reports resets and unreachable ports
/// back to the receive loop.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    peer: Option<SocketAddr>,
}

impl UdpTransport {
    /// Binds a listening socket.
    pub fn bind(address: SocketAddr, options: &SocketOptions, poll_timeout: Duration) -> Result<Self> {
        let socket = UdpSocket::bind(address)?;
        Self::configure(&socket, options, poll_timeout)?;
        Ok(Self { socket, peer: None })
    }

    /// Binds an ephemeral local port and connects it to `remote`.
    pub fn connect(remote: SocketAddr, options: &SocketOptions, poll_timeout: Duration) -> Result<Self> {
        let local = match remote {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        };
        let socket = UdpSocket::bind(local)?;
        socket.connect(remote)?;
        Self::configure(&socket, options, poll_timeout)?;
        Ok(Self { socket, peer: Some(remote) })
    }

    fn configure(socket: &UdpSocket, options: &SocketOptions, poll_timeout: Duration) -> io::Result<()> {
        apply_socket_options(socket, options)?;
        socket.set_read_timeout(Some(poll_timeout))
    }
}

impl DatagramSocket for UdpTransport {
    fn send_packet(&self, addr: &SocketAddr, payload: &[u8]) -> io::Result<usize> {
        match self.peer {
            Some(_) => self.socket.send(payload),
            None => self.socket.send_to(payload, addr),
        }
    }

    fn receive_packet<'a>(&self, buffer: &'a mut [u8]) -> io::Result<(&'a [u8], SocketAddr)> {
        match self.peer {
            Some(peer) => {
                let len = self.socket.recv(buffer)?;
                Ok((&buffer[..len], peer))
            }
            None => {
                let (len, from) = self.socket.recv_from(buffer)?;
                Ok((&buffer[..len], from))
            }
        }
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}
