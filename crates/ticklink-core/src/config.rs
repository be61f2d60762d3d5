use std::{
    default::Default,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    time::Duration,
};

use crate::{
    constants::{
        DEFAULT_HANDSHAKE_INTERVAL, DEFAULT_HANDSHAKE_TRIALS, DEFAULT_HEARTBEAT_INTERVAL,
        DEFAULT_IDLE_TIMEOUT, DEFAULT_TICK_RATE, FIRST_HANDSHAKE_DELAY, MAX_DATAGRAM_SIZE,
    },
    error::{ErrorKind, Result},
};

/// Operating system level socket options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SocketOptions {
    /// Socket receive buffer size in bytes (None = use system default).
    /// Corresponds to SO_RCVBUF socket option.
    pub recv_buffer_size: Option<usize>,
    /// Socket send buffer size in bytes (None = use system default).
    /// Corresponds to SO_SNDBUF socket option.
    pub send_buffer_size: Option<usize>,
    /// Time-to-live for outgoing packets (None = use system default).
    pub ttl: Option<u32>,
    /// Enable SO_BROADCAST (default: false).
    pub broadcast: bool,
}

/// Configuration of an outbound client session.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Receive polls per second; the receive timeout is `1s / tick_rate`.
    pub tick_rate: u32,
    /// Interval between heartbeats once connected. None disables heartbeats.
    pub heartbeat_interval: Option<Duration>,
    /// Handshake retries after the first attempt.
    pub handshake_trials: u32,
    /// Wait between handshake retries.
    pub handshake_interval: Duration,
    /// Wait after the first handshake attempt.
    pub first_handshake_delay: Duration,
    /// Size of the buffer datagrams are received into.
    pub receive_buffer_size: usize,
    /// Socket options applied when the client binds its socket.
    pub socket: SocketOptions,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            heartbeat_interval: Some(DEFAULT_HEARTBEAT_INTERVAL),
            handshake_trials: DEFAULT_HANDSHAKE_TRIALS,
            handshake_interval: DEFAULT_HANDSHAKE_INTERVAL,
            first_handshake_delay: FIRST_HANDSHAKE_DELAY,
            receive_buffer_size: MAX_DATAGRAM_SIZE,
            socket: SocketOptions::default(),
        }
    }
}

impl ClientConfig {
    /// Receive poll timeout derived from the tick rate.
    pub fn tick_interval(&self) -> Duration {
        tick_interval(self.tick_rate)
    }

    /// Rejects values the session loops cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.tick_rate == 0 {
            return Err(ErrorKind::InvalidConfig("tick_rate must be greater than zero"));
        }
        if self.heartbeat_interval == Some(Duration::ZERO) {
            return Err(ErrorKind::InvalidConfig("heartbeat_interval must be non-zero"));
        }
        if self.receive_buffer_size == 0 {
            return Err(ErrorKind::InvalidConfig("receive_buffer_size must be greater than zero"));
        }
        Ok(())
    }
}

/// Configuration of a listening server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Address the listening socket binds to.
    pub bind_address: SocketAddr,
    /// Receive polls per second; the receive timeout is `1s / tick_rate`.
    pub tick_rate: u32,
    /// Max silence before a peer is evicted with a timeout notification.
    pub idle_connection_timeout: Duration,
    /// Interval between timeout sweeps.
    pub sweep_interval: Duration,
    /// Size of the buffer datagrams are received into.
    pub receive_buffer_size: usize,
    /// Socket options applied to the listening socket.
    pub socket: SocketOptions,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)),
            tick_rate: DEFAULT_TICK_RATE,
            idle_connection_timeout: DEFAULT_IDLE_TIMEOUT,
            sweep_interval: DEFAULT_HEARTBEAT_INTERVAL,
            receive_buffer_size: MAX_DATAGRAM_SIZE,
            socket: SocketOptions::default(),
        }
    }
}

impl ServerConfig {
    /// Default configuration listening on `port` on every IPv4 interface.
    pub fn on_port(port: u16) -> Self {
        Self {
            bind_address: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port)),
            ..Self::default()
        }
    }

    /// Receive poll timeout derived from the tick rate.
    pub fn tick_interval(&self) -> Duration {
        tick_interval(self.tick_rate)
    }

    /// Rejects values the session loops cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.tick_rate == 0 {
            return Err(ErrorKind::InvalidConfig("tick_rate must be greater than zero"));
        }
        if self.sweep_interval.is_zero() {
            return Err(ErrorKind::InvalidConfig("sweep_interval must be non-zero"));
        }
        if self.receive_buffer_size == 0 {
            return Err(ErrorKind::InvalidConfig("receive_buffer_size must be greater than zero"));
        }
        Ok(())
    }
}

// A zero read timeout means "block forever" for std sockets, so clamp to 1ms.
fn tick_interval(tick_rate: u32) -> Duration {
    let millis = 1000 / u64::from(tick_rate.max(1));
    Duration::from_millis(millis.max(1))
}
