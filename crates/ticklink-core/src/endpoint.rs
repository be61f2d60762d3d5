use std::{
    fmt,
    io,
    net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs},
};

/// Immutable (ip, port) identity of a remote peer.
///
/// Equality and hashing follow the underlying socket address, so an
/// `Endpoint` can key the server's peer registry directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Endpoint(SocketAddr);

impl Endpoint {
    /// Builds an endpoint from an ip string and port.
    ///
    /// An empty or unparseable ip binds to the unspecified IPv4 address.
    pub fn new(ip: &str, port: u16) -> Self {
        let ip = ip.parse::<IpAddr>().unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        Self(SocketAddr::new(ip, port))
    }

    /// Resolves a hostname to the first matching endpoint using DNS.
    ///
    /// # Examples
    /// ```no_run
    /// use ticklink_core::Endpoint;
    ///
    /// let endpoint = Endpoint::resolve("localhost", 8080).unwrap();
    /// assert_eq!(endpoint.port(), 8080);
    /// ```
    pub fn resolve(host: &str, port: u16) -> io::Result<Self> {
        (host, port)
            .to_socket_addrs()?
            .next()
            .map(Self)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "could not resolve hostname"))
    }

    /// Returns the ip address.
    pub fn ip(&self) -> IpAddr {
        self.0.ip()
    }

    /// Returns the port.
    pub fn port(&self) -> u16 {
        self.0.port()
    }

    /// Returns the socket address.
    pub fn socket_addr(&self) -> SocketAddr {
        self.0
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self(addr)
    }
}

impl From<Endpoint> for SocketAddr {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ip = match self.0.ip() {
            IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(IpAddr::V6(v6)),
            v4 => v4,
        };
        write!(f, "{}:{}", ip, self.0.port())
    }
}
