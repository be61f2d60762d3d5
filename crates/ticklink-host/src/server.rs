use std::{
    net::SocketAddr,
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use ticklink_core::{
    config::ServerConfig,
    error::{ErrorKind, Result},
    time::{Clock, SystemClock},
    transport::{is_poll_timeout, DatagramSocket},
    Endpoint,
};
use ticklink_protocol::{encode_frame, ControlFrame, Frame, NetworkWriter};
use tracing::{debug, error, info, trace, warn};

use crate::{
    event_types::{Action, Disconnection, Message, SessionEvent},
    events::{EventRegistry, Notifier},
    server_session::{ServerActions, ServerSession},
    socket::UdpTransport,
    stop::StopToken,
};

#[derive(Debug)]
struct ServerShared {
    session: ServerSession,
    events: EventRegistry,
    connected: Notifier<Endpoint>,
    disconnected: Notifier<Disconnection>,
}

/// A running listener: the socket plus the stop token of its loops.
struct ServerLink {
    socket: Arc<dyn DatagramSocket>,
    stop: StopToken,
    shared: Arc<ServerShared>,
    tick: Duration,
    buffer_size: usize,
}

impl ServerLink {
    fn apply(&self, endpoint: Endpoint, actions: ServerActions) {
        for action in actions {
            match action {
                Action::Send(frame) => {
                    if let Err(err) = self.socket.send_packet(&endpoint.socket_addr(), &frame.encode()) {
                        error!("Error sending {} to {}: {}", frame.name(), endpoint, err);
                    }
                }
                Action::Emit(SessionEvent::Connected(peer)) => self.shared.connected.notify(&peer),
                Action::Emit(SessionEvent::Disconnected(disconnection)) => {
                    self.shared.disconnected.notify(&disconnection)
                }
                Action::Emit(SessionEvent::TransportClosed { endpoint, kind }) => {
                    debug!("Ignoring transport close for {}: {:?}", endpoint, kind)
                }
                Action::Stop => {
                    self.stop.stop();
                }
            }
        }
    }

    fn handle_datagram(&self, datagram: &[u8], from: Endpoint) {
        let frame = match Frame::parse(datagram) {
            Ok(frame) => frame,
            Err(err) => {
                warn!("Dropping malformed datagram from {}: {}", from, err);
                return;
            }
        };

        match ControlFrame::from_name(frame.name()) {
            Some(control) => {
                if control == ControlFrame::Heartbeat {
                    trace!("Heartbeat from {}", from);
                } else {
                    debug!("Received {} from {}", control.name(), from);
                }
                let actions = self.shared.session.process_control(from, control);
                self.apply(from, actions);
            }
            None => {
                trace!("Dispatching {} from {}", frame.name(), from);
                self.shared.events.dispatch(&Message::new(frame, from));
            }
        }
    }
}

fn receive_loop(link: Arc<ServerLink>) {
    let mut buffer = vec![0u8; link.buffer_size];
    while !link.stop.is_stopped() {
        match link.socket.receive_packet(&mut buffer) {
            Ok((datagram, from)) => {
                if !datagram.is_empty() {
                    link.handle_datagram(datagram, Endpoint::from(from));
                }
            }
            Err(err) if is_poll_timeout(&err) => {}
            Err(err) => {
                // Resets caused by one peer must not take the listener down.
                warn!("Encountered an error receiving data: {}", err);
                link.stop.wait(link.tick);
            }
        }
    }
    trace!("Server receive loop exited");
}

fn sweep_loop(link: Arc<ServerLink>, interval: Duration) {
    while !link.stop.wait(interval) {
        for (endpoint, actions) in link.shared.session.sweep() {
            link.apply(endpoint, actions);
        }
    }
}

fn spawn_worker<F>(name: &str, work: F) -> Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    Ok(thread::Builder::new().name(name.to_owned()).spawn(work)?)
}

/// Listener accepting ticklink sessions from any number of clients.
///
/// `start` spawns a receive thread, which answers control frames and
/// dispatches application events, and a sweep thread, which evicts
/// clients that stopped sending heartbeats.
pub struct Server {
    config: ServerConfig,
    shared: Arc<ServerShared>,
    link: Option<Arc<ServerLink>>,
    workers: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .field("shared", &self.shared)
            .finish()
    }
}

impl Server {
    /// Creates a stopped server.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a stopped server that reads time from `clock`.
    pub fn with_clock(config: ServerConfig, clock: Arc<dyn Clock>) -> Self {
        let session = ServerSession::new(clock, config.idle_connection_timeout);
        Self {
            config,
            shared: Arc::new(ServerShared {
                session,
                events: EventRegistry::new(),
                connected: Notifier::default(),
                disconnected: Notifier::default(),
            }),
            link: None,
            workers: Vec::new(),
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The application event registry.
    pub fn events(&self) -> &EventRegistry {
        &self.shared.events
    }

    /// Subscribes to an application event.
    pub fn on<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.shared.events.subscribe(name, handler);
    }

    /// Called with the client endpoint when a new client completes its handshake.
    pub fn on_client_connected<F>(&self, callback: F)
    where
        F: Fn(&Endpoint) + Send + Sync + 'static,
    {
        self.shared.connected.add(callback);
    }

    /// Called for every client that leaves, times out or is dropped.
    pub fn on_client_disconnected<F>(&self, callback: F)
    where
        F: Fn(&Disconnection) + Send + Sync + 'static,
    {
        self.shared.disconnected.add(callback);
    }

    /// Binds the configured address and starts the loops.
    pub fn start(&mut self) -> Result<SocketAddr> {
        if self.is_running() {
            return Err(ErrorKind::AlreadyRunning);
        }
        self.config.validate()?;
        let transport =
            UdpTransport::bind(self.config.bind_address, &self.config.socket, self.config.tick_interval())?;
        self.start_over(Arc::new(transport))
    }

    /// Starts the loops over an already bound socket.
    pub fn start_over(&mut self, socket: Arc<dyn DatagramSocket>) -> Result<SocketAddr> {
        if self.is_running() {
            return Err(ErrorKind::AlreadyRunning);
        }
        self.config.validate()?;
        self.join_workers();

        let local = socket.local_addr()?;
        let link = Arc::new(ServerLink {
            socket,
            stop: StopToken::new(),
            shared: Arc::clone(&self.shared),
            tick: self.config.tick_interval(),
            buffer_size: self.config.receive_buffer_size,
        });
        self.link = Some(Arc::clone(&link));

        if let Err(err) = self.spawn_loops(&link) {
            link.stop.stop();
            self.join_workers();
            self.link = None;
            return Err(err);
        }

        info!("Server listening on {}", local);
        Ok(local)
    }

    /// Sends an application event to `to`, registered or not.
    pub fn send(&self, name: &str, to: Endpoint, payload: Option<&NetworkWriter>) -> Result<()> {
        if ControlFrame::is_reserved(name) {
            return Err(ErrorKind::ReservedEventName(name.to_owned()));
        }
        let link = self.running_link()?;
        link.socket.send_packet(&to.socket_addr(), &encode_frame(name, payload))?;
        Ok(())
    }

    /// Drops one client with `ServerForced`, without waiting for an acknowledgment.
    pub fn disconnect_client(&self, to: Endpoint) -> Result<()> {
        let link = self.running_link()?;
        info!("Disconnecting client {}", to);
        let actions = self.shared.session.force_disconnect(to);
        link.apply(to, actions);
        Ok(())
    }

    /// Stops the loops, then drops every client with `ServerShutdown`.
    ///
    /// The loops are joined before the registry is drained, so a handshake
    /// arriving during shutdown is never registered. Does nothing if the
    /// server is not running.
    pub fn shutdown(&mut self) {
        if let Some(link) = self.link.take() {
            if link.stop.stop() {
                self.join_workers();
                for (endpoint, actions) in self.shared.session.shutdown() {
                    link.apply(endpoint, actions);
                }
                info!("Server shut down");
            }
        }
        self.join_workers();
    }

    /// Returns true between `start` and `shutdown`.
    pub fn is_running(&self) -> bool {
        self.link.as_ref().is_some_and(|link| !link.stop.is_stopped())
    }

    /// Address the listening socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.running_link()?.socket.local_addr()?)
    }

    /// Endpoints of the currently connected clients.
    pub fn peers(&self) -> Vec<Endpoint> {
        self.shared.session.peers().endpoints()
    }

    /// Number of currently connected clients.
    pub fn peer_count(&self) -> usize {
        self.shared.session.peers().len()
    }

    /// Returns true if `endpoint` is a connected client.
    pub fn is_connected(&self, endpoint: &Endpoint) -> bool {
        self.shared.session.peers().contains(endpoint)
    }

    /// When `endpoint` last completed a handshake or sent a heartbeat.
    pub fn last_seen(&self, endpoint: &Endpoint) -> Option<Instant> {
        self.shared.session.peers().last_seen(endpoint)
    }

    fn spawn_loops(&mut self, link: &Arc<ServerLink>) -> Result<()> {
        let receiver = Arc::clone(link);
        self.workers.push(spawn_worker("ticklink-server-recv", move || receive_loop(receiver))?);

        let sweeper = Arc::clone(link);
        let interval = self.config.sweep_interval;
        self.workers.push(spawn_worker("ticklink-server-sweep", move || sweep_loop(sweeper, interval))?);
        Ok(())
    }

    fn running_link(&self) -> Result<&Arc<ServerLink>> {
        match &self.link {
            Some(link) if !link.stop.is_stopped() => Ok(link),
            _ => Err(ErrorKind::NotRunning),
        }
    }

    fn join_workers(&mut self) {
        let current = thread::current().id();
        for worker in self.workers.drain(..) {
            if worker.thread().id() != current && worker.join().is_err() {
                warn!("Server worker thread panicked");
            }
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if let Some(link) = &self.link {
            link.stop.stop();
        }
        self.join_workers();
    }
}
