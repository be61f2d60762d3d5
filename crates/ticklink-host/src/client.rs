use std::{
    io, iter,
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{bounded, Receiver, Sender};
use ticklink_core::{
    config::ClientConfig,
    error::{ErrorKind, Result},
    transport::{is_poll_timeout, DatagramSocket},
    Endpoint,
};
use ticklink_protocol::{encode_frame, ControlFrame, Frame, NetworkWriter};
use tracing::{debug, error, info, trace, warn};

use crate::{
    client_session::{ClientActions, ClientSession, ConnectionState},
    event_types::{Action, Disconnection, Message, SessionEvent},
    events::{EventRegistry, Notifier},
    socket::UdpTransport,
    stop::StopToken,
};

#[derive(Debug, Default)]
struct ClientCallbacks {
    events: EventRegistry,
    connected: Notifier<Endpoint>,
    disconnected: Notifier<Disconnection>,
    closed: Notifier<io::ErrorKind>,
}

/// State shared between the caller and the session's worker threads.
struct ClientLink {
    socket: Arc<dyn DatagramSocket>,
    remote: Endpoint,
    session: Mutex<ClientSession>,
    stop: StopToken,
    handshake_done: (Sender<()>, Receiver<()>),
    callbacks: Arc<ClientCallbacks>,
    tick: Duration,
    buffer_size: usize,
}

impl ClientLink {
    fn session(&self) -> MutexGuard<'_, ClientSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> ConnectionState {
        self.session().state()
    }

    /// Applies actions once the session lock has been released.
    fn apply(&self, actions: ClientActions) {
        for action in actions {
            match action {
                Action::Send(frame) => self.send_control(frame),
                Action::Emit(event) => self.emit(event),
                Action::Stop => {
                    if self.stop.stop() {
                        debug!("Stopping session loops for {}", self.remote);
                    }
                }
            }
        }
    }

    fn send_control(&self, frame: ControlFrame) {
        if let Err(err) = self.socket.send_packet(&self.remote.socket_addr(), &frame.encode()) {
            warn!("Error sending {} to {}: {}", frame.name(), self.remote, err);
        }
    }

    fn emit(&self, event: SessionEvent) {
        match event {
            SessionEvent::Connected(endpoint) => {
                info!("Connected to {}", endpoint);
                let _ = self.handshake_done.0.try_send(());
                self.callbacks.connected.notify(&endpoint);
            }
            SessionEvent::Disconnected(disconnection) => {
                info!("Disconnected from {} ({:?})", disconnection.endpoint, disconnection.reason);
                self.callbacks.disconnected.notify(&disconnection);
            }
            SessionEvent::TransportClosed { endpoint, kind } => {
                error!("Connection to {} closed by transport error: {:?}", endpoint, kind);
                self.callbacks.closed.notify(&kind);
            }
        }
    }

    fn handle_datagram(&self, datagram: &[u8]) {
        let frame = match Frame::parse(datagram) {
            Ok(frame) => frame,
            Err(err) => {
                warn!("Dropping malformed datagram from {}: {}", self.remote, err);
                return;
            }
        };

        match ControlFrame::from_name(frame.name()) {
            Some(control) => {
                debug!("Received {} from {}", control.name(), self.remote);
                let actions = self.session().process_control(control);
                self.apply(actions);
            }
            None => {
                trace!("Dispatching {} from {}", frame.name(), self.remote);
                self.callbacks.events.dispatch(&Message::new(frame, self.remote));
            }
        }
    }
}

fn receive_loop(link: Arc<ClientLink>) {
    let mut buffer = vec![0u8; link.buffer_size];
    while !link.stop.is_stopped() {
        match link.socket.receive_packet(&mut buffer) {
            Ok((datagram, _)) => {
                if !datagram.is_empty() {
                    link.handle_datagram(datagram);
                }
            }
            Err(err) if is_poll_timeout(&err) => {}
            Err(err) => {
                let actions = link.session().transport_failed(err.kind());
                if actions.is_empty() {
                    debug!("Ignoring receive error from {}: {}", link.remote, err);
                    link.stop.wait(link.tick);
                } else {
                    link.apply(actions);
                }
            }
        }
    }
    trace!("Receive loop for {} exited", link.remote);
}

fn heartbeat_loop(link: Arc<ClientLink>, interval: Duration) {
    while !link.stop.wait(interval) {
        trace!("Heartbeat to {}", link.remote);
        link.send_control(ControlFrame::Heartbeat);
    }
}

fn spawn_worker<F>(name: &str, work: F) -> Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    Ok(thread::Builder::new().name(name.to_owned()).spawn(work)?)
}

/// Connection to one ticklink server.
///
/// `connect` blocks until the handshake resolves. Once connected, a
/// receive thread dispatches incoming events and a heartbeat thread keeps
/// the session alive on the server. Subscribers run on the receive thread.
pub struct Client {
    remote: Endpoint,
    config: ClientConfig,
    callbacks: Arc<ClientCallbacks>,
    link: Option<Arc<ClientLink>>,
    workers: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("remote", &self.remote)
            .field("state", &self.state())
            .field("config", &self.config)
            .field("events", &self.callbacks.events)
            .finish()
    }
}

impl Client {
    /// Creates a client for `remote` with default configuration.
    pub fn new(remote: Endpoint) -> Self {
        Self::with_config(remote, ClientConfig::default())
    }

    /// Creates a client for `remote` with custom configuration.
    pub fn with_config(remote: Endpoint, config: ClientConfig) -> Self {
        Self {
            remote,
            config,
            callbacks: Arc::new(ClientCallbacks::default()),
            link: None,
            workers: Vec::new(),
        }
    }

    /// Server this client connects to.
    pub fn remote(&self) -> Endpoint {
        self.remote
    }

    /// Current configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Mutable configuration; takes effect on the next `connect`.
    pub fn config_mut(&mut self) -> &mut ClientConfig {
        &mut self.config
    }

    /// The application event registry.
    pub fn events(&self) -> &EventRegistry {
        &self.callbacks.events
    }

    /// Subscribes to an application event.
    pub fn on<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.callbacks.events.subscribe(name, handler);
    }

    /// Called with the server endpoint when a handshake completes.
    pub fn on_connected<F>(&self, callback: F)
    where
        F: Fn(&Endpoint) + Send + Sync + 'static,
    {
        self.callbacks.connected.add(callback);
    }

    /// Called when the session ends through the protocol or `close`.
    pub fn on_disconnected<F>(&self, callback: F)
    where
        F: Fn(&Disconnection) + Send + Sync + 'static,
    {
        self.callbacks.disconnected.add(callback);
    }

    /// Called when a socket error ends a live session.
    pub fn on_connection_closed<F>(&self, callback: F)
    where
        F: Fn(&io::ErrorKind) + Send + Sync + 'static,
    {
        self.callbacks.closed.add(callback);
    }

    /// Connects with the configured handshake trials and interval.
    pub fn connect(&mut self) -> Result<ConnectionState> {
        self.connect_with_trials(self.config.handshake_trials, self.config.handshake_interval)
    }

    /// Binds a UDP socket connected to the server and runs the handshake.
    ///
    /// Sends up to `trials + 1` handshakes, the first after a short delay and
    /// the rest `interval` apart, returning as soon as the server replies.
    /// An unanswered handshake is not an error: the returned state is
    /// `Disconnected` and the loops are stopped.
    pub fn connect_with_trials(&mut self, trials: u32, interval: Duration) -> Result<ConnectionState> {
        self.config.validate()?;
        let transport =
            UdpTransport::connect(self.remote.socket_addr(), &self.config.socket, self.config.tick_interval())?;
        self.connect_over(Arc::new(transport), trials, interval)
    }

    /// Runs the handshake over an already bound socket.
    pub fn connect_over(
        &mut self,
        socket: Arc<dyn DatagramSocket>,
        trials: u32,
        interval: Duration,
    ) -> Result<ConnectionState> {
        if self.link.as_ref().is_some_and(|link| !link.stop.is_stopped()) {
            return Err(ErrorKind::AlreadyRunning);
        }
        self.config.validate()?;
        self.join_workers();

        let mut session = ClientSession::new(self.remote);
        session.begin_connect();
        let link = Arc::new(ClientLink {
            socket,
            remote: self.remote,
            session: Mutex::new(session),
            stop: StopToken::new(),
            handshake_done: bounded(1),
            callbacks: Arc::clone(&self.callbacks),
            tick: self.config.tick_interval(),
            buffer_size: self.config.receive_buffer_size,
        });
        self.link = Some(Arc::clone(&link));

        let receiver = Arc::clone(&link);
        match spawn_worker("ticklink-client-recv", move || receive_loop(receiver)) {
            Ok(handle) => self.workers.push(handle),
            Err(err) => {
                link.stop.stop();
                return Err(err);
            }
        }

        let waits = iter::once(self.config.first_handshake_delay)
            .chain(iter::repeat(interval))
            .take((trials as usize).saturating_add(1));
        for (attempt, wait) in waits.enumerate() {
            if link.state() != ConnectionState::Connecting || link.stop.is_stopped() {
                break;
            }
            debug!("Handshake attempt {} to {}", attempt + 1, self.remote);
            let actions = link.session().handshake_attempt();
            link.apply(actions);
            if link.handshake_done.1.recv_timeout(wait).is_ok() {
                break;
            }
        }

        let actions = link.session().handshake_exhausted();
        link.apply(actions);

        let state = link.state();
        if state == ConnectionState::Connected {
            if let Some(heartbeat) = self.config.heartbeat_interval {
                let beater = Arc::clone(&link);
                let worker = spawn_worker("ticklink-client-heartbeat", move || heartbeat_loop(beater, heartbeat));
                match worker {
                    Ok(handle) => self.workers.push(handle),
                    Err(err) => {
                        link.stop.stop();
                        self.join_workers();
                        return Err(err);
                    }
                }
            }
        } else {
            warn!("No handshake reply from {} after {} attempts", self.remote, trials.saturating_add(1));
            self.join_workers();
        }
        Ok(state)
    }

    /// Sends an application event to the server.
    pub fn send(&self, name: &str, payload: Option<&NetworkWriter>) -> Result<()> {
        if ControlFrame::is_reserved(name) {
            return Err(ErrorKind::ReservedEventName(name.to_owned()));
        }
        let link = self.live_link()?;
        link.socket.send_packet(&link.remote.socket_addr(), &encode_frame(name, payload))?;
        Ok(())
    }

    /// Asks the server to end the session.
    ///
    /// Returns once the drop is sent; `on_disconnected` fires with
    /// `ClientShutdown` when the server confirms.
    pub fn shutdown(&self) -> Result<()> {
        let link = self.live_link()?;
        let actions = link.session().begin_disconnect()?;
        link.apply(actions);
        Ok(())
    }

    /// Ends the session locally without waiting for the server.
    pub fn close(&mut self) {
        if let Some(link) = &self.link {
            let actions = link.session().force_close();
            link.apply(actions);
            link.stop.stop();
        }
        self.join_workers();
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.link.as_ref().map(|link| link.state()).unwrap_or_default()
    }

    /// Returns true while the handshake has completed and no drop was sent.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Local address of the session socket.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        let link = self.link.as_ref().ok_or(ErrorKind::NotConnected)?;
        Ok(link.socket.local_addr()?)
    }

    fn live_link(&self) -> Result<&Arc<ClientLink>> {
        match &self.link {
            Some(link) if link.state().is_live() => Ok(link),
            _ => Err(ErrorKind::NotConnected),
        }
    }

    fn join_workers(&mut self) {
        let current = thread::current().id();
        for worker in self.workers.drain(..) {
            if worker.thread().id() != current && worker.join().is_err() {
                warn!("Client worker thread panicked");
            }
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if let Some(link) = &self.link {
            link.stop.stop();
        }
        self.join_workers();
    }
}
