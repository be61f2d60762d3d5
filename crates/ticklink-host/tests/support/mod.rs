#![allow(dead_code)]

use std::{
    io,
    net::SocketAddr,
    sync::Mutex,
    time::{Duration, Instant},
};

use crossbeam_channel::{unbounded, Receiver, Sender};
use ticklink_core::{config::ClientConfig, time::Clock, transport::DatagramSocket};
use ticklink_protocol::{decode_frame, ControlFrame};

/// Fake socket fed from the test thread; records everything sent through it.
pub struct ScriptedSocket {
    local: SocketAddr,
    peer: SocketAddr,
    poll: Duration,
    sent: Mutex<Vec<(SocketAddr, Vec<u8>)>>,
    inbox_tx: Sender<io::Result<(Vec<u8>, SocketAddr)>>,
    inbox: Receiver<io::Result<(Vec<u8>, SocketAddr)>>,
}

impl ScriptedSocket {
    pub fn new(local: &str, peer: &str) -> Self {
        let (inbox_tx, inbox) = unbounded();
        Self {
            local: local.parse().unwrap(),
            peer: peer.parse().unwrap(),
            poll: Duration::from_millis(5),
            sent: Mutex::new(Vec::new()),
            inbox_tx,
            inbox,
        }
    }

    /// Queues a datagram from the default peer.
    pub fn push(&self, bytes: Vec<u8>) {
        self.push_from(bytes, self.peer);
    }

    pub fn push_from(&self, bytes: Vec<u8>, from: SocketAddr) {
        self.inbox_tx.send(Ok((bytes, from))).unwrap();
    }

    pub fn push_control(&self, frame: ControlFrame) {
        self.push(frame.encode());
    }

    /// Makes the next receive fail with `kind`.
    pub fn fail(&self, kind: io::ErrorKind) {
        self.inbox_tx.send(Err(io::Error::from(kind))).unwrap();
    }

    /// Event names of every datagram sent so far, in order.
    pub fn sent_names(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, bytes)| decode_frame(bytes).unwrap().0)
            .collect()
    }

    pub fn sent_to(&self) -> Vec<(SocketAddr, String)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(to, bytes)| (*to, decode_frame(bytes).unwrap().0))
            .collect()
    }

    pub fn count_sent(&self, frame: ControlFrame) -> usize {
        self.sent_names().iter().filter(|name| *name == frame.name()).count()
    }
}

impl DatagramSocket for ScriptedSocket {
    fn send_packet(&self, addr: &SocketAddr, payload: &[u8]) -> io::Result<usize> {
        self.sent.lock().unwrap().push((*addr, payload.to_vec()));
        Ok(payload.len())
    }

    fn receive_packet<'a>(&self, buffer: &'a mut [u8]) -> io::Result<(&'a [u8], SocketAddr)> {
        match self.inbox.recv_timeout(self.poll) {
            Ok(Ok((bytes, from))) => {
                let len = bytes.len().min(buffer.len());
                buffer[..len].copy_from_slice(&bytes[..len]);
                Ok((&buffer[..len], from))
            }
            Ok(Err(err)) => Err(err),
            Err(_) => Err(io::ErrorKind::WouldBlock.into()),
        }
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        Ok(self.local)
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock(Mutex<Instant>);

impl ManualClock {
    pub fn new() -> Self {
        Self(Mutex::new(Instant::now()))
    }

    pub fn advance(&self, by: Duration) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.0.lock().unwrap()
    }
}

/// Client settings that keep loopback tests quick.
pub fn fast_client_config() -> ClientConfig {
    ClientConfig {
        handshake_trials: 10,
        handshake_interval: Duration::from_millis(100),
        first_handshake_delay: Duration::from_millis(50),
        ..ClientConfig::default()
    }
}

/// Polls `condition` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

pub const WAIT: Duration = Duration::from_secs(5);
pub const QUIET: Duration = Duration::from_millis(300);
