//! Deterministic session scenarios over a scripted socket.

mod support;

use std::{io, net::SocketAddr, sync::Arc, time::Duration};

use crossbeam_channel::unbounded;
use support::{wait_until, ManualClock, ScriptedSocket, QUIET, WAIT};
use ticklink_core::{
    config::{ClientConfig, ServerConfig},
    error::ErrorKind,
    Endpoint,
};
use ticklink_host::{Client, ConnectionState, DisconnectReason, Disconnection, Server};
use ticklink_protocol::{encode_frame, ControlFrame, NetworkWriter};

const SERVER: &str = "10.0.0.1:7777";
const CLIENT: &str = "10.0.0.2:50000";

fn quiet_client() -> Client {
    let config = ClientConfig {
        heartbeat_interval: None,
        first_handshake_delay: Duration::from_millis(5),
        ..ClientConfig::default()
    };
    Client::with_config(server_endpoint(), config)
}

fn server_endpoint() -> Endpoint {
    Endpoint::from(SERVER.parse::<SocketAddr>().unwrap())
}

#[test]
fn test_unanswered_handshake_sends_trials_plus_one() {
    let socket = Arc::new(ScriptedSocket::new(CLIENT, SERVER));
    let mut client = quiet_client();

    let state = client.connect_over(socket.clone(), 2, Duration::from_millis(20)).unwrap();

    assert_eq!(state, ConnectionState::Disconnected);
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert_eq!(socket.count_sent(ControlFrame::ClientHandshake), 3);
    assert_eq!(socket.sent_names().len(), 3);
}

#[test]
fn test_zero_trials_still_sends_one_handshake() {
    let socket = Arc::new(ScriptedSocket::new(CLIENT, SERVER));
    let mut client = quiet_client();

    let state = client.connect_over(socket.clone(), 0, Duration::from_millis(20)).unwrap();
    assert_eq!(state, ConnectionState::Disconnected);
    assert_eq!(socket.count_sent(ControlFrame::ClientHandshake), 1);
}

#[test]
fn test_errors_while_connecting_are_retried() {
    let socket = Arc::new(ScriptedSocket::new(CLIENT, SERVER));
    socket.fail(io::ErrorKind::ConnectionRefused);
    socket.fail(io::ErrorKind::ConnectionReset);
    socket.push_control(ControlFrame::ServerHandshake);

    let mut client = quiet_client();
    let (tx, rx) = unbounded();
    client.on_connection_closed(move |kind| {
        let _ = tx.send(*kind);
    });

    let state = client.connect_over(socket.clone(), 5, Duration::from_millis(50)).unwrap();
    assert_eq!(state, ConnectionState::Connected);
    assert!(rx.recv_timeout(QUIET).is_err());
}

#[test]
fn test_malformed_datagrams_are_skipped() {
    let socket = Arc::new(ScriptedSocket::new(CLIENT, SERVER));
    socket.push(vec![0xFF]);
    socket.push(Vec::new());
    socket.push(vec![0x05, b'a']);
    socket.push_control(ControlFrame::ServerHandshake);

    let mut client = quiet_client();
    let state = client.connect_over(socket.clone(), 5, Duration::from_millis(50)).unwrap();
    assert_eq!(state, ConnectionState::Connected);
}

#[test]
fn test_transport_error_after_connect_closes_session() {
    let socket = Arc::new(ScriptedSocket::new(CLIENT, SERVER));
    socket.push_control(ControlFrame::ServerHandshake);

    let mut client = quiet_client();
    let (tx, rx) = unbounded();
    client.on_connection_closed(move |kind| {
        let _ = tx.send(*kind);
    });
    let state = client.connect_over(socket.clone(), 3, Duration::from_millis(50)).unwrap();
    assert_eq!(state, ConnectionState::Connected);

    socket.fail(io::ErrorKind::ConnectionReset);
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), io::ErrorKind::ConnectionReset);
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert!(matches!(client.send("chat", None), Err(ErrorKind::NotConnected)));
}

#[test]
fn test_heartbeats_follow_the_handshake() {
    let socket = Arc::new(ScriptedSocket::new(CLIENT, SERVER));
    socket.push_control(ControlFrame::ServerHandshake);

    let config = ClientConfig {
        heartbeat_interval: Some(Duration::from_millis(10)),
        first_handshake_delay: Duration::from_millis(5),
        ..ClientConfig::default()
    };
    let mut client = Client::with_config(server_endpoint(), config);
    client.connect_over(socket.clone(), 3, Duration::from_millis(50)).unwrap();

    assert!(wait_until(WAIT, || socket.count_sent(ControlFrame::Heartbeat) >= 3));
    let names = socket.sent_names();
    let first_heartbeat = names.iter().position(|n| n == "heartbeat").unwrap();
    assert!(names[..first_heartbeat].iter().all(|n| n == "clt_handshake"));

    client.close();
    let sent = socket.sent_names().len();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(socket.sent_names().len(), sent, "no heartbeats after close");
}

#[test]
fn test_drop_request_can_be_forced_closed() {
    let socket = Arc::new(ScriptedSocket::new(CLIENT, SERVER));
    socket.push_control(ControlFrame::ServerHandshake);

    let mut client = quiet_client();
    let (tx, rx) = unbounded();
    client.on_disconnected(move |d: &Disconnection| {
        let _ = tx.send(d.reason);
    });
    client.connect_over(socket.clone(), 3, Duration::from_millis(50)).unwrap();

    client.shutdown().unwrap();
    assert_eq!(client.state(), ConnectionState::Disconnecting);
    assert_eq!(socket.count_sent(ControlFrame::ClientDrop), 1);
    assert!(rx.recv_timeout(QUIET).is_err());

    client.close();
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), DisconnectReason::ClientForced);
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[test]
fn test_events_are_dispatched_with_payload() {
    let socket = Arc::new(ScriptedSocket::new(CLIENT, SERVER));
    socket.push_control(ControlFrame::ServerHandshake);

    let client = {
        let mut client = quiet_client();
        client.connect_over(socket.clone(), 3, Duration::from_millis(50)).unwrap();
        client
    };
    let (tx, rx) = unbounded();
    client.on("score", move |msg| {
        let _ = tx.send(msg.reader().read_i32().unwrap());
    });

    let mut payload = NetworkWriter::new();
    payload.write_i32(-42);
    socket.push(encode_frame("score", Some(&payload)));
    socket.push(encode_frame("unheard", None));
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), -42);
}

fn scripted_server(clock: Arc<ManualClock>) -> (Server, Arc<ScriptedSocket>) {
    let config = ServerConfig {
        idle_connection_timeout: Duration::from_secs(2),
        sweep_interval: Duration::from_millis(10),
        ..ServerConfig::default()
    };
    let socket = Arc::new(ScriptedSocket::new(SERVER, CLIENT));
    let mut server = Server::with_clock(config, clock);
    server.start_over(socket.clone()).unwrap();
    (server, socket)
}

#[test]
fn test_silent_peer_times_out_once() {
    let clock = Arc::new(ManualClock::new());
    let (server, socket) = scripted_server(clock.clone());
    let (tx, rx) = unbounded();
    server.on_client_disconnected(move |d: &Disconnection| {
        let _ = tx.send(*d);
    });

    let client = Endpoint::from(CLIENT.parse::<SocketAddr>().unwrap());
    socket.push_control(ControlFrame::ClientHandshake);
    assert!(wait_until(WAIT, || socket.sent_to().len() == 1));
    assert!(server.is_connected(&client));
    assert_eq!(socket.sent_to(), vec![(client.socket_addr(), "srv_handshake".to_owned())]);

    clock.advance(Duration::from_secs(1));
    assert!(rx.recv_timeout(QUIET).is_err());

    clock.advance(Duration::from_secs(2));
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), Disconnection::new(DisconnectReason::Timeout, client));
    assert!(!server.is_connected(&client));
    assert!(rx.recv_timeout(QUIET).is_err());
}

#[test]
fn test_heartbeat_from_unknown_peer_is_ignored() {
    let clock = Arc::new(ManualClock::new());
    let (server, socket) = scripted_server(clock);

    socket.push_control(ControlFrame::Heartbeat);
    socket.push(encode_frame("probe", None));
    let (tx, rx) = unbounded();
    server.on("probe", move |_| {
        let _ = tx.send(());
    });
    socket.push(encode_frame("probe", None));

    rx.recv_timeout(WAIT).unwrap();
    assert_eq!(server.peer_count(), 0);
    assert!(socket.sent_names().is_empty());
}

#[test]
fn test_drop_from_unknown_peer_is_still_confirmed() {
    let clock = Arc::new(ManualClock::new());
    let (server, socket) = scripted_server(clock);
    let (tx, rx) = unbounded();
    server.on_client_disconnected(move |d: &Disconnection| {
        let _ = tx.send(*d);
    });

    socket.push_control(ControlFrame::ClientDrop);
    assert!(wait_until(WAIT, || socket.count_sent(ControlFrame::ServerDropConfirm) == 1));
    assert!(rx.recv_timeout(QUIET).is_err());
}

#[test]
fn test_repeated_handshake_notifies_each_time() {
    let clock = Arc::new(ManualClock::new());
    let (server, socket) = scripted_server(clock);
    let (tx, rx) = unbounded();
    server.on_client_connected(move |endpoint| {
        let _ = tx.send(*endpoint);
    });

    for _ in 0..3 {
        socket.push_control(ControlFrame::ClientHandshake);
    }
    assert!(wait_until(WAIT, || socket.count_sent(ControlFrame::ServerHandshake) == 3));

    let client = Endpoint::from(CLIENT.parse::<SocketAddr>().unwrap());
    for _ in 0..3 {
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), client);
    }
    assert!(rx.recv_timeout(QUIET).is_err());
    assert_eq!(server.peer_count(), 1);
}

#[test]
fn test_handshake_during_shutdown_is_not_registered() {
    let clock = Arc::new(ManualClock::new());
    let (mut server, socket) = scripted_server(clock);
    let client = Endpoint::from(CLIENT.parse::<SocketAddr>().unwrap());
    let latecomer: SocketAddr = "10.0.0.3:50001".parse().unwrap();

    socket.push_control(ControlFrame::ClientHandshake);
    assert!(wait_until(WAIT, || server.is_connected(&client)));

    let (tx, rx) = unbounded();
    let inbox = Arc::clone(&socket);
    server.on_client_disconnected(move |d: &Disconnection| {
        inbox.push_from(ControlFrame::ClientHandshake.encode(), latecomer);
        let _ = tx.send(*d);
    });

    server.shutdown();
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), Disconnection::new(DisconnectReason::ServerShutdown, client));

    std::thread::sleep(QUIET);
    assert!(!server.is_running());
    assert_eq!(server.peer_count(), 0);
    assert!(server.peers().is_empty());
    assert!(!socket.sent_to().iter().any(|(to, _)| *to == latecomer));
    assert!(socket.sent_to().contains(&(client.socket_addr(), "srv_drop".to_owned())));
}
