//! Chat relay server using Ticklink.
//!
//! Every `chat` event is echoed back to its sender with a sequence number.
//!
//! Run:
//! - cargo run -p ticklink --example server
//! - RUST_LOG=debug cargo run -p ticklink --example server -- 7777

use std::{
    env,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use crossbeam_channel::unbounded;
use ticklink::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn parse_port() -> u16 {
    env::args().nth(1).and_then(|s| s.parse().ok()).unwrap_or(7777)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut server = Server::new(ServerConfig::on_port(parse_port()));
    // Subscribers run on the receive thread; replies are sent from here.
    let (replies, pending) = unbounded();

    let counter = Arc::new(AtomicU32::new(0));
    server.on("chat", move |msg: &Message| {
        let text = msg.reader().read_string().unwrap_or_default();
        let seq = counter.fetch_add(1, Ordering::Relaxed);
        info!("[chat] #{} from {}: {}", seq, msg.sender(), text);
        let _ = replies.send((msg.sender(), seq, text));
    });
    server.on_client_connected(|endpoint| info!("[connect] {}", endpoint));
    server.on_client_disconnected(|d: &Disconnection| info!("[disconnect] {} ({:?})", d.endpoint, d.reason));

    let local = server.start()?;
    println!("Ticklink chat server listening on {}", local);

    loop {
        let Ok((to, seq, text)) = pending.recv_timeout(Duration::from_secs(5)) else {
            info!("{} client(s) connected", server.peer_count());
            continue;
        };
        let mut payload = NetworkWriter::new();
        payload.write_u32(seq).write_string(&text);
        if let Err(e) = server.send("chat", to, Some(&payload)) {
            eprintln!("failed to echo to {}: {}", to, e);
        }
    }
}
