//! Chat client using Ticklink.
//!
//! Reads lines from stdin and sends each one as a `chat` event; prints
//! the server's numbered echoes. An empty line leaves gracefully.
//!
//! Run (after starting the server example):
//! - cargo run -p ticklink --example client
//! - cargo run -p ticklink --example client -- 127.0.0.1 7777

use std::{env, io::BufRead, time::Duration};

use ticklink::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn parse_target() -> Endpoint {
    let mut args = env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "127.0.0.1".to_owned());
    let port = args.next().and_then(|s| s.parse().ok()).unwrap_or(7777);
    Endpoint::resolve(&host, port).unwrap_or_else(|_| Endpoint::new(&host, port))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let target = parse_target();
    let mut client = Client::new(target);
    client.on("chat", |msg: &Message| {
        let mut reader = msg.reader();
        match (reader.read_u32(), reader.read_string()) {
            (Ok(seq), Ok(text)) => println!("[echo #{}] {}", seq, text),
            _ => warn!("unreadable echo from {}", msg.sender()),
        }
    });
    client.on_disconnected(|d: &Disconnection| info!("[disconnect] {} ({:?})", d.endpoint, d.reason));
    client.on_connection_closed(|kind| warn!("[closed] {:?}", kind));

    if client.connect()? != ConnectionState::Connected {
        eprintln!("no answer from {}", target);
        return Ok(());
    }
    println!("Connected to {} from {}. Type a line to chat, empty line to quit.", target, client.local_addr()?);

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        if line.is_empty() {
            break;
        }
        let mut payload = NetworkWriter::new();
        payload.write_string(&line);
        client.send("chat", Some(&payload))?;
    }

    if client.is_connected() {
        client.shutdown()?;
        std::thread::sleep(Duration::from_millis(500));
    }
    client.close();
    Ok(())
}
