//! Replays a recorded session against a fresh cell handler and prints the
//! resulting document.
//!
//! Usage: `cells_replay <session.jsonl> [--json]`
//!
//! Each non-empty line of the session file is one inbound message. Two
//! pseudo messages stand in for non-text socket events:
//! `{"$binary": "<payload>"}` delivers a binary packet and
//! `{"$close": <seconds or null>}` closes the connection.

use std::env;
use std::fs;
use std::rc::Rc;

use anyhow::{Context as _, Error, anyhow};
use bytes::Bytes;
use cells::{CellHandler, CellRegistry, CellSocket, CellsConfig, ChannelTransport, SocketEvent};
use log::info;
use serde_json::Value;
use tokio::runtime::Builder;
use tokio::sync::mpsc;

fn parse_event(line: &str) -> Result<SocketEvent, Error> {
    let value: Value = serde_json::from_str(line).with_context(|| format!("bad session line: {line}"))?;
    if let Some(payload) = value.get("$binary") {
        let payload = payload.as_str().ok_or_else(|| anyhow!("$binary expects a string"))?;
        return Ok(SocketEvent::Binary(Bytes::copy_from_slice(payload.as_bytes())));
    }
    if let Some(wait) = value.get("$close") {
        return Ok(SocketEvent::Closed {
            wait_seconds: wait.as_u64(),
        });
    }
    Ok(SocketEvent::Text(line.to_owned()))
}

fn replay(path: &str, as_json: bool) -> Result<(), Error> {
    let session = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let config = CellsConfig::from_env();

    let (transport, mut outbound) = ChannelTransport::channel();
    let mut handler = CellHandler::with_config(CellRegistry::with_builtin_cells(), config.clone())
        .with_transport(Rc::new(transport));
    handler.initial_render()?;

    let (events, receiver) = mpsc::unbounded_channel();
    events.send(SocketEvent::Opened)?;
    for line in session.lines().map(str::trim).filter(|line| !line.is_empty()) {
        events.send(parse_event(line)?)?;
    }
    drop(events);

    let runtime = Builder::new_current_thread().build()?;
    let mut socket = CellSocket::new(&config);
    runtime.block_on(socket.run(&mut handler, receiver))?;

    while let Ok(message) = outbound.try_recv() {
        info!("outbound: {message}");
    }
    info!("{} live cells after replay", handler.tree().len());

    if as_json {
        println!("{}", handler.dom().to_json_string());
    } else {
        println!("{:?}", handler.dom());
    }
    Ok(())
}

pub fn main() -> Result<(), Error> {
    env_logger::init();

    let mut path = None;
    let mut as_json = false;
    for arg in env::args().skip(1) {
        if arg == "--json" {
            as_json = true;
        } else {
            path = Some(arg);
        }
    }
    let path = path.ok_or_else(|| anyhow!("usage: cells_replay <session.jsonl> [--json]"))?;
    replay(&path, as_json)
}
