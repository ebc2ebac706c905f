//! The connection between the handler and the server.
//!
//! Outbound traffic goes through a [`Transport`]; inbound traffic arrives as
//! [`SocketEvent`]s on a tokio channel and is dispatched strictly in order,
//! one event at a time.

use core::ops::ControlFlow;

use anyhow::{Result, anyhow};
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::config::CellsConfig;
use crate::handler::CellHandler;

/// Sink for serialized outbound messages.
pub trait Transport {
    /// # Errors
    /// Fails when the connection can no longer accept messages.
    fn send_string(&self, message: String) -> Result<()>;
}

/// A [`Transport`] feeding an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    sender: mpsc::UnboundedSender<String>,
}

impl ChannelTransport {
    pub fn new(sender: mpsc::UnboundedSender<String>) -> Self {
        Self { sender }
    }

    /// A transport plus the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl Transport for ChannelTransport {
    fn send_string(&self, message: String) -> Result<()> {
        self.sender
            .send(message)
            .map_err(|_| anyhow!("outbound channel is closed"))
    }
}

/// What the connection reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Opened,
    /// One text frame: a JSON message.
    Text(String),
    /// One binary frame: an out-of-band packet.
    Binary(Bytes),
    /// The connection went away; the server may suggest a reconnect delay.
    Closed { wait_seconds: Option<u64> },
    Error(String),
}

/// Pumps socket events into a [`CellHandler`].
#[derive(Debug)]
pub struct CellSocket {
    next_packet_id: u64,
    reconnect_seconds: u64,
}

impl CellSocket {
    pub fn new(config: &CellsConfig) -> Self {
        Self {
            next_packet_id: 1,
            reconnect_seconds: config.reconnect_seconds,
        }
    }

    /// Id the next binary frame will be stored under.
    pub fn next_packet_id(&self) -> u64 {
        self.next_packet_id
    }

    /// Dispatch events until the connection closes or the sender goes away.
    ///
    /// # Errors
    /// Propagates the failures [`CellSocket::dispatch`] cannot recover from.
    pub async fn run(&mut self, handler: &mut CellHandler, mut events: mpsc::UnboundedReceiver<SocketEvent>) -> Result<()> {
        while let Some(event) = events.recv().await {
            if self.dispatch(handler, event)?.is_break() {
                break;
            }
        }
        Ok(())
    }

    /// Handle one event. A frame that fails to apply is logged and replaces
    /// the page with an error message; the loop keeps going.
    ///
    /// # Errors
    /// Transport failures while announcing the session, and DOM failures
    /// while rendering placeholders.
    pub fn dispatch(&mut self, handler: &mut CellHandler, event: SocketEvent) -> Result<ControlFlow<()>> {
        match event {
            SocketEvent::Opened => {
                log::info!(target: "cells", "Connection opened");
                handler.after_connected()?;
            }
            SocketEvent::Text(text) => {
                if let Err(err) = handler.receive_text(&text) {
                    log::error!(target: "cells", "Failed to handle message: {err:#}");
                    handler.render_error_message(&err.to_string())?;
                }
            }
            SocketEvent::Binary(packet) => {
                let packet_id = self.next_packet_id;
                self.next_packet_id += 1;
                handler.on_packet(packet_id, packet);
            }
            SocketEvent::Closed { wait_seconds } => {
                let wait = wait_seconds.unwrap_or(self.reconnect_seconds);
                log::info!(target: "cells", "Connection closed; reconnecting in {wait} seconds");
                handler.show_connection_closed(wait)?;
                return Ok(ControlFlow::Break(()));
            }
            SocketEvent::Error(err) => {
                log::error!(target: "cells", "Socket error: {err}");
            }
        }
        Ok(ControlFlow::Continue(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CellRegistry;
    use std::rc::Rc;

    #[test]
    fn binary_frames_are_numbered_from_one() {
        let mut handler = CellHandler::new(CellRegistry::new());
        let mut socket = CellSocket::new(&CellsConfig::default());
        for payload in [&b"a"[..], &b"b"[..]] {
            let flow = socket
                .dispatch(&mut handler, SocketEvent::Binary(Bytes::copy_from_slice(payload)))
                .unwrap();
            assert!(flow.is_continue());
        }
        assert_eq!(socket.next_packet_id(), 3);
        assert_eq!(handler.tree().packets().pending_packets(), 2);
    }

    #[test]
    fn opening_requests_a_session() {
        let (transport, mut outbound) = ChannelTransport::channel();
        let mut handler = CellHandler::new(CellRegistry::new()).with_transport(Rc::new(transport));
        let mut socket = CellSocket::new(&CellsConfig::default());
        socket.dispatch(&mut handler, SocketEvent::Opened).unwrap();
        let sent: serde_json::Value = serde_json::from_str(&outbound.try_recv().unwrap()).unwrap();
        assert_eq!(sent["event"], "requestSessionId");
        assert_eq!(sent["target_cell"], "main_cells_session");
    }

    #[test]
    fn closing_stops_the_loop() {
        let mut handler = CellHandler::new(CellRegistry::new());
        let mut socket = CellSocket::new(&CellsConfig::new(10, false, 7));
        let flow = socket
            .dispatch(&mut handler, SocketEvent::Closed { wait_seconds: None })
            .unwrap();
        assert!(flow.is_break());
        let text = handler.dom().text_content(handler.dom().body());
        assert!(text.contains("Reconnecting in 7 seconds"), "{text}");
    }
}
