//! Out-of-band binary packets, matched to the cells that asked for them.

use core::fmt;
use std::collections::HashMap;

use anyhow::Result;
use bytes::Bytes;

/// Invoked once with the packet id and its payload.
pub type PacketCallback = Box<dyn FnOnce(u64, Bytes) -> Result<()>>;

/// Packets that arrived before anyone asked, and requests that arrived
/// before their packet. Whichever side shows up second completes the match.
#[derive(Default)]
pub struct PacketStore {
    packets: HashMap<u64, Bytes>,
    waiting: HashMap<u64, PacketCallback>,
}

impl PacketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_packet(&mut self, packet_id: u64, packet: Bytes) {
        if let Some(callback) = self.waiting.remove(&packet_id) {
            deliver(packet_id, packet, callback);
        } else {
            self.packets.insert(packet_id, packet);
        }
    }

    pub fn request_packet(&mut self, packet_id: u64, callback: PacketCallback) {
        if let Some(packet) = self.packets.remove(&packet_id) {
            deliver(packet_id, packet, callback);
        } else {
            self.waiting.insert(packet_id, callback);
        }
    }

    pub fn pending_packets(&self) -> usize {
        self.packets.len()
    }

    pub fn waiting_requests(&self) -> usize {
        self.waiting.len()
    }
}

fn deliver(packet_id: u64, packet: Bytes, callback: PacketCallback) {
    if let Err(err) = callback(packet_id, packet) {
        log::error!(target: "cells", "Packet handler failed for packet {packet_id}: {err:#}");
    }
}

impl fmt::Debug for PacketStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PacketStore")
            .field("packets", &self.packets.len())
            .field("waiting", &self.waiting.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(log: &Rc<RefCell<Vec<(u64, Bytes)>>>) -> PacketCallback {
        let log = Rc::clone(log);
        Box::new(move |id, bytes| {
            log.borrow_mut().push((id, bytes));
            Ok(())
        })
    }

    #[test]
    fn packet_before_request_is_stored() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut store = PacketStore::new();
        store.on_packet(3, Bytes::from_static(b"abc"));
        assert_eq!(store.pending_packets(), 1);

        store.request_packet(3, recorder(&log));
        assert_eq!(store.pending_packets(), 0);
        assert_eq!(log.borrow().as_slice(), &[(3, Bytes::from_static(b"abc"))]);
    }

    #[test]
    fn request_before_packet_waits_and_fires_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut store = PacketStore::new();
        store.request_packet(1, recorder(&log));
        assert_eq!(store.waiting_requests(), 1);

        store.on_packet(1, Bytes::from_static(b"x"));
        store.on_packet(1, Bytes::from_static(b"y"));
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(store.pending_packets(), 1);
    }

    #[test]
    fn failing_callbacks_are_consumed() {
        let mut store = PacketStore::new();
        store.request_packet(9, Box::new(|_, _| Err(anyhow::anyhow!("boom"))));
        store.on_packet(9, Bytes::new());
        assert_eq!(store.waiting_requests(), 0);
        assert_eq!(store.pending_packets(), 0);
    }
}
