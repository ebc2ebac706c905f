//! Session bookkeeping, outbound helpers and the page-level placeholders
//! shown while no cell tree is installed.

use anyhow::Result;
use bytes::Bytes;
use dom::Content;
use serde_json::{Value, json};

use super::CellHandler;
use crate::identity::{CellId, MAIN_CELLS_HANDLER, MAIN_CELLS_SESSION};
use crate::packets::PacketCallback;

impl CellHandler {
    pub fn handle_session_id(&mut self, session_id: String) {
        log::info!(target: "cells", "Received session id {session_id}");
        self.session_id = Some(session_id);
    }

    /// Announce ourselves on a fresh connection: resume the stored session
    /// or ask the server for one.
    ///
    /// # Errors
    /// Propagates transport failures.
    pub fn after_connected(&mut self) -> Result<()> {
        match &self.session_id {
            Some(session_id) => self.send_message_to_cell_session(json!({
                "event": "setSessionId",
                "sessionId": session_id,
            })),
            None => self.send_message_to_cell_session(json!({ "event": "requestSessionId" })),
        }
    }

    /// # Errors
    /// Fails when `message` is not an object or the transport refuses it.
    pub fn send_message_for(&self, message: Value, cell: &CellId) -> Result<()> {
        self.tree.send(message, cell.as_str())
    }

    /// # Errors
    /// Fails when `message` is not an object or the transport refuses it.
    pub fn send_message_to_cells(&self, message: Value) -> Result<()> {
        self.tree.send(message, MAIN_CELLS_HANDLER)
    }

    /// # Errors
    /// Fails when `message` is not an object or the transport refuses it.
    pub fn send_message_to_cell_session(&self, message: Value) -> Result<()> {
        self.tree.send(message, MAIN_CELLS_SESSION)
    }

    /// # Errors
    /// Propagates transport failures.
    pub fn cell_received_focus(&mut self, cell: &CellId) -> Result<()> {
        self.tree.cell_received_focus(cell)
    }

    pub fn on_packet(&mut self, packet_id: u64, packet: Bytes) {
        self.tree.on_packet(packet_id, packet);
    }

    pub fn request_packet(&mut self, packet_id: u64, callback: PacketCallback) {
        self.tree.request_packet(packet_id, callback);
    }

    /// Tell every live cell it is about to unload, e.g. before the page goes
    /// away.
    ///
    /// # Errors
    /// Propagates the first hook failure.
    pub fn tear_down_all_live_cells(&mut self) -> Result<()> {
        let identities: Vec<CellId> = self.tree.identities().into_iter().cloned().collect();
        for identity in &identities {
            self.tree.cell_will_unload(identity)?;
        }
        Ok(())
    }

    // -----------------------
    // Placeholders
    // -----------------------

    /// # Errors
    /// Propagates DOM errors.
    pub fn initial_render(&mut self) -> Result<()> {
        let dom = self.tree.dom_mut();
        let body = dom.make_element("div", &[("class", "card-body")], [Some(Content::from("Loading..."))])?;
        let card = dom.make_element("div", &[("class", "card alert-margin")], [Some(Content::from(body))])?;
        let page = dom.make_element("div", &[("class", "container-fluid")], [Some(Content::from(card))])?;
        self.tree.render_main(page)
    }

    /// # Errors
    /// Propagates DOM errors.
    pub fn render_error_message(&mut self, message: &str) -> Result<()> {
        self.render_alert(&format!("Failed to connect: {message}"))
    }

    /// # Errors
    /// Propagates DOM errors.
    pub fn show_connection_closed(&mut self, wait_seconds: u64) -> Result<()> {
        self.render_alert(&format!("Reconnecting in {wait_seconds} seconds"))
    }

    fn render_alert(&mut self, text: &str) -> Result<()> {
        let dom = self.tree.dom_mut();
        let alert = dom.make_element(
            "div",
            &[("class", "alert alert-primary center-block alert-margin")],
            [Some(Content::from(text))],
        )?;
        let main = dom.make_element(
            "main",
            &[("role", "main"), ("class", "container")],
            [Some(Content::from(alert))],
        )?;
        self.tree.render_main(main)
    }
}
