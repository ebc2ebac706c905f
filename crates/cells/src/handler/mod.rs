//! The frame dispatcher.
//!
//! [`CellHandler::handle_frame`] first checks a frame against the live tree
//! without touching it, so structural violations fail before any cell is
//! notified or any DOM node moves. It then applies the frame in a fixed
//! order: type definitions, discard notifications, parentage index, root
//! creation, updates (creating new cells on demand, children before their
//! parents), the leftover check, discard removal, parent wiring, rebuilds,
//! first-install notifications and message delivery. Changes cells deferred
//! from their hooks run next, and focus is re-asserted last.

mod preflight;
mod session;

use std::collections::HashSet;
use std::rc::Rc;
use std::time::Instant;

use anyhow::Result;
use dom::Dom;
use indexmap::IndexMap;
use serde_json::Value;

use crate::children::all_identities;
use crate::config::CellsConfig;
use crate::error::FrameError;
use crate::frame::{CreatedCell, Frame, InboundMessage, TypeDefinition};
use crate::identity::{CellId, ROOT_CELL_ID};
use crate::registry::{CellInit, CellRegistry, PluginTable};
use crate::socket::Transport;
use crate::telemetry::{FrameStats, frame_stats_json, maybe_emit};
use crate::tree::{CellNode, CellTree};

use preflight::Preflight;

type PendingCells = IndexMap<CellId, CreatedCell>;

/// Owns the cell tree and applies inbound messages to it, one at a time.
#[derive(Debug)]
pub struct CellHandler {
    tree: CellTree,
    registry: CellRegistry,
    plugins: PluginTable,
    config: CellsConfig,
    session_id: Option<String>,
    last_stats: FrameStats,
}

impl CellHandler {
    pub fn new(registry: CellRegistry) -> Self {
        Self::with_config(registry, CellsConfig::default())
    }

    pub fn with_config(registry: CellRegistry, config: CellsConfig) -> Self {
        Self {
            tree: CellTree::new(),
            registry,
            plugins: PluginTable::new(),
            config,
            session_id: None,
            last_stats: FrameStats::default(),
        }
    }

    #[must_use]
    pub fn with_plugins(mut self, plugins: PluginTable) -> Self {
        self.plugins = plugins;
        self
    }

    #[must_use]
    pub fn with_transport(mut self, transport: Rc<dyn Transport>) -> Self {
        self.tree.set_transport(transport);
        self
    }

    pub fn attach_transport(&mut self, transport: Rc<dyn Transport>) {
        self.tree.set_transport(transport);
    }

    pub fn tree(&self) -> &CellTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut CellTree {
        &mut self.tree
    }

    pub fn dom(&self) -> &Dom {
        self.tree.dom()
    }

    pub fn cell(&self, id: &str) -> Option<&CellNode> {
        self.tree.cell(id)
    }

    pub fn registry(&self) -> &CellRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CellRegistry {
        &mut self.registry
    }

    pub fn plugins_mut(&mut self) -> &mut PluginTable {
        &mut self.plugins
    }

    pub fn config(&self) -> &CellsConfig {
        &self.config
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Counters of the most recently applied frame.
    pub fn last_frame_stats(&self) -> FrameStats {
        self.last_stats
    }

    // -----------------------
    // Inbound routing
    // -----------------------

    /// Route one decoded message on its type.
    ///
    /// # Errors
    /// Fatal frame errors; see [`CellHandler::handle_frame`].
    pub fn receive(&mut self, message: InboundMessage) -> Result<()> {
        match message {
            InboundMessage::Frame(frame) => self.handle_frame(*frame),
            InboundMessage::SessionId(session_id) => {
                self.handle_session_id(session_id);
                Ok(())
            }
            InboundMessage::Unknown(message) => {
                does_not_understand(&message);
                Ok(())
            }
        }
    }

    /// # Errors
    /// Malformed known messages and fatal frame errors.
    pub fn receive_value(&mut self, message: Value) -> Result<()> {
        self.receive(InboundMessage::from_value(message)?)
    }

    /// # Errors
    /// Text that is not JSON, malformed known messages and fatal frame errors.
    pub fn receive_text(&mut self, text: &str) -> Result<()> {
        self.receive(InboundMessage::from_text(text)?)
    }

    // -----------------------
    // Frames
    // -----------------------

    /// Apply one frame.
    ///
    /// # Errors
    /// A [`FrameError`] for structural violations (root recreated, a cell
    /// moved between parents, unknown types or plugins, missing or unused
    /// creations); these are detected before the tree is touched. Failures
    /// raised by cell hooks or DOM surgery later in the frame propagate as
    /// they happen.
    pub fn handle_frame(&mut self, frame: Frame) -> Result<()> {
        let started = Instant::now();
        let update_count = frame.update_count();
        let mut stats = FrameStats {
            created: frame.nodes_created.len(),
            updated: frame.nodes_updated.len(),
            discarded: frame.nodes_to_discard.len(),
            messages: frame.messages.values().map(Vec::len).sum(),
            elapsed_ms: 0,
        };

        self.tree.focus.begin_frame();
        let result = self.apply_frame(frame);
        self.tree.focus.end_frame();

        let elapsed = started.elapsed();
        stats.elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        if elapsed > self.config.slow_frame() {
            log::info!(
                target: "cells",
                "Spent {} ms handling a message with {update_count} nodes created/updated.",
                stats.elapsed_ms
            );
        }
        self.last_stats = stats;
        maybe_emit(self.config.telemetry_enabled, &frame_stats_json(&stats));
        result
    }

    fn apply_frame(&mut self, frame: Frame) -> Result<()> {
        self.install_type_definitions(&frame.dynamic_cell_type_definitions)?;
        Preflight::check(&self.tree, &self.registry, &frame)?;

        let Frame {
            nodes_to_discard,
            nodes_created,
            nodes_updated,
            messages,
            focused_cell_id,
            focused_cell_event_id,
            ..
        } = frame;

        if !nodes_updated.is_empty() {
            log::debug!(
                target: "cells",
                "Updating {} nodes and creating {} nodes",
                nodes_updated.len(),
                nodes_created.len()
            );
        }

        // Discarded cells hear about it first but stay addressable until
        // every update has been resolved.
        let mut discarded = HashSet::new();
        for id in &nodes_to_discard {
            if !self.tree.contains(id.as_str()) {
                log::error!(target: "cells", "Node {id} can't be discarded because it doesn't exist.");
                continue;
            }
            self.tree.cell_will_unload(id)?;
            self.tree.set_parent(id, None)?;
            discarded.insert(id.clone());
        }

        let declared_parents: Vec<(CellId, CellId)> = nodes_created
            .iter()
            .filter_map(|(id, created)| created.parent.clone().map(|parent| (id.clone(), parent)))
            .collect();

        let mut pending = nodes_created;
        let mut creation_order = Vec::new();

        let root = CellId::root();
        let rebuild_root = pending.contains_key(ROOT_CELL_ID);
        if rebuild_root {
            if self.tree.contains(ROOT_CELL_ID) {
                return Err(FrameError::RootAlreadyExists { root }.into());
            }
            self.create_cell(&root, &mut pending, &mut creation_order)?;
            self.tree.adopt_mount_point(&root)?;
        }

        let mut updated = Vec::with_capacity(nodes_updated.len());
        for (id, update) in nodes_updated {
            if !self.tree.contains(id.as_str()) {
                log::error!(target: "cells", "Cell {id} can't be updated because it doesn't exist.");
                continue;
            }
            if discarded.contains(&id) {
                log::warn!(target: "cells", "Cell {id} is discarded by the same frame; ignoring its update.");
                continue;
            }
            for child in all_identities(&update.children) {
                self.resolve_child(&id, child, &mut pending, &mut creation_order)?;
            }
            self.tree.update_self(&id, update.children, update.extra_data)?;
            updated.push(id);
        }

        if !pending.is_empty() {
            return Err(FrameError::UnusedCells {
                cells: pending.into_keys().collect(),
            }
            .into());
        }

        let mut released = Vec::new();
        for id in &nodes_to_discard {
            if let Some(element) = self.tree.remove(id).as_ref().and_then(CellNode::dom_element) {
                released.push(element);
            }
        }

        for (child, parent) in &declared_parents {
            if !self.tree.contains(child.as_str()) {
                continue;
            }
            if !self.tree.contains(parent.as_str()) {
                log::error!(target: "cells", "Cell {child} names parent {parent}, which doesn't exist.");
                continue;
            }
            self.tree.set_parent(child, Some(parent.clone()))?;
        }

        for id in &updated {
            if self.tree.contains(id.as_str()) {
                self.tree.rebuild_dom_element(id)?;
            }
        }
        if rebuild_root {
            self.tree.rebuild_dom_element(&root)?;
        }

        for id in &creation_order {
            if self.tree.contains(id.as_str()) {
                self.tree.on_first_installed(id)?;
            }
        }

        for (id, payloads) in &messages {
            if !self.tree.contains(id.as_str()) {
                log::error!(target: "cells", "Cell {id} can't receive messages because it doesn't exist.");
                continue;
            }
            self.tree.handle_messages(id, payloads)?;
        }

        self.tree.apply_deferred_changes()?;

        self.tree
            .focus
            .adopt_server_focus(focused_cell_id.as_ref(), focused_cell_event_id);
        // Rebuilds move nodes around and lose DOM focus, so it is re-asserted
        // after every frame.
        self.sync_focus()?;

        self.tree.release_elements(&released);
        Ok(())
    }

    fn install_type_definitions(&mut self, definitions: &[TypeDefinition]) -> Result<()> {
        for definition in definitions {
            self.plugins.install(definition.plugin(), &mut self.registry)?;
            self.tree.dom_mut().append_stylesheet(definition.css())?;
        }
        Ok(())
    }

    /// Instantiate `id` from the create map, children first.
    fn create_cell(&mut self, id: &CellId, pending: &mut PendingCells, order: &mut Vec<CellId>) -> Result<()> {
        let created = pending
            .shift_remove(id)
            .ok_or_else(|| FrameError::MissingDefinition { cell: id.clone() })?;
        let cell_type = self
            .registry
            .lookup(&created.cell_type)
            .cloned()
            .ok_or_else(|| FrameError::UnknownCellType {
                cell: id.clone(),
                cell_type: created.cell_type.clone(),
            })?;

        for child in all_identities(&created.children) {
            self.resolve_child(id, child, pending, order)?;
        }

        let behavior = cell_type.instantiate(&CellInit {
            identity: id,
            props: &created.extra_data,
            named_children: &created.children,
        });
        self.tree.insert(CellNode::new(
            id.clone(),
            created.cell_type,
            cell_type.structure,
            created.extra_data,
            created.children,
            behavior,
        ));
        order.push(id.clone());
        Ok(())
    }

    /// A live child must already belong to `parent`; anything else is
    /// created from the frame.
    fn resolve_child(
        &mut self,
        parent: &CellId,
        child: &CellId,
        pending: &mut PendingCells,
        order: &mut Vec<CellId>,
    ) -> Result<()> {
        if let Some(node) = self.tree.cell(child.as_str()) {
            if node.parent() != Some(parent) {
                return Err(FrameError::CellMoved {
                    cell: child.clone(),
                    from: node.parent().cloned(),
                    to: parent.clone(),
                }
                .into());
            }
            return Ok(());
        }
        self.create_cell(child, pending, order)
    }

    /// Re-assert DOM focus on the cell the server knows as focused.
    fn sync_focus(&mut self) -> Result<()> {
        match self.tree.focus.focused().cloned() {
            Some(focused) if self.tree.contains(focused.as_str()) => {
                self.tree.server_knows_as_focused_cell(&focused)
            }
            Some(_) => Ok(()),
            None => {
                self.tree.dom_mut().blur();
                Ok(())
            }
        }
    }
}

fn does_not_understand(message: &Value) {
    log::error!(target: "cells", "CellHandler does not understand the following message: {message}");
}
