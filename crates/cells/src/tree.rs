//! The live cell table and the structural operations on it.
//!
//! Every operation here dispatches on the [`Structure`] a cell was registered
//! with. Composite algorithms live in [`crate::composite`], pass-through and
//! sequence folding in [`crate::structural`].

use core::fmt;
use core::iter;
use core::mem;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

use anyhow::{Result, anyhow};
use dom::{Content, Dom, DomId};
use serde_json::{Value, json};

use crate::behavior::CellBehavior;
use crate::children::NamedChildren;
use crate::context::CellContext;
use crate::error::FrameError;
use crate::focus::FocusState;
use crate::frame::Props;
use crate::identity::{CellId, MAIN_CELLS_HANDLER, ROOT_CELL_ID};
use crate::packets::{PacketCallback, PacketStore};
use crate::registry::Structure;
use crate::socket::Transport;

/// Per-slot bookkeeping of a composite (or leaf) cell. Slot names are the
/// child's name, or `name#i#j` for entries of array slots.
#[derive(Debug, Default, Clone)]
pub(crate) struct CompositeCache {
    pub(crate) dom_element: Option<DomId>,
    pub(crate) child_name_to_child: BTreeMap<String, CellId>,
    pub(crate) child_name_to_dom: BTreeMap<String, DomId>,
    pub(crate) cell_id_to_child_name: HashMap<CellId, String>,
}

impl CompositeCache {
    pub(crate) fn clear_slots(&mut self) {
        self.child_name_to_child.clear();
        self.child_name_to_dom.clear();
        self.cell_id_to_child_name.clear();
    }
}

/// A sequence is either installed as its own element or folded into a
/// parent sequence as a run of children, never both.
#[derive(Debug, Default, Clone)]
pub(crate) struct SequenceCache {
    pub(crate) dom_element: Option<DomId>,
    pub(crate) dom_children: Option<Vec<DomId>>,
}

#[derive(Debug, Clone)]
pub(crate) enum CellState {
    Composite(CompositeCache),
    Passthrough,
    Sequence(SequenceCache),
}

impl CellState {
    fn for_structure(structure: Structure) -> Self {
        match structure {
            Structure::Leaf | Structure::Composite => Self::Composite(CompositeCache::default()),
            Structure::Passthrough => Self::Passthrough,
            Structure::Sequence => Self::Sequence(SequenceCache::default()),
        }
    }

    fn dom_element(&self) -> Option<DomId> {
        match self {
            Self::Composite(cache) => cache.dom_element,
            Self::Sequence(cache) => cache.dom_element,
            Self::Passthrough => None,
        }
    }
}

/// Work a cell asked for from inside one of its hooks. It runs once the hook
/// has returned and the cell's behaviour is back in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DeferredChange {
    Rebuild(CellId),
    Replaced { cell: CellId, previous: Option<DomId> },
}

/// One live cell.
pub struct CellNode {
    identity: CellId,
    cell_type: String,
    structure: Structure,
    pub(crate) props: Props,
    pub(crate) named_children: NamedChildren,
    pub(crate) parent: Option<CellId>,
    pub(crate) state: CellState,
    pub(crate) behavior: Option<Box<dyn CellBehavior>>,
}

impl CellNode {
    pub(crate) fn new(
        identity: CellId,
        cell_type: String,
        structure: Structure,
        props: Props,
        named_children: NamedChildren,
        behavior: Box<dyn CellBehavior>,
    ) -> Self {
        Self {
            identity,
            cell_type,
            structure,
            props,
            named_children,
            parent: None,
            state: CellState::for_structure(structure),
            behavior: Some(behavior),
        }
    }

    pub fn identity(&self) -> &CellId {
        &self.identity
    }

    pub fn cell_type(&self) -> &str {
        &self.cell_type
    }

    pub fn structure(&self) -> Structure {
        self.structure
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn named_children(&self) -> &NamedChildren {
        &self.named_children
    }

    pub fn parent(&self) -> Option<&CellId> {
        self.parent.as_ref()
    }

    /// The element this cell installed itself as, if it has one.
    pub fn dom_element(&self) -> Option<DomId> {
        self.state.dom_element()
    }

    /// Slot name under which a composite last rendered `child`.
    pub fn slot_of(&self, child: &CellId) -> Option<&str> {
        match &self.state {
            CellState::Composite(cache) => cache.cell_id_to_child_name.get(child).map(String::as_str),
            CellState::Passthrough | CellState::Sequence(_) => None,
        }
    }

    /// Element a composite last rendered into slot `name`.
    pub fn slot_element(&self, name: &str) -> Option<DomId> {
        match &self.state {
            CellState::Composite(cache) => cache.child_name_to_dom.get(name).copied(),
            CellState::Passthrough | CellState::Sequence(_) => None,
        }
    }
}

impl fmt::Debug for CellNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellNode")
            .field("identity", &self.identity)
            .field("cell_type", &self.cell_type)
            .field("structure", &self.structure)
            .field("parent", &self.parent)
            .field("dom_element", &self.dom_element())
            .finish_non_exhaustive()
    }
}

fn not_live(id: &CellId) -> anyhow::Error {
    anyhow!("cell {id} is not in the tree")
}

/// Live cells by identity, the document they render into, and the state
/// cells reach through their contexts (transport, focus, packets).
#[derive(Default)]
pub struct CellTree {
    pub(crate) cells: HashMap<CellId, CellNode>,
    pub(crate) dom: Dom,
    transport: Option<Rc<dyn Transport>>,
    pub(crate) focus: FocusState,
    pub(crate) packets: PacketStore,
    deferred: Vec<DeferredChange>,
}

impl CellTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(&self, id: &str) -> Option<&CellNode> {
        self.cells.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.cells.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Live identities in sorted order.
    pub fn identities(&self) -> Vec<&CellId> {
        let mut ids: Vec<&CellId> = self.cells.keys().collect();
        ids.sort();
        ids
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    pub fn focus(&self) -> &FocusState {
        &self.focus
    }

    pub fn packets(&self) -> &PacketStore {
        &self.packets
    }

    pub fn set_transport(&mut self, transport: Rc<dyn Transport>) {
        self.transport = Some(transport);
    }

    pub fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    pub(crate) fn node(&self, id: &CellId) -> Result<&CellNode> {
        self.cells.get(id).ok_or_else(|| not_live(id))
    }

    pub(crate) fn node_mut(&mut self, id: &CellId) -> Result<&mut CellNode> {
        self.cells.get_mut(id).ok_or_else(|| not_live(id))
    }

    pub(crate) fn insert(&mut self, node: CellNode) {
        self.cells.insert(node.identity.clone(), node);
    }

    pub(crate) fn remove(&mut self, id: &CellId) -> Option<CellNode> {
        self.cells.remove(id)
    }

    /// Run one behaviour hook with the behaviour detached from its node, so
    /// the hook can borrow the rest of the tree mutably.
    pub(crate) fn with_behavior<R>(
        &mut self,
        id: &CellId,
        call: impl FnOnce(&mut dyn CellBehavior, &mut Self) -> Result<R>,
    ) -> Result<R> {
        let node = self.node_mut(id)?;
        let mut behavior = node
            .behavior
            .take()
            .ok_or_else(|| anyhow!("cell {id} re-entered its own behaviour"))?;
        let result = call(behavior.as_mut(), self);
        if let Some(node) = self.cells.get_mut(id) {
            node.behavior = Some(behavior);
        }
        result
    }

    /// Like [`CellTree::with_behavior`], then apply whatever the hook deferred.
    fn run_hook(
        &mut self,
        id: &CellId,
        call: impl FnOnce(&mut dyn CellBehavior, &mut Self) -> Result<()>,
    ) -> Result<()> {
        self.with_behavior(id, call)?;
        self.apply_deferred_changes()
    }

    pub(crate) fn defer(&mut self, change: DeferredChange) {
        self.deferred.push(change);
    }

    /// Run the changes cells requested, in request order. Cells that left
    /// the tree in the meantime are skipped.
    ///
    /// # Errors
    /// Propagates rebuild and parent-notification failures.
    pub fn apply_deferred_changes(&mut self) -> Result<()> {
        for change in mem::take(&mut self.deferred) {
            match change {
                DeferredChange::Rebuild(cell) => {
                    if self.contains(cell.as_str()) {
                        self.rebuild_dom_element(&cell)?;
                    }
                }
                DeferredChange::Replaced { cell, previous } => {
                    if self.contains(cell.as_str()) {
                        self.notify_parent(&cell)?;
                    }
                    if let Some(previous) = previous {
                        self.release_elements(&[previous]);
                    }
                }
            }
        }
        Ok(())
    }

    // -----------------------
    // Outbound messages
    // -----------------------

    /// Serialize `message` with `target_cell` set and hand it to the
    /// transport. Without a transport this does nothing.
    ///
    /// # Errors
    /// Fails when `message` is not a JSON object or the transport refuses it.
    pub fn send(&self, message: Value, target: &str) -> Result<()> {
        let Some(transport) = &self.transport else {
            return Ok(());
        };
        let Value::Object(mut fields) = message else {
            return Err(anyhow!("outbound messages must be JSON objects"));
        };
        fields.insert("target_cell".to_owned(), Value::String(target.to_owned()));
        transport.send_string(serde_json::to_string(&Value::Object(fields))?)
    }

    /// A cell took focus. Outside of a frame this is echoed to the server as
    /// a numbered `focusChanged` event.
    ///
    /// # Errors
    /// Propagates transport failures.
    pub fn cell_received_focus(&mut self, cell: &CellId) -> Result<()> {
        let Some(event_id) = self.focus.receive_focus(cell) else {
            return Ok(());
        };
        self.send(
            json!({ "event": "focusChanged", "eventId": event_id, "cellId": cell }),
            MAIN_CELLS_HANDLER,
        )
    }

    pub fn on_packet(&mut self, packet_id: u64, packet: bytes::Bytes) {
        self.packets.on_packet(packet_id, packet);
    }

    pub fn request_packet(&mut self, packet_id: u64, callback: PacketCallback) {
        self.packets.request_packet(packet_id, callback);
    }

    // -----------------------
    // Mount point
    // -----------------------

    pub fn mount_point(&self) -> Option<DomId> {
        self.dom.get_element_by_id(ROOT_CELL_ID)
    }

    /// Find or create `div > div#page_root` at the end of the body.
    ///
    /// # Errors
    /// Propagates DOM errors.
    pub fn ensure_mount_point(&mut self) -> Result<DomId> {
        if let Some(mount) = self.mount_point() {
            return Ok(mount);
        }
        let mount = self.dom.make_element(
            "div",
            &[
                ("id", ROOT_CELL_ID),
                ("data-cell-id", ROOT_CELL_ID),
                ("class", "allow-child-to-fill-space"),
                ("data-cell-type", "RootCell"),
            ],
            iter::empty(),
        )?;
        let wrapper = self.dom.make_element("div", &[], [Some(Content::from(mount))])?;
        let body = self.dom.body();
        self.dom.append_child(body, wrapper)?;
        Ok(mount)
    }

    /// Show `content` as the only thing inside the mount point.
    ///
    /// # Errors
    /// Propagates DOM errors.
    pub fn render_main(&mut self, content: DomId) -> Result<()> {
        let mount = self.ensure_mount_point()?;
        let stale: Vec<DomId> = self
            .dom
            .children(mount)
            .into_iter()
            .filter(|child| *child != content)
            .collect();
        self.dom.replace_children(mount, &[content])?;
        self.release_elements(&stale);
        Ok(())
    }

    /// Make the mount point the element of composite `id`, so building the
    /// cell fills the page instead of a fresh element.
    pub(crate) fn adopt_mount_point(&mut self, id: &CellId) -> Result<()> {
        let mount = self.ensure_mount_point()?;
        self.composite_cache_mut(id)?.dom_element = Some(mount);
        Ok(())
    }

    /// Free the detached DOM of cells that left the tree, unless a live cell
    /// still renders somewhere inside it.
    pub(crate) fn release_elements(&mut self, elements: &[DomId]) {
        if elements.is_empty() {
            return;
        }
        let live: HashSet<DomId> = self.cells.values().filter_map(CellNode::dom_element).collect();
        for element in elements {
            if self.dom.parent(*element).is_some() || live.contains(element) {
                continue;
            }
            let keeps_live_cell = self
                .dom
                .descendants(*element)
                .iter()
                .any(|node| live.contains(node));
            if !keeps_live_cell {
                self.dom.release(*element);
            }
        }
    }

    // -----------------------
    // Structural operations
    // -----------------------

    /// This cell's element, built on first request and cached until the
    /// next rebuild. `None` when the cell has no DOM representation.
    ///
    /// # Errors
    /// Propagates failures of the cell's `build` and of DOM surgery.
    pub fn build_dom_element(&mut self, id: &CellId) -> Result<Option<DomId>> {
        let element = match self.node(id)?.structure {
            Structure::Leaf | Structure::Composite => self.build_composite(id)?,
            Structure::Passthrough => self.build_passthrough(id)?,
            Structure::Sequence => Some(self.build_sequence(id)?),
        };
        if let Some(element) = element {
            self.add_canonical_tags(id, element)?;
        }
        Ok(element)
    }

    /// The nodes this cell contributes when unpacked into a sequence laid
    /// out horizontally (`true`) or vertically.
    ///
    /// # Errors
    /// Propagates build failures.
    pub fn build_dom_sequence_children(&mut self, id: &CellId, horizontal: bool) -> Result<Vec<DomId>> {
        match self.node(id)?.structure {
            Structure::Leaf | Structure::Composite => Ok(self.build_dom_element(id)?.into_iter().collect()),
            Structure::Passthrough => self.passthrough_sequence_children(id, horizontal),
            Structure::Sequence => self.sequence_children(id, horizontal),
        }
    }

    /// Re-render an updated cell while keeping the identity of whatever its
    /// parent holds for it.
    ///
    /// # Errors
    /// Propagates build failures and cache corruption errors.
    pub fn rebuild_dom_element(&mut self, id: &CellId) -> Result<()> {
        match self.node(id)?.structure {
            Structure::Leaf | Structure::Composite => self.rebuild_composite(id),
            Structure::Passthrough => self.notify_parent(id),
            Structure::Sequence => self.rebuild_sequence(id),
        }
    }

    /// `child`'s representation changed; bring `parent`'s DOM up to date.
    ///
    /// # Errors
    /// [`FrameError::Unimplemented`] for leaves, [`FrameError::ChildNotInDom`]
    /// and [`FrameError::NotInstalled`] on inconsistent caches.
    pub fn child_changed(&mut self, parent: &CellId, child: &CellId) -> Result<()> {
        match self.node(parent)?.structure {
            Structure::Leaf => Err(FrameError::Unimplemented {
                cell: parent.clone(),
                capability: "childChanged",
            }
            .into()),
            Structure::Composite => self.composite_child_changed(parent, child),
            Structure::Passthrough => self.notify_parent(parent),
            Structure::Sequence => self.sequence_child_changed(parent),
        }
    }

    /// Tell `id`'s parent that `id` changed. Cells without a live parent have
    /// nobody to tell.
    pub(crate) fn notify_parent(&mut self, id: &CellId) -> Result<()> {
        let parent = self.node(id)?.parent.clone();
        match parent {
            Some(parent) if self.contains(parent.as_str()) => self.child_changed(&parent, id),
            Some(parent) => {
                log::warn!(target: "cells", "cell {id} changed but its parent {parent} is gone");
                Ok(())
            }
            None => {
                log::warn!(target: "cells", "cell {id} changed but has no parent to re-render it");
                Ok(())
            }
        }
    }

    /// # Errors
    /// Fails when `id` is not live.
    pub fn set_parent(&mut self, id: &CellId, parent: Option<CellId>) -> Result<()> {
        self.node_mut(id)?.parent = parent;
        Ok(())
    }

    /// Replace children and props wholesale. Nothing is re-rendered.
    ///
    /// # Errors
    /// Fails when `id` is not live.
    pub fn update_self(&mut self, id: &CellId, named_children: NamedChildren, props: Props) -> Result<()> {
        let node = self.node_mut(id)?;
        node.named_children = named_children;
        node.props = props;
        Ok(())
    }

    pub(crate) fn add_canonical_tags(&mut self, id: &CellId, element: DomId) -> Result<()> {
        let tag = self.node(id)?.props.get("_tag").and_then(Value::as_str).map(str::to_owned);
        if let Some(tag) = tag {
            self.dom.set_attribute(element, "data-tag", &tag);
        }
        Ok(())
    }

    // -----------------------
    // Lifecycle hooks
    // -----------------------

    /// # Errors
    /// Propagates the hook's failure.
    pub fn on_first_installed(&mut self, id: &CellId) -> Result<()> {
        self.run_hook(id, |behavior, tree| {
            behavior.on_first_installed(&mut CellContext::new(tree, id.clone()))
        })
    }

    /// # Errors
    /// Propagates the hook's failure.
    pub fn cell_will_unload(&mut self, id: &CellId) -> Result<()> {
        self.with_behavior(id, |behavior, tree| {
            behavior.cell_will_unload(&mut CellContext::new(tree, id.clone()))
        })
    }

    /// # Errors
    /// Propagates the hook's failure.
    pub fn handle_messages(&mut self, id: &CellId, messages: &[Value]) -> Result<()> {
        self.run_hook(id, |behavior, tree| {
            behavior.handle_messages(&mut CellContext::new(tree, id.clone()), messages)
        })
    }

    /// # Errors
    /// Propagates the hook's failure.
    pub fn server_knows_as_focused_cell(&mut self, id: &CellId) -> Result<()> {
        self.run_hook(id, |behavior, tree| {
            behavior.server_knows_as_focused_cell(&mut CellContext::new(tree, id.clone()))
        })
    }
}

impl fmt::Debug for CellTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellTree")
            .field("cells", &self.identities())
            .field("focus", &self.focus)
            .field("packets", &self.packets)
            .finish_non_exhaustive()
    }
}
