//! Views of the tree handed to cell behaviours.

use core::ops::{Deref, DerefMut};
use std::sync::LazyLock;

use anyhow::Result;
use dom::{Dom, DomId};
use serde_json::Value;

use crate::children::NamedChildren;
use crate::frame::{Props, is_truthy};
use crate::identity::CellId;
use crate::packets::PacketCallback;
use crate::tree::{CellNode, CellTree, DeferredChange};

static NO_PROPS: LazyLock<Props> = LazyLock::new(Props::new);
static NO_CHILDREN: LazyLock<NamedChildren> = LazyLock::new(NamedChildren::new);

/// One cell's handle on the tree during a hook: its own data, the document,
/// and the outbound channels.
pub struct CellContext<'tree> {
    tree: &'tree mut CellTree,
    identity: CellId,
}

impl<'tree> CellContext<'tree> {
    pub(crate) fn new(tree: &'tree mut CellTree, identity: CellId) -> Self {
        Self { tree, identity }
    }

    fn node(&self) -> Option<&CellNode> {
        self.tree.cell(self.identity.as_str())
    }

    pub fn identity(&self) -> &CellId {
        &self.identity
    }

    /// `id` attribute for this cell's element.
    pub fn element_id(&self) -> String {
        self.identity.element_id()
    }

    pub fn cell_type(&self) -> &str {
        self.node().map_or("", CellNode::cell_type)
    }

    pub fn props(&self) -> &Props {
        self.node().map_or(&*NO_PROPS, CellNode::props)
    }

    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.props().get(name)
    }

    pub fn prop_str(&self, name: &str) -> Option<&str> {
        self.prop(name).and_then(Value::as_str)
    }

    /// Whether the prop is present and truthy.
    pub fn prop_flag(&self, name: &str) -> bool {
        self.prop(name).is_some_and(is_truthy)
    }

    pub fn named_children(&self) -> &NamedChildren {
        self.node().map_or(&*NO_CHILDREN, CellNode::named_children)
    }

    pub fn parent(&self) -> Option<&CellId> {
        self.node().and_then(CellNode::parent)
    }

    /// The element this cell is installed as, once built.
    pub fn dom_element(&self) -> Option<DomId> {
        self.node().and_then(CellNode::dom_element)
    }

    pub fn tree(&self) -> &CellTree {
        self.tree
    }

    pub fn document(&self) -> &Dom {
        self.tree.dom()
    }

    pub fn dom(&mut self) -> &mut Dom {
        self.tree.dom_mut()
    }

    /// Send `message` to this cell's server-side counterpart.
    ///
    /// # Errors
    /// Fails when `message` is not an object or the transport refuses it.
    pub fn send_message(&self, message: Value) -> Result<()> {
        self.tree.send(message, self.identity.as_str())
    }

    /// Report that the user focused this cell.
    ///
    /// # Errors
    /// Propagates transport failures.
    pub fn focus_received(&mut self) -> Result<()> {
        let identity = self.identity.clone();
        self.tree.cell_received_focus(&identity)
    }

    pub fn request_packet(&mut self, packet_id: u64, callback: PacketCallback) {
        self.tree.request_packet(packet_id, callback);
    }

    /// Rebuild this cell once the running hook returns, keeping the element
    /// its parent holds.
    pub fn request_rebuild(&mut self) {
        self.tree.defer(DeferredChange::Rebuild(self.identity.clone()));
    }

    /// Make `element` this cell's representation. Once the running hook
    /// returns, the parent swaps it in where the previous element was and the
    /// previous element is released.
    ///
    /// # Errors
    /// Fails for cells that do not own an element of their own.
    pub fn replace_dom_element(&mut self, element: DomId) -> Result<()> {
        let previous = self.tree.composite_cache_mut(&self.identity)?.dom_element.replace(element);
        self.tree.defer(DeferredChange::Replaced {
            cell: self.identity.clone(),
            previous,
        });
        Ok(())
    }
}

/// Context of [`CellBehavior::build`](crate::CellBehavior::build): a
/// [`CellContext`] plus the slot rendering helpers.
pub struct BuildContext<'tree> {
    cell: CellContext<'tree>,
}

impl<'tree> BuildContext<'tree> {
    pub(crate) fn new(tree: &'tree mut CellTree, identity: CellId) -> Self {
        Self {
            cell: CellContext::new(tree, identity),
        }
    }

    /// Render the single child held in slot `name`. `None` when the slot is
    /// empty; a hidden placeholder stands in for a child that renders
    /// nothing.
    ///
    /// # Errors
    /// [`FrameError::SlotShape`](crate::FrameError::SlotShape) when the slot
    /// holds a list or map, otherwise the child's build failures.
    pub fn render_child_named(&mut self, name: &str) -> Result<Option<DomId>> {
        let identity = self.cell.identity.clone();
        self.cell.tree.render_child_named(&identity, name)
    }

    /// Render every child of an array slot, flattened in order.
    ///
    /// # Errors
    /// Propagates the children's build failures.
    pub fn render_children_named(&mut self, name: &str) -> Result<Vec<DomId>> {
        let identity = self.cell.identity.clone();
        self.cell.tree.render_children_named(&identity, name)
    }
}

impl<'tree> Deref for BuildContext<'tree> {
    type Target = CellContext<'tree>;

    fn deref(&self) -> &Self::Target {
        &self.cell
    }
}

impl DerefMut for BuildContext<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.cell
    }
}
