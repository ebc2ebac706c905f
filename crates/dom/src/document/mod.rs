mod editing;
mod printing;

pub use printing::Subtree;

use anyhow::{Result, anyhow};
use indextree::{Arena, NodeId};
use smallvec::SmallVec;

/// Handle of a node inside a [`Dom`].
pub type DomId = NodeId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NodeKind {
    #[default]
    Document,
    Element { tag: String },
    Text { text: String },
}

#[derive(Debug, Clone, Default)]
pub struct DomNode {
    pub kind: NodeKind,
    pub attrs: SmallVec<(String, String), 4>,
}

/// A child handed to [`Dom::make_element`]: an existing node or a string that
/// becomes a fresh text node.
#[derive(Debug, Clone)]
pub enum Content {
    Node(DomId),
    Text(String),
}

impl From<DomId> for Content {
    fn from(node: DomId) -> Self {
        Self::Node(node)
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

pub struct Dom {
    dom: Arena<DomNode>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
    focused: Option<NodeId>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// Create a document holding an empty `<html>` with `<head>` and `<body>`.
    pub fn new() -> Self {
        let mut dom = Arena::new();
        let root = dom.new_node(DomNode::default());
        let html = dom.new_node(element_node("html"));
        let head = dom.new_node(element_node("head"));
        let body = dom.new_node(element_node("body"));
        root.append(html, &mut dom);
        html.append(head, &mut dom);
        html.append(body, &mut dom);
        Self {
            dom,
            root,
            head,
            body,
            focused: None,
        }
    }

    pub fn document(&self) -> DomId {
        self.root
    }

    pub fn head(&self) -> DomId {
        self.head
    }

    pub fn body(&self) -> DomId {
        self.body
    }

    pub fn create_element(&mut self, tag: &str) -> DomId {
        self.dom.new_node(element_node(tag))
    }

    pub fn create_text(&mut self, text: &str) -> DomId {
        self.dom.new_node(DomNode {
            kind: NodeKind::Text {
                text: text.to_owned(),
            },
            attrs: SmallVec::new(),
        })
    }

    /// Build an element with attributes and children in one go. `None`
    /// children are skipped, strings become text nodes.
    ///
    /// # Errors
    /// Returns an error if a child node cannot be appended (for example
    /// because it is an ancestor of the new element or was released).
    pub fn make_element<I>(&mut self, tag: &str, attrs: &[(&str, &str)], children: I) -> Result<DomId>
    where
        I: IntoIterator<Item = Option<Content>>,
    {
        let element = self.create_element(tag);
        for (name, value) in attrs {
            self.set_attribute(element, name, value);
        }
        for child in children.into_iter().flatten() {
            let child = match child {
                Content::Node(node) => node,
                Content::Text(text) => self.create_text(&text),
            };
            self.append_child(element, child)?;
        }
        Ok(element)
    }

    pub fn node(&self, id: DomId) -> Option<&DomNode> {
        if id.is_removed(&self.dom) {
            return None;
        }
        self.dom.get(id).map(indextree::Node::get)
    }

    fn node_mut(&mut self, id: DomId) -> Option<&mut DomNode> {
        if id.is_removed(&self.dom) {
            return None;
        }
        self.dom.get_mut(id).map(indextree::Node::get_mut)
    }

    /// Whether the handle still refers to a node of this document.
    pub fn is_live(&self, id: DomId) -> bool {
        self.dom.get(id).is_some() && !id.is_removed(&self.dom)
    }

    pub fn tag_name(&self, id: DomId) -> Option<&str> {
        match &self.node(id)?.kind {
            NodeKind::Element { tag } => Some(tag),
            NodeKind::Document | NodeKind::Text { .. } => None,
        }
    }

    pub fn set_attribute(&mut self, id: DomId, name: &str, value: &str) {
        let Some(node) = self.node_mut(id) else {
            log::warn!("set_attribute({name}) on a released node");
            return;
        };
        if let Some(slot) = node.attrs.iter_mut().find(|(key, _)| key == name) {
            value.clone_into(&mut slot.1);
        } else {
            node.attrs.push((name.to_owned(), value.to_owned()));
        }
    }

    pub fn get_attribute(&self, id: DomId, name: &str) -> Option<&str> {
        self.node(id)?
            .attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn remove_attribute(&mut self, id: DomId, name: &str) {
        if let Some(node) = self.node_mut(id) {
            if let Some(pos) = node.attrs.iter().position(|(key, _)| key == name) {
                node.attrs.remove(pos);
            }
        }
    }

    pub fn has_class(&self, id: DomId, class: &str) -> bool {
        self.get_attribute(id, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|token| token == class))
    }

    pub fn add_class(&mut self, id: DomId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let classes = match self.get_attribute(id, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_owned(),
        };
        self.set_attribute(id, "class", &classes);
    }

    pub fn remove_class(&mut self, id: DomId, class: &str) {
        let Some(existing) = self.get_attribute(id, "class") else {
            return;
        };
        let classes: Vec<&str> = existing
            .split_whitespace()
            .filter(|token| *token != class)
            .collect();
        let classes = classes.join(" ");
        self.set_attribute(id, "class", &classes);
    }

    /// # Errors
    /// Returns an error if `child` is an ancestor of `parent` or either
    /// handle was released.
    pub fn append_child(&mut self, parent: DomId, child: DomId) -> Result<()> {
        if !self.is_live(parent) || !self.is_live(child) {
            return Err(anyhow!("append_child on a released node"));
        }
        parent.checked_append(child, &mut self.dom)?;
        Ok(())
    }

    pub fn parent(&self, id: DomId) -> Option<DomId> {
        if id.is_removed(&self.dom) {
            return None;
        }
        self.dom.get(id).and_then(indextree::Node::parent)
    }

    pub fn children(&self, id: DomId) -> Vec<DomId> {
        if !self.is_live(id) {
            return Vec::new();
        }
        id.children(&self.dom).collect()
    }

    /// `id` and everything below it, in document order.
    pub fn descendants(&self, id: DomId) -> Vec<DomId> {
        if !self.is_live(id) {
            return Vec::new();
        }
        id.descendants(&self.dom).collect()
    }

    /// Whether `node` sits strictly below `ancestor`.
    pub fn is_descendant(&self, ancestor: DomId, node: DomId) -> bool {
        if !self.is_live(node) {
            return false;
        }
        node.ancestors(&self.dom).skip(1).any(|id| id == ancestor)
    }

    /// Whether the node is reachable from the document root.
    pub fn is_attached(&self, node: DomId) -> bool {
        node == self.root || self.is_descendant(self.root, node)
    }

    /// Concatenated text of every text node below `id`, in document order.
    pub fn text_content(&self, id: DomId) -> String {
        let mut out = String::new();
        if !self.is_live(id) {
            return out;
        }
        for node in id.descendants(&self.dom) {
            if let Some(DomNode {
                kind: NodeKind::Text { text },
                ..
            }) = self.node(node)
            {
                out.push_str(text);
            }
        }
        out
    }

    /// First attached element whose `id` attribute equals `element_id`.
    pub fn get_element_by_id(&self, element_id: &str) -> Option<DomId> {
        self.root
            .descendants(&self.dom)
            .find(|node| self.get_attribute(*node, "id") == Some(element_id))
    }

    /// Append a `<style>` element holding `css` to the document head.
    ///
    /// # Errors
    /// Propagates arena errors from appending the element.
    pub fn append_stylesheet(&mut self, css: &str) -> Result<DomId> {
        let style = self.make_element("style", &[("type", "text/css")], [Some(Content::from(css))])?;
        self.append_child(self.head, style)?;
        Ok(style)
    }

    /// Free a detached subtree. Attached nodes and the document itself are
    /// left alone so a stale handle can never tear a hole in the live tree.
    pub fn release(&mut self, id: DomId) {
        if id == self.root || !self.is_live(id) || self.parent(id).is_some() {
            return;
        }
        id.remove_subtree(&mut self.dom);
    }

    /// Give focus to an attached element. Focusing a detached or released
    /// node is ignored, like in a browser.
    pub fn focus(&mut self, id: DomId) {
        if self.tag_name(id).is_some() && self.is_attached(id) {
            self.focused = Some(id);
        }
    }

    pub fn blur(&mut self) {
        self.focused = None;
    }

    /// The focused element, if it is still attached.
    pub fn active_element(&self) -> Option<DomId> {
        self.focused.filter(|id| self.is_attached(*id))
    }

    /// Number of nodes still allocated, detached ones included.
    pub fn live_node_count(&self) -> usize {
        self.dom.iter().filter(|node| !node.is_removed()).count()
    }
}

fn element_node(tag: &str) -> DomNode {
    DomNode {
        kind: NodeKind::Element {
            tag: tag.to_owned(),
        },
        attrs: SmallVec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_list_round_trips_tokens() {
        let mut dom = Dom::new();
        let div = dom.create_element("div");
        dom.add_class(div, "cell");
        dom.add_class(div, "flex-parent");
        dom.add_class(div, "cell");
        assert_eq!(dom.get_attribute(div, "class"), Some("cell flex-parent"));
        dom.remove_class(div, "cell");
        assert_eq!(dom.get_attribute(div, "class"), Some("flex-parent"));
        assert!(dom.has_class(div, "flex-parent"));
        assert!(!dom.has_class(div, "cell"));
    }

    #[test]
    fn release_ignores_attached_nodes() {
        let mut dom = Dom::new();
        let body = dom.body();
        let attached = dom.create_element("div");
        dom.append_child(body, attached).unwrap();
        dom.release(attached);
        assert!(dom.is_live(attached));

        let detached = dom.make_element("div", &[], [Some(Content::from("x"))]).unwrap();
        let text = dom.children(detached)[0];
        dom.release(detached);
        assert!(!dom.is_live(detached));
        assert!(!dom.is_live(text));
    }

    #[test]
    fn focus_follows_attachment() {
        let mut dom = Dom::new();
        let body = dom.body();
        let input = dom.create_element("div");
        dom.focus(input);
        assert_eq!(dom.active_element(), None);

        dom.append_child(body, input).unwrap();
        dom.focus(input);
        assert_eq!(dom.active_element(), Some(input));

        dom.replace_children(body, &[]).unwrap();
        assert_eq!(dom.active_element(), None);
    }
}
