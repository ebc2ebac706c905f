//! Cells that do not contribute exactly one element of their own.
//!
//! A pass-through cell shows whatever its `content` child shows. A sequence
//! lays out its `elements` slot; inside a parent sequence of the same
//! orientation it folds into the parent as a run of children instead of
//! adding a wrapper element.

use anyhow::Result;
use dom::{Content, DomId};
use serde_json::Value;

use crate::children::ChildRef;
use crate::error::FrameError;
use crate::frame::{Props, is_truthy, prop_text};
use crate::identity::CellId;
use crate::tree::{CellState, CellTree, SequenceCache};

const CONTENT_SLOT: &str = "content";
const ELEMENTS_SLOT: &str = "elements";

fn is_horizontal(props: &Props) -> bool {
    props.get("orientation").and_then(Value::as_str) == Some("horizontal")
}

fn sequence_class(props: &Props) -> String {
    let mut classes = vec!["cell".to_owned(), "sequence".to_owned()];
    if is_horizontal(props) {
        classes.push("sequence-horizontal".to_owned());
    } else {
        classes.push("sequence-vertical".to_owned());
    }
    if props.get("flexChild").is_some_and(is_truthy) {
        classes.push("flex-child".to_owned());
    }
    if let Some(margin) = props.get("margin").filter(|value| is_truthy(value)) {
        classes.push(format!("child-margin-{}", prop_text(margin)));
    }
    if props.get("wrap").is_some_and(is_truthy) {
        classes.push("seq-flex-wrap".to_owned());
    }
    classes.join(" ")
}

impl CellTree {
    // -----------------------
    // Pass-through
    // -----------------------

    fn passthrough_content(&self, id: &CellId) -> Result<Option<CellId>> {
        match self.node(id)?.named_children.get(CONTENT_SLOT) {
            None => Ok(None),
            Some(ChildRef::Cell(content)) => Ok(Some(content.clone())),
            Some(ChildRef::List(_) | ChildRef::Map(_)) => Err(FrameError::SlotShape {
                cell: id.clone(),
                slot: CONTENT_SLOT.to_owned(),
            }
            .into()),
        }
    }

    pub(crate) fn build_passthrough(&mut self, id: &CellId) -> Result<Option<DomId>> {
        match self.passthrough_content(id)? {
            Some(content) => self.build_dom_element(&content),
            None => Ok(None),
        }
    }

    pub(crate) fn passthrough_sequence_children(&mut self, id: &CellId, horizontal: bool) -> Result<Vec<DomId>> {
        match self.passthrough_content(id)? {
            Some(content) => self.build_dom_sequence_children(&content, horizontal),
            None => Ok(Vec::new()),
        }
    }

    // -----------------------
    // Sequence
    // -----------------------

    fn sequence_cache(&self, id: &CellId) -> Result<&SequenceCache> {
        match &self.node(id)?.state {
            CellState::Sequence(cache) => Ok(cache),
            CellState::Composite(_) | CellState::Passthrough => {
                Err(anyhow::anyhow!("cell {id} is not a sequence"))
            }
        }
    }

    fn sequence_cache_mut(&mut self, id: &CellId) -> Result<&mut SequenceCache> {
        match &mut self.node_mut(id)?.state {
            CellState::Sequence(cache) => Ok(cache),
            CellState::Composite(_) | CellState::Passthrough => {
                Err(anyhow::anyhow!("cell {id} is not a sequence"))
            }
        }
    }

    /// Install the sequence as its own `div.cell.sequence`.
    pub(crate) fn build_sequence(&mut self, id: &CellId) -> Result<DomId> {
        let cache = self.sequence_cache_mut(id)?;
        cache.dom_children = None;
        if let Some(element) = cache.dom_element {
            return Ok(element);
        }

        let children = self.make_sequence_elements(id)?;
        let node = self.node(id)?;
        let class = sequence_class(&node.props);
        let cell_type = node.cell_type().to_owned();
        let element_id = id.element_id();
        let element = self.dom.make_element(
            "div",
            &[
                ("class", class.as_str()),
                ("id", element_id.as_str()),
                ("data-cell-id", id.as_str()),
                ("data-cell-type", cell_type.as_str()),
            ],
            children.into_iter().map(|child| Some(Content::from(child))),
        )?;
        self.sequence_cache_mut(id)?.dom_element = Some(element);
        self.update_flex_parent_tag(element);
        Ok(element)
    }

    /// Unpack into a parent sequence. A sequence of the other orientation
    /// still needs its own element.
    pub(crate) fn sequence_children(&mut self, id: &CellId, horizontal: bool) -> Result<Vec<DomId>> {
        if horizontal != is_horizontal(&self.node(id)?.props) {
            return Ok(self.build_dom_element(id)?.into_iter().collect());
        }

        let cache = self.sequence_cache_mut(id)?;
        cache.dom_element = None;
        if let Some(children) = &cache.dom_children {
            return Ok(children.clone());
        }
        let children = self.make_sequence_elements(id)?;
        self.sequence_cache_mut(id)?.dom_children = Some(children.clone());
        Ok(children)
    }

    fn make_sequence_elements(&mut self, id: &CellId) -> Result<Vec<DomId>> {
        let node = self.node(id)?;
        let horizontal = is_horizontal(&node.props);
        let members: Vec<CellId> = node
            .named_children
            .get(ELEMENTS_SLOT)
            .map(|slot| slot.identities().into_iter().cloned().collect())
            .unwrap_or_default();

        let mut elements = Vec::new();
        for member in &members {
            elements.extend(self.build_dom_sequence_children(member, horizontal)?);
        }
        Ok(elements)
    }

    pub(crate) fn rebuild_sequence(&mut self, id: &CellId) -> Result<()> {
        let installed = self.sequence_cache(id)?.dom_element;
        if let Some(element) = installed {
            let children = self.make_sequence_elements(id)?;
            self.dom.replace_children(element, &children)?;
            let class = sequence_class(&self.node(id)?.props);
            self.dom.set_attribute(element, "class", &class);
            self.update_flex_parent_tag(element);
            Ok(())
        } else {
            let children = self.make_sequence_elements(id)?;
            self.sequence_cache_mut(id)?.dom_children = Some(children);
            self.notify_parent(id)
        }
    }

    pub(crate) fn sequence_child_changed(&mut self, id: &CellId) -> Result<()> {
        let cache = self.sequence_cache(id)?;
        if let Some(element) = cache.dom_element {
            let children = self.make_sequence_elements(id)?;
            self.dom.replace_children(element, &children)?;
            self.update_flex_parent_tag(element);
            Ok(())
        } else if cache.dom_children.is_some() {
            self.sequence_cache_mut(id)?.dom_children = None;
            self.notify_parent(id)
        } else {
            Err(FrameError::NotInstalled { cell: id.clone() }.into())
        }
    }

    /// A sequence holding any `flex-child` is a `flex-parent`.
    fn update_flex_parent_tag(&mut self, element: DomId) {
        let any_flex = self
            .dom
            .children(element)
            .into_iter()
            .any(|child| self.dom.has_class(child, "flex-child"));
        if any_flex {
            self.dom.add_class(element, "flex-parent");
        } else if self.dom.has_class(element, "flex-parent") {
            self.dom.remove_class(element, "flex-parent");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Props {
        match value {
            Value::Object(map) => map,
            _ => Props::new(),
        }
    }

    #[test]
    fn sequence_classes_follow_props() {
        assert_eq!(sequence_class(&Props::new()), "cell sequence sequence-vertical");
        assert_eq!(
            sequence_class(&props(json!({
                "orientation": "horizontal",
                "flexChild": true,
                "margin": 2,
                "wrap": true,
            }))),
            "cell sequence sequence-horizontal flex-child child-margin-2 seq-flex-wrap"
        );
        assert_eq!(
            sequence_class(&props(json!({ "margin": 0, "flexChild": false }))),
            "cell sequence sequence-vertical"
        );
    }
}
