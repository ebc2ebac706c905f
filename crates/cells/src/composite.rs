//! Composite cells: one element, built once, with a cached element per
//! named child slot so a changed child can be swapped in place without
//! rebuilding its siblings.

use core::iter;

use anyhow::{Result, anyhow};
use dom::DomId;

use crate::children::ChildRef;
use crate::context::BuildContext;
use crate::error::FrameError;
use crate::identity::CellId;
use crate::tree::{CellState, CellTree, CompositeCache};

const PLACEHOLDER_STYLE: &str = "display:none;";

impl CellTree {
    pub(crate) fn composite_cache(&self, id: &CellId) -> Result<&CompositeCache> {
        match &self.node(id)?.state {
            CellState::Composite(cache) => Ok(cache),
            CellState::Passthrough | CellState::Sequence(_) => {
                Err(anyhow!("cell {id} does not keep composite slots"))
            }
        }
    }

    pub(crate) fn composite_cache_mut(&mut self, id: &CellId) -> Result<&mut CompositeCache> {
        match &mut self.node_mut(id)?.state {
            CellState::Composite(cache) => Ok(cache),
            CellState::Passthrough | CellState::Sequence(_) => {
                Err(anyhow!("cell {id} does not keep composite slots"))
            }
        }
    }

    pub(crate) fn build_composite(&mut self, id: &CellId) -> Result<Option<DomId>> {
        if let Some(element) = self.composite_cache(id)?.dom_element {
            return Ok(Some(element));
        }
        let element = self.run_build(id)?;
        self.composite_cache_mut(id)?.dom_element = element;
        Ok(element)
    }

    fn run_build(&mut self, id: &CellId) -> Result<Option<DomId>> {
        self.with_behavior(id, |behavior, tree| {
            behavior.build(&mut BuildContext::new(tree, id.clone()))
        })
    }

    /// Build anew and move the result into the element the parent already
    /// holds, so the element's identity never changes.
    pub(crate) fn rebuild_composite(&mut self, id: &CellId) -> Result<()> {
        let cache = self.composite_cache_mut(id)?;
        cache.clear_slots();
        let Some(existing) = cache.dom_element else {
            return Ok(());
        };
        match self.run_build(id)? {
            Some(built) => {
                self.dom.copy_node_into(built, existing)?;
                self.add_canonical_tags(id, existing)?;
            }
            None => {
                log::warn!(target: "cells", "cell {id} built nothing on rebuild; keeping its element");
            }
        }
        Ok(())
    }

    pub(crate) fn composite_child_changed(&mut self, parent: &CellId, child: &CellId) -> Result<()> {
        let cache = self.composite_cache(parent)?;
        let Some(own_element) = cache.dom_element else {
            return Ok(());
        };
        let Some(slot) = cache.cell_id_to_child_name.get(child).cloned() else {
            return Ok(());
        };
        let (Some(slot_child), Some(old)) = (
            cache.child_name_to_child.get(&slot).cloned(),
            cache.child_name_to_dom.get(&slot).copied(),
        ) else {
            return Ok(());
        };

        let fresh = self.render_child_uncached(&slot_child)?;
        if !self.dom.is_descendant(own_element, old) {
            return Err(FrameError::ChildNotInDom {
                parent: parent.clone(),
                child: slot_child,
            }
            .into());
        }
        if fresh != old {
            self.dom.replace_with(old, fresh)?;
            self.release_placeholder(old);
        }
        self.composite_cache_mut(parent)?.child_name_to_dom.insert(slot, fresh);
        Ok(())
    }

    /// Render the single child in slot `name` and remember where it went.
    pub(crate) fn render_child_named(&mut self, owner: &CellId, name: &str) -> Result<Option<DomId>> {
        let child = match self.node(owner)?.named_children.get(name) {
            None => return Ok(None),
            Some(ChildRef::Cell(child)) => child.clone(),
            Some(ChildRef::List(_) | ChildRef::Map(_)) => {
                return Err(FrameError::SlotShape {
                    cell: owner.clone(),
                    slot: name.to_owned(),
                }
                .into());
            }
        };
        let element = self.render_child_uncached(&child)?;
        self.record_slot(owner, name.to_owned(), child, element)?;
        Ok(Some(element))
    }

    /// Render every child of slot `name`, flattening nested lists. Entries
    /// are remembered under `name#i`, `name#i#j`, and so on.
    pub(crate) fn render_children_named(&mut self, owner: &CellId, name: &str) -> Result<Vec<DomId>> {
        let Some(slot) = self.node(owner)?.named_children.get(name).cloned() else {
            return Ok(Vec::new());
        };
        let mut rendered = Vec::new();
        self.render_child_array(owner, name, &slot, name.to_owned(), &mut rendered)?;
        Ok(rendered)
    }

    fn render_child_array(
        &mut self,
        owner: &CellId,
        name: &str,
        slot: &ChildRef,
        slot_name: String,
        rendered: &mut Vec<DomId>,
    ) -> Result<()> {
        match slot {
            ChildRef::Cell(child) => {
                let element = self.render_child_uncached(child)?;
                self.record_slot(owner, slot_name, child.clone(), element)?;
                rendered.push(element);
            }
            ChildRef::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    self.render_child_array(owner, name, item, format!("{slot_name}#{index}"), rendered)?;
                }
            }
            ChildRef::Map(_) => {
                return Err(FrameError::SlotShape {
                    cell: owner.clone(),
                    slot: name.to_owned(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn record_slot(&mut self, owner: &CellId, slot_name: String, child: CellId, element: DomId) -> Result<()> {
        let cache = self.composite_cache_mut(owner)?;
        cache.cell_id_to_child_name.insert(child.clone(), slot_name.clone());
        cache.child_name_to_child.insert(slot_name.clone(), child);
        cache.child_name_to_dom.insert(slot_name, element);
        Ok(())
    }

    /// The child's element, or a hidden placeholder that marks where the
    /// child goes should it render something later.
    fn render_child_uncached(&mut self, child: &CellId) -> Result<DomId> {
        match self.build_dom_element(child)? {
            Some(element) => Ok(element),
            None => self
                .dom
                .make_element("div", &[("style", PLACEHOLDER_STYLE)], iter::empty()),
        }
    }

    fn release_placeholder(&mut self, node: DomId) {
        let is_placeholder = self.dom.tag_name(node) == Some("div")
            && self.dom.children(node).is_empty()
            && self
                .dom
                .node(node)
                .is_some_and(|n| n.attrs.len() == 1 && self.dom.get_attribute(node, "style") == Some(PLACEHOLDER_STYLE));
        if is_placeholder {
            self.dom.release(node);
        }
    }
}
