//! Tree surgery used by cells when their rendered output changes.

use super::{Dom, DomId, NodeKind};
use anyhow::{Result, anyhow};

impl Dom {
    /// Put `new` where `old` currently sits and detach `old`.
    ///
    /// # Errors
    /// Returns an error if `old` has no parent or `new` is an ancestor of `old`.
    pub fn replace_with(&mut self, old: DomId, new: DomId) -> Result<()> {
        if old == new {
            return Ok(());
        }
        if self.parent(old).is_none() {
            return Err(anyhow!("replace_with on a node that is not in the tree"));
        }
        old.checked_insert_before(new, &mut self.dom)?;
        old.detach(&mut self.dom);
        Ok(())
    }

    /// Make `children` the exact child list of `parent`, leaving it untouched
    /// when it already matches.
    ///
    /// # Errors
    /// Propagates arena errors from re-appending the children.
    pub fn replace_children(&mut self, parent: DomId, children: &[DomId]) -> Result<()> {
        let current = self.children(parent);
        if current.as_slice() == children {
            return Ok(());
        }
        for child in current {
            child.detach(&mut self.dom);
        }
        for child in children {
            self.append_child(parent, *child)?;
        }
        Ok(())
    }

    /// Move the children and attributes of `source` into `dest`, so `dest`
    /// keeps its identity in the tree while showing what `source` was built
    /// as. The emptied `source` is released when detached.
    ///
    /// # Errors
    /// Propagates arena errors from moving the children.
    pub fn copy_node_into(&mut self, source: DomId, dest: DomId) -> Result<()> {
        if source == dest {
            return Ok(());
        }
        let children = self.children(source);
        let previous = self.children(dest);
        self.replace_children(dest, &children)?;
        // Text nodes are never cached by cells, so dropped ones can go.
        for old in previous {
            let is_text = self
                .node(old)
                .is_some_and(|node| matches!(node.kind, NodeKind::Text { .. }));
            if is_text && !children.contains(&old) {
                self.release(old);
            }
        }

        let attrs = self
            .node(source)
            .map(|node| node.attrs.clone())
            .ok_or_else(|| anyhow!("copy_node_into from a released node"))?;
        let dest_node = self
            .node_mut(dest)
            .ok_or_else(|| anyhow!("copy_node_into a released node"))?;
        dest_node.attrs = attrs;

        self.release(source);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Content, Dom};

    #[test]
    fn replace_children_is_a_no_op_for_identical_lists() {
        let mut dom = Dom::new();
        let parent = dom.create_element("div");
        let first = dom.create_element("span");
        let second = dom.create_element("span");
        dom.replace_children(parent, &[first, second]).unwrap();
        dom.replace_children(parent, &[first, second]).unwrap();
        assert_eq!(dom.children(parent), vec![first, second]);

        dom.replace_children(parent, &[second, first]).unwrap();
        assert_eq!(dom.children(parent), vec![second, first]);
    }

    #[test]
    fn copy_node_into_keeps_destination_identity() {
        let mut dom = Dom::new();
        let body = dom.body();
        let dest = dom
            .make_element("div", &[("id", "x"), ("class", "old")], [Some(Content::from("before"))])
            .unwrap();
        dom.append_child(body, dest).unwrap();

        let source = dom
            .make_element("div", &[("id", "x"), ("style", "color:red")], [Some(Content::from("after"))])
            .unwrap();
        dom.copy_node_into(source, dest).unwrap();

        assert_eq!(dom.children(body), vec![dest]);
        assert_eq!(dom.text_content(dest), "after");
        assert_eq!(dom.get_attribute(dest, "class"), None);
        assert_eq!(dom.get_attribute(dest, "style"), Some("color:red"));
        assert!(!dom.is_live(source));
    }
}
