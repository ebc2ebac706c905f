use std::fmt;

use serde_json::{Map, Value, json};

use super::{Dom, DomId, DomNode, NodeKind};

const INDENT: usize = 2;

/// Attributes ordered by name so snapshots don't depend on insertion order.
fn attrs_by_name(node: &DomNode) -> Vec<(&str, &str)> {
    let mut pairs: Vec<(&str, &str)> = node
        .attrs
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    pairs.sort_unstable_by_key(|&(name, _)| name);
    pairs
}

fn snapshot(dom: &Dom, id: DomId) -> Value {
    let Some(node) = dom.node(id) else {
        return Value::Null;
    };
    let children = || -> Vec<Value> {
        dom.children(id)
            .into_iter()
            .map(|child| snapshot(dom, child))
            .filter(|value| !value.is_null())
            .collect()
    };
    match &node.kind {
        NodeKind::Document => json!({ "type": "document", "children": children() }),
        NodeKind::Element { tag } => {
            let attrs: Map<String, Value> = attrs_by_name(node)
                .into_iter()
                .map(|(name, value)| (name.to_owned(), Value::from(value)))
                .collect();
            json!({
                "type": "element",
                "tag": tag.to_ascii_lowercase(),
                "attrs": attrs,
                "children": children(),
            })
        }
        NodeKind::Text { text } => json!({ "type": "text", "text": text }),
    }
}

/// Markup-like outline, one node per line, children indented under their parent.
fn outline(dom: &Dom, id: DomId, depth: usize, out: &mut fmt::Formatter<'_>) -> fmt::Result {
    let Some(node) = dom.node(id) else {
        return Ok(());
    };
    let pad = depth * INDENT;
    let closing = match &node.kind {
        NodeKind::Text { text } => return writeln!(out, "{:pad$}\"{}\"", "", text.escape_debug()),
        NodeKind::Document => {
            writeln!(out, "{:pad$}#document", "")?;
            None
        }
        NodeKind::Element { tag } => {
            let tag = tag.to_ascii_lowercase();
            write!(out, "{:pad$}<{tag}", "")?;
            for (name, value) in attrs_by_name(node) {
                write!(out, " {name}=\"{}\"", value.escape_debug())?;
            }
            writeln!(out, ">")?;
            Some(tag)
        }
    };
    for child in dom.children(id) {
        outline(dom, child, depth + 1, out)?;
    }
    match closing {
        Some(tag) => writeln!(out, "{:pad$}</{tag}>", ""),
        None => Ok(()),
    }
}

/// Borrowed view that pretty prints one subtree.
pub struct Subtree<'dom> {
    dom: &'dom Dom,
    id: DomId,
}

impl fmt::Display for Subtree<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        outline(self.dom, self.id, 0, out)
    }
}

impl fmt::Debug for Dom {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        outline(self, self.root, 0, out)
    }
}

impl Dom {
    /// Deterministic JSON form of the subtree at `id`.
    ///
    /// Elements become `{type, tag, attrs, children}` with attributes keyed by
    /// name, text nodes `{type, text}` and the document `{type, children}`.
    pub fn to_json_value(&self, id: DomId) -> Value {
        snapshot(self, id)
    }

    /// Pretty JSON of the whole document.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(&self.to_json_value(self.root)).unwrap_or_else(|_| String::from("{}"))
    }

    /// Indented markup-like rendering of one subtree.
    pub fn subtree(&self, id: DomId) -> Subtree<'_> {
        Subtree { dom: self, id }
    }
}
