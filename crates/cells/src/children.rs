//! Named child slots.
//!
//! A slot holds a single identity, an arbitrarily nested list of them, or a
//! map of further slots. The same shape is used on the wire and in the tree:
//! cells never hold each other directly, they hold identities that the
//! [`CellTree`](crate::CellTree) resolves when needed. Slots keep the order
//! they arrived in.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::identity::CellId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChildRef {
    Cell(CellId),
    List(Vec<ChildRef>),
    Map(IndexMap<String, ChildRef>),
}

pub type NamedChildren = IndexMap<String, ChildRef>;

impl ChildRef {
    pub fn cell(identity: impl Into<CellId>) -> Self {
        Self::Cell(identity.into())
    }

    pub fn list<I, C>(identities: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CellId>,
    {
        Self::List(identities.into_iter().map(|id| Self::Cell(id.into())).collect())
    }

    pub fn as_cell(&self) -> Option<&CellId> {
        match self {
            Self::Cell(identity) => Some(identity),
            Self::List(_) | Self::Map(_) => None,
        }
    }

    /// Every identity in the slot, depth first, in declaration order.
    pub fn identities(&self) -> Vec<&CellId> {
        let mut out = Vec::new();
        self.collect_into(&mut out);
        out
    }

    fn collect_into<'a>(&'a self, out: &mut Vec<&'a CellId>) {
        match self {
            Self::Cell(identity) => out.push(identity),
            Self::List(items) => {
                for item in items {
                    item.collect_into(out);
                }
            }
            Self::Map(entries) => {
                for entry in entries.values() {
                    entry.collect_into(out);
                }
            }
        }
    }
}

/// Every identity referenced by a set of slots, slot by slot.
pub fn all_identities(children: &NamedChildren) -> Vec<&CellId> {
    children.values().flat_map(ChildRef::identities).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_shapes_decode_into_nested_refs() {
        let children: NamedChildren = serde_json::from_value(json!({
            "content": "a",
            "elements": ["b", ["c", "d"]],
            "header": { "left": "e" },
        }))
        .unwrap();

        assert_eq!(children["content"], ChildRef::cell("a"));
        let ids: Vec<&str> = all_identities(&children).into_iter().map(CellId::as_str).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
        assert!(children["elements"].as_cell().is_none());
    }

    #[test]
    fn slots_keep_wire_order() {
        let wire = r#"{"zeta": "z", "alpha": ["a", "b"], "mid": {"y": "y", "x": "x"}}"#;
        let children: NamedChildren = serde_json::from_str(wire).unwrap();
        let names: Vec<&str> = children.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        let ids: Vec<&str> = all_identities(&children).into_iter().map(CellId::as_str).collect();
        assert_eq!(ids, vec!["z", "a", "b", "y", "x"]);
    }
}
