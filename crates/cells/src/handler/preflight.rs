//! Dry run of a frame's structural checks against the live tree.

use std::collections::{BTreeSet, HashSet};

use anyhow::Result;

use crate::children::all_identities;
use crate::error::FrameError;
use crate::frame::Frame;
use crate::identity::{CellId, ROOT_CELL_ID};
use crate::registry::CellRegistry;
use crate::tree::{CellNode, CellTree};

/// Walks the same resolution order as the real apply, tracking which cells
/// would be created and which would have lost their parent, without
/// touching the tree.
pub(super) struct Preflight<'frame> {
    tree: &'frame CellTree,
    registry: &'frame CellRegistry,
    frame: &'frame Frame,
    discarded: HashSet<&'frame CellId>,
    pending: BTreeSet<&'frame CellId>,
    instantiated: HashSet<&'frame CellId>,
}

impl<'frame> Preflight<'frame> {
    pub(super) fn check(tree: &'frame CellTree, registry: &'frame CellRegistry, frame: &'frame Frame) -> Result<()> {
        let mut preflight = Self {
            tree,
            registry,
            frame,
            discarded: frame
                .nodes_to_discard
                .iter()
                .filter(|id| tree.contains(id.as_str()))
                .collect(),
            pending: frame.nodes_created.keys().collect(),
            instantiated: HashSet::new(),
        };

        if let Some((root, _)) = frame.nodes_created.get_key_value(ROOT_CELL_ID) {
            if tree.contains(ROOT_CELL_ID) {
                return Err(FrameError::RootAlreadyExists { root: root.clone() }.into());
            }
            preflight.create(root)?;
        }

        // Cells created earlier in the frame are updatable, like in the real apply.
        for (id, update) in &frame.nodes_updated {
            if !preflight.is_live(id) || preflight.discarded.contains(id) {
                continue;
            }
            for child in all_identities(&update.children) {
                preflight.resolve(id, child)?;
            }
        }

        if !preflight.pending.is_empty() {
            return Err(FrameError::UnusedCells {
                cells: preflight.pending.iter().map(|id| (*id).clone()).collect(),
            }
            .into());
        }
        Ok(())
    }

    fn is_live(&self, id: &CellId) -> bool {
        self.instantiated.contains(id) || self.tree.contains(id.as_str())
    }

    /// Parent as the real apply would see it: discarded cells were detached
    /// and fresh cells are not wired until later.
    fn parent_of(&self, id: &CellId) -> Option<&'frame CellId> {
        if self.discarded.contains(id) || self.instantiated.contains(id) {
            return None;
        }
        let tree: &'frame CellTree = self.tree;
        tree.cell(id.as_str()).and_then(CellNode::parent)
    }

    fn resolve(&mut self, parent: &CellId, child: &'frame CellId) -> Result<()> {
        if self.is_live(child) {
            let from = self.parent_of(child);
            if from != Some(parent) {
                return Err(FrameError::CellMoved {
                    cell: child.clone(),
                    from: from.cloned(),
                    to: parent.clone(),
                }
                .into());
            }
            return Ok(());
        }
        self.create(child)
    }

    fn create(&mut self, id: &'frame CellId) -> Result<()> {
        if !self.pending.remove(id) {
            return Err(FrameError::MissingDefinition { cell: id.clone() }.into());
        }
        let frame: &'frame Frame = self.frame;
        let Some(definition) = frame.nodes_created.get(id.as_str()) else {
            return Err(FrameError::MissingDefinition { cell: id.clone() }.into());
        };
        if !self.registry.contains(&definition.cell_type) {
            return Err(FrameError::UnknownCellType {
                cell: id.clone(),
                cell_type: definition.cell_type.clone(),
            }
            .into());
        }
        for child in all_identities(&definition.children) {
            self.resolve(id, child)?;
        }
        self.instantiated.insert(id);
        Ok(())
    }
}
