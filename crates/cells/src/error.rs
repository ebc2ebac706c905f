//! Typed root causes for frames that cannot be applied.
//!
//! Everything fallible in this crate returns [`anyhow::Result`]; protocol
//! violations are raised as a [`FrameError`] so callers can
//! `downcast_ref::<FrameError>()` to tell them apart from DOM or codec
//! failures.

use core::fmt;

use crate::identity::CellId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// A frame tried to create the root while one is live.
    RootAlreadyExists { root: CellId },
    /// A live cell was named as the child of a cell other than its parent.
    CellMoved {
        cell: CellId,
        from: Option<CellId>,
        to: CellId,
    },
    /// Creations that no update or creation referenced.
    UnusedCells { cells: Vec<CellId> },
    /// A child identity is neither live nor present in the create map.
    MissingDefinition { cell: CellId },
    UnknownCellType { cell: CellId, cell_type: String },
    UnknownPlugin { plugin: String },
    /// A structural primitive that this cell's kind does not provide.
    Unimplemented {
        cell: CellId,
        capability: &'static str,
    },
    /// A composite's cached slot element is no longer below its element.
    ChildNotInDom { parent: CellId, child: CellId },
    /// A sequence was told about a child change before it was ever built.
    NotInstalled { cell: CellId },
    /// A single child was requested from a list or map slot.
    SlotShape { cell: CellId, slot: String },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootAlreadyExists { root } => write!(f, "Page root {root} was already set"),
            Self::CellMoved { cell, from, to } => {
                let from = from.as_ref().map_or("<no parent>", CellId::as_str);
                write!(f, "Cell named {cell} attempted to move in the tree from {from} to {to}")
            }
            Self::UnusedCells { cells } => {
                let names: Vec<&str> = cells.iter().map(CellId::as_str).collect();
                write!(f, "Frame contained unused cell ids: [{}]", names.join(", "))
            }
            Self::MissingDefinition { cell } => {
                write!(f, "No cell with identity {cell} was provided")
            }
            Self::UnknownCellType { cell, cell_type } => {
                write!(f, "Cannot find Cell for Cell Type: {cell_type} (creating {cell})")
            }
            Self::UnknownPlugin { plugin } => {
                write!(f, "No plugin named {plugin} is available to install cell types")
            }
            Self::Unimplemented { cell, capability } => {
                write!(f, "{capability} not defined for cell {cell}")
            }
            Self::ChildNotInDom { parent, child } => {
                write!(f, "Cached element of child {child} is not inside the element of {parent}")
            }
            Self::NotInstalled { cell } => {
                write!(f, "Can't call 'childChanged' on cell {cell} that was not installed")
            }
            Self::SlotShape { cell, slot } => {
                write!(f, "Slot {slot} of cell {cell} does not hold a single child")
            }
        }
    }
}

impl std::error::Error for FrameError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_cells() {
        let moved = FrameError::CellMoved {
            cell: CellId::from("a"),
            from: Some(CellId::from("p1")),
            to: CellId::from("p2"),
        };
        assert_eq!(
            moved.to_string(),
            "Cell named a attempted to move in the tree from p1 to p2"
        );

        let unused = FrameError::UnusedCells {
            cells: vec![CellId::from("x"), CellId::from("y")],
        };
        assert_eq!(unused.to_string(), "Frame contained unused cell ids: [x, y]");
    }
}
