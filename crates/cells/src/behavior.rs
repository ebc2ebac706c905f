//! The capability interface concrete cell types implement.

use anyhow::Result;
use dom::DomId;
use serde_json::Value;

use crate::context::{BuildContext, CellContext};
use crate::error::FrameError;

/// Logic of one concrete cell type. The tree owns one boxed behaviour per
/// live cell and hands it a context for every call, so behaviours never hold
/// references to other cells.
pub trait CellBehavior {
    /// Produce this cell's element, rendering children through the slot
    /// helpers of [`BuildContext`]. Returning `None` means the cell has no
    /// DOM representation.
    ///
    /// # Errors
    /// The default fails with [`FrameError::Unimplemented`].
    fn build(&mut self, ctx: &mut BuildContext<'_>) -> Result<Option<DomId>> {
        Err(FrameError::Unimplemented {
            cell: ctx.identity().clone(),
            capability: "build",
        }
        .into())
    }

    /// Called once, after the frame that created the cell has placed it.
    ///
    /// # Errors
    /// Failures abort the frame.
    fn on_first_installed(&mut self, _ctx: &mut CellContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Called when the cell is discarded, before it leaves the tree.
    ///
    /// # Errors
    /// Failures abort the frame.
    fn cell_will_unload(&mut self, _ctx: &mut CellContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Opaque payloads the server addressed to this cell.
    ///
    /// # Errors
    /// Failures abort the frame.
    fn handle_messages(&mut self, _ctx: &mut CellContext<'_>, _messages: &[Value]) -> Result<()> {
        Ok(())
    }

    /// The server considers this cell focused; move DOM focus to it.
    ///
    /// # Errors
    /// Failures abort the frame.
    fn server_knows_as_focused_cell(&mut self, _ctx: &mut CellContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Behaviour of cells whose rendering is entirely structural (pass-through
/// and sequence types). Every hook keeps its default.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralCell;

impl CellBehavior for StructuralCell {}
