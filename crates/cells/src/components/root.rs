use anyhow::Result;
use dom::{Content, DomId};

use crate::behavior::CellBehavior;
use crate::context::BuildContext;

/// The page root. Its element is the mount point, so a rebuild fills the
/// page in place.
#[derive(Debug, Default, Clone, Copy)]
pub struct RootCell;

impl CellBehavior for RootCell {
    fn build(&mut self, ctx: &mut BuildContext<'_>) -> Result<Option<DomId>> {
        let child = ctx.render_child_named("child")?;
        let identity = ctx.identity().clone();
        let element = ctx.dom().make_element(
            "div",
            &[
                ("id", identity.as_str()),
                ("data-cell-id", identity.as_str()),
                ("data-cell-type", "RootCell"),
                ("class", "allow-child-to-fill-space"),
            ],
            [child.map(Content::from)],
        )?;
        Ok(Some(element))
    }
}
