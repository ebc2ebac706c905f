use anyhow::Result;
use dom::{Content, DomId};

use crate::behavior::CellBehavior;
use crate::context::BuildContext;

/// Wraps slot `child`; hidden while the slot is empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct Container;

impl CellBehavior for Container {
    fn build(&mut self, ctx: &mut BuildContext<'_>) -> Result<Option<DomId>> {
        let child = ctx.render_child_named("child")?;
        let style = if child.is_some() { "" } else { "display:none;" };
        let identity = ctx.identity().clone();
        let element_id = ctx.element_id();
        let element = ctx.dom().make_element(
            "div",
            &[
                ("id", element_id.as_str()),
                ("data-cell-id", identity.as_str()),
                ("data-cell-type", "Container"),
                ("class", "cell"),
                ("style", style),
            ],
            [child.map(Content::from)],
        )?;
        Ok(Some(element))
    }
}
