use anyhow::Result;
use dom::{Content, DomId};

use crate::behavior::CellBehavior;
use crate::context::BuildContext;

/// Lets slot `content` grow inside its sequence. The `flex-child` class is
/// what marks the enclosing sequence as a `flex-parent`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Flex;

impl CellBehavior for Flex {
    fn build(&mut self, ctx: &mut BuildContext<'_>) -> Result<Option<DomId>> {
        let content = ctx.render_child_named("content")?;
        let identity = ctx.identity().clone();
        let element_id = ctx.element_id();
        let element = ctx.dom().make_element(
            "div",
            &[
                ("id", element_id.as_str()),
                ("data-cell-id", identity.as_str()),
                ("data-cell-type", "Flex"),
                ("class", "allow-child-to-fill-space flex-child"),
            ],
            [content.map(Content::from)],
        )?;
        Ok(Some(element))
    }
}
