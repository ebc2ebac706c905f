use anyhow::Result;
use dom::{Content, DomId};

use crate::behavior::CellBehavior;
use crate::context::BuildContext;
use crate::frame::prop_text;

#[derive(Debug, Default, Clone, Copy)]
pub struct Span;

impl CellBehavior for Span {
    fn build(&mut self, ctx: &mut BuildContext<'_>) -> Result<Option<DomId>> {
        let text = ctx.prop("text").map(|value| Content::from(prop_text(value)));
        let identity = ctx.identity().clone();
        let element_id = ctx.element_id();
        let element = ctx.dom().make_element(
            "span",
            &[
                ("id", element_id.as_str()),
                ("data-cell-id", identity.as_str()),
                ("data-cell-type", "Span"),
                ("class", "cell"),
            ],
            [text],
        )?;
        Ok(Some(element))
    }
}
