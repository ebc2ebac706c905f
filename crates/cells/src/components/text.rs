use anyhow::Result;
use dom::{Content, DomId};

use crate::behavior::CellBehavior;
use crate::context::{BuildContext, CellContext};
use crate::frame::{is_truthy, prop_text};

/// Focusable inline text with an optional colour.
#[derive(Debug, Default, Clone, Copy)]
pub struct Text;

impl CellBehavior for Text {
    fn build(&mut self, ctx: &mut BuildContext<'_>) -> Result<Option<DomId>> {
        let mut style = String::from("display:inline-block");
        if let Some(color) = ctx.prop("textColor").filter(|value| is_truthy(value)) {
            style.push_str(";color:");
            style.push_str(&prop_text(color));
        }
        let text = ctx
            .prop("rawText")
            .filter(|value| is_truthy(value))
            .map(|value| Content::from(prop_text(value)));
        let identity = ctx.identity().clone();
        let element_id = ctx.element_id();
        let element = ctx.dom().make_element(
            "div",
            &[
                ("class", "cell cell-focus-no-outline"),
                ("id", element_id.as_str()),
                ("style", style.as_str()),
                ("data-cell-id", identity.as_str()),
                ("data-cell-type", "Text"),
                ("tabindex", "0"),
            ],
            [text],
        )?;
        Ok(Some(element))
    }

    fn server_knows_as_focused_cell(&mut self, ctx: &mut CellContext<'_>) -> Result<()> {
        if let Some(element) = ctx.dom_element() {
            ctx.dom().focus(element);
        }
        Ok(())
    }
}
