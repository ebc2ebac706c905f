use anyhow::Result;
use dom::{Content, DomId};

use crate::behavior::CellBehavior;
use crate::context::BuildContext;

/// Lays out array slot `elements` as a single bootstrap row.
#[derive(Debug, Default, Clone, Copy)]
pub struct Columns;

impl CellBehavior for Columns {
    fn build(&mut self, ctx: &mut BuildContext<'_>) -> Result<Option<DomId>> {
        let columns = ctx.render_children_named("elements")?;
        let identity = ctx.identity().clone();
        let element_id = ctx.element_id();
        let dom = ctx.dom();
        let row = dom.make_element(
            "div",
            &[("class", "row flex-nowrap")],
            columns.into_iter().map(|column| Some(Content::from(column))),
        )?;
        let element = dom.make_element(
            "div",
            &[
                ("class", "cell container-fluid"),
                ("id", element_id.as_str()),
                ("data-cell-id", identity.as_str()),
                ("data-cell-type", "Columns"),
            ],
            [Some(Content::from(row))],
        )?;
        Ok(Some(element))
    }
}
