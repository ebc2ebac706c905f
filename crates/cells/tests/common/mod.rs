#![allow(dead_code, reason = "each test binary uses a different subset of the helpers")]

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use cells::{
    BuildContext, CellBehavior, CellContext, CellHandler, CellInit, CellRegistry, ChannelTransport, ChildRef,
    Structure,
};
use dom::{Content, DomId};
use serde_json::{Value, json};
use tokio::sync::mpsc;

pub type Events = Rc<RefCell<Vec<String>>>;

/// Composite test cell: renders every slot in slot order and records its
/// lifecycle into a shared log. The messages `"swap"` and `"rebuild"` make it
/// replace its element or rebuild itself from inside the hook.
pub struct Probe {
    events: Events,
    builds: usize,
}

impl Probe {
    pub fn new(events: Events, init: &CellInit<'_>) -> Self {
        events.borrow_mut().push(format!("construct:{}", init.identity));
        Self { events, builds: 0 }
    }

    fn record(&self, event: String) {
        self.events.borrow_mut().push(event);
    }
}

impl CellBehavior for Probe {
    fn build(&mut self, ctx: &mut BuildContext<'_>) -> Result<Option<DomId>> {
        let slots: Vec<(String, bool)> = ctx
            .named_children()
            .iter()
            .map(|(name, child)| (name.clone(), matches!(child, ChildRef::Cell(_))))
            .collect();
        let mut rendered = Vec::new();
        for (name, single) in slots {
            if single {
                rendered.extend(ctx.render_child_named(&name)?);
            } else {
                rendered.extend(ctx.render_children_named(&name)?);
            }
        }
        self.builds += 1;
        let builds = self.builds.to_string();
        let label = ctx.prop_str("label").unwrap_or_default().to_owned();
        let identity = ctx.identity().clone();
        let element_id = ctx.element_id();
        let element = ctx.dom().make_element(
            "div",
            &[
                ("id", element_id.as_str()),
                ("data-cell-id", identity.as_str()),
                ("data-cell-type", "Probe"),
                ("data-label", label.as_str()),
                ("data-builds", builds.as_str()),
            ],
            rendered.into_iter().map(|child| Some(Content::from(child))),
        )?;
        Ok(Some(element))
    }

    fn on_first_installed(&mut self, ctx: &mut CellContext<'_>) -> Result<()> {
        self.record(format!("installed:{}", ctx.identity()));
        Ok(())
    }

    fn cell_will_unload(&mut self, ctx: &mut CellContext<'_>) -> Result<()> {
        self.record(format!("unload:{}", ctx.identity()));
        Ok(())
    }

    fn handle_messages(&mut self, ctx: &mut CellContext<'_>, messages: &[Value]) -> Result<()> {
        for message in messages {
            if message == "focus" {
                ctx.focus_received()?;
            } else if message == "rebuild" {
                ctx.request_rebuild();
            } else if message == "swap" {
                let identity = ctx.identity().clone();
                let swapped = ctx.dom().make_element(
                    "div",
                    &[("data-cell-id", identity.as_str()), ("data-label", "swapped")],
                    std::iter::empty(),
                )?;
                ctx.replace_dom_element(swapped)?;
            }
            self.record(format!("message:{}:{message}", ctx.identity()));
        }
        Ok(())
    }
}

pub fn register_probe(registry: &mut CellRegistry, tag: &str, events: &Events) {
    let events = Rc::clone(events);
    registry.register_cell_type(tag, Structure::Composite, move |init| {
        Box::new(Probe::new(Rc::clone(&events), init))
    });
}

pub fn probe_registry(events: &Events) -> CellRegistry {
    let mut registry = CellRegistry::with_builtin_cells();
    register_probe(&mut registry, "Probe", events);
    registry
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Handler with probe cells and a captured outbound channel.
pub fn handler_with_outbound(events: &Events) -> (CellHandler, mpsc::UnboundedReceiver<String>) {
    init_logging();
    let (transport, outbound) = ChannelTransport::channel();
    let handler = CellHandler::new(probe_registry(events)).with_transport(Rc::new(transport));
    (handler, outbound)
}

pub fn drain(outbound: &mut mpsc::UnboundedReceiver<String>) -> Vec<Value> {
    let mut sent = Vec::new();
    while let Ok(text) = outbound.try_recv() {
        if let Ok(value) = serde_json::from_str(&text) {
            sent.push(value);
        }
    }
    sent
}

/// `#frame` envelope around the given fields.
pub fn frame(fields: Value) -> Value {
    let mut message = json!({ "type": "#frame" });
    if let (Some(target), Value::Object(fields)) = (message.as_object_mut(), fields) {
        target.extend(fields);
    }
    message
}

pub fn created(cell_type: &str, parent: Option<&str>, children: Value, extra_data: Value) -> Value {
    json!({
        "cellType": cell_type,
        "parent": parent,
        "children": children,
        "extraData": extra_data,
    })
}

/// `page_root > a (Probe) > items [b, c] (Probe)`.
pub fn first_frame() -> Value {
    frame(json!({
        "nodesCreated": {
            "page_root": created("RootCell", None, json!({ "child": "a" }), json!({})),
            "a": created("Probe", Some("page_root"), json!({ "items": ["b", "c"] }), json!({ "label": "A" })),
            "b": created("Probe", Some("a"), json!({}), json!({ "label": "B" })),
            "c": created("Probe", Some("a"), json!({}), json!({ "label": "C" })),
        }
    }))
}

pub fn element(handler: &CellHandler, id: &str) -> Option<DomId> {
    handler.cell(id).and_then(cells::CellNode::dom_element)
}

/// `data-cell-id` of every child element of `parent`.
pub fn child_cell_ids(handler: &CellHandler, parent: DomId) -> Vec<String> {
    let dom = handler.dom();
    dom.children(parent)
        .into_iter()
        .filter_map(|child| dom.get_attribute(child, "data-cell-id").map(str::to_owned))
        .collect()
}

pub fn events(log: &Events) -> Vec<String> {
    log.borrow().clone()
}
