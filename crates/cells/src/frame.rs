//! Wire format of inbound messages.

use anyhow::{Context as _, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::children::NamedChildren;
use crate::identity::CellId;

/// Arbitrary per-cell data, replaced wholesale on update.
pub type Props = serde_json::Map<String, Value>;

/// JavaScript-style truthiness of a prop value: `null`, `false`, `0` and the
/// empty string are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n.abs() > 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a prop value as text: strings verbatim, anything else as JSON.
pub fn prop_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// `[pluginName, css]`: installs the cell types of a linked plugin and adds
/// the stylesheet to the document head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDefinition(pub String, pub String);

impl TypeDefinition {
    pub fn plugin(&self) -> &str {
        &self.0
    }

    pub fn css(&self) -> &str {
        &self.1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedCell {
    pub cell_type: String,
    #[serde(default)]
    pub parent: Option<CellId>,
    #[serde(default)]
    pub children: NamedChildren,
    #[serde(default)]
    pub extra_data: Props,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdatedCell {
    pub children: NamedChildren,
    pub extra_data: Props,
}

/// One atomic batch of tree mutations plus messages. The maps keep the order
/// the server wrote them in; creation, update and delivery follow it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Frame {
    pub dynamic_cell_type_definitions: Vec<TypeDefinition>,
    pub nodes_to_discard: Vec<CellId>,
    pub nodes_created: IndexMap<CellId, CreatedCell>,
    pub nodes_updated: IndexMap<CellId, UpdatedCell>,
    pub messages: IndexMap<CellId, Vec<Value>>,
    pub focused_cell_id: Option<CellId>,
    pub focused_cell_event_id: Option<u64>,
}

impl Frame {
    /// Number of cells created or updated.
    pub fn update_count(&self) -> usize {
        self.nodes_created.len() + self.nodes_updated.len()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionIdMessage {
    session_id: String,
}

/// A decoded inbound message, routed on its `type` field.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Frame(Box<Frame>),
    SessionId(String),
    Unknown(Value),
}

impl InboundMessage {
    /// # Errors
    /// Returns an error when a known message type has a malformed body.
    pub fn from_value(value: Value) -> Result<Self> {
        match value.get("type").and_then(Value::as_str) {
            Some("#frame") => {
                let frame: Frame = serde_json::from_value(value).context("decoding #frame message")?;
                Ok(Self::Frame(Box::new(frame)))
            }
            Some("#sessionId") => {
                let message: SessionIdMessage =
                    serde_json::from_value(value).context("decoding #sessionId message")?;
                Ok(Self::SessionId(message.session_id))
            }
            _ => Ok(Self::Unknown(value)),
        }
    }

    /// # Errors
    /// Returns an error when `text` is not JSON or a known message is malformed.
    pub fn from_text(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).context("inbound message is not JSON")?;
        Self::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_frame_fields_default() {
        let message = InboundMessage::from_value(json!({ "type": "#frame" })).unwrap();
        let InboundMessage::Frame(frame) = message else {
            panic!("expected a frame");
        };
        assert_eq!(*frame, Frame::default());
    }

    #[test]
    fn session_and_unknown_messages_are_routed() {
        let message = InboundMessage::from_value(json!({ "type": "#sessionId", "sessionId": "s1" })).unwrap();
        assert_eq!(message, InboundMessage::SessionId("s1".to_owned()));

        let odd = json!({ "type": "#nope" });
        assert_eq!(
            InboundMessage::from_value(odd.clone()).unwrap(),
            InboundMessage::Unknown(odd)
        );
    }
}
