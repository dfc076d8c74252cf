use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::context::ConversationContext;

/// The `input` of an outbound message. Voice channels only set `text`; the
/// web client's value is forwarded as sent, even when it is not an object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageInput(pub Value);

impl Default for MessageInput {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

impl MessageInput {
    pub fn text(utterance: impl Into<String>) -> Self {
        let mut input = Map::new();
        input.insert("text".to_string(), Value::String(utterance.into()));
        Self(Value::Object(input))
    }

    pub fn utterance(&self) -> Option<&str> {
        self.0.get("text").and_then(Value::as_str)
    }
}

/// Payload of one call to the conversation service.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MessageRequest {
    /// Carried in the request path, not the body.
    #[serde(skip)]
    pub workspace_id: String,
    pub input: MessageInput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ConversationContext>,
    pub alternate_intents: bool,
}

impl MessageRequest {
    pub fn new(
        workspace_id: impl Into<String>,
        input: MessageInput,
        context: Option<ConversationContext>,
    ) -> Self {
        Self { workspace_id: workspace_id.into(), input, context, alternate_intents: true }
    }
}
