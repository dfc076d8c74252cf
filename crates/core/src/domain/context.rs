use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque state the conversation service hands back on every reply and
/// expects verbatim on the next turn.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationContext(pub Map<String, Value>);

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Identifier the service assigns to a conversation, if it sent one.
    pub fn conversation_id(&self) -> Option<&str> {
        self.0.get("conversation_id").and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for ConversationContext {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}
