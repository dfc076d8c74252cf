use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::context::ConversationContext;

/// A candidate intent ranked by the conversation service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// Intent label, e.g. `greeting`.
    pub intent: String,
    pub confidence: f64,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Intent {
    pub fn new(intent: impl Into<String>, confidence: f64) -> Self {
        Self { intent: intent.into(), confidence, other: Map::new() }
    }
}

/// `output.text` arrives from the service as a list of lines; once the relay
/// composes its own text it is a single string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputText {
    Single(String),
    Lines(Vec<String>),
}

impl OutputText {
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(text) => Some(text.as_str()),
            Self::Lines(lines) => lines.first().map(String::as_str),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Output {
    #[serde(default)]
    pub text: Option<OutputText>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Reply of the conversation service. Fields the relay does not interpret
/// are kept in `other` so the web client sees the reply unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intents: Option<Vec<Intent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Output>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ConversationContext>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// A reply after response shaping; `output` is always present.
pub type ShapedResponse = ServiceReply;

impl ServiceReply {
    /// A reply carrying only `output.text`.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            output: Some(Output { text: Some(OutputText::Single(text.into())), ..Output::default() }),
            ..Self::default()
        }
    }

    pub fn top_intent(&self) -> Option<&Intent> {
        self.intents.as_deref().and_then(<[Intent]>::first)
    }

    /// First line of output text, the part voice channels speak.
    pub fn first_text(&self) -> Option<&str> {
        self.output.as_ref().and_then(|output| output.text.as_ref()).and_then(OutputText::first)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{OutputText, ServiceReply};

    #[test]
    fn upstream_reply_keeps_unknown_fields() {
        let raw = json!({
            "input": { "text": "hello" },
            "intents": [{ "intent": "greeting", "confidence": 0.91 }],
            "entities": [],
            "output": { "text": ["Hi there", "How can I help?"], "nodes_visited": ["node_1"] },
            "context": { "conversation_id": "c-1" }
        });

        let reply: ServiceReply = serde_json::from_value(raw.clone()).expect("reply should parse");

        assert_eq!(reply.top_intent().map(|intent| intent.intent.as_str()), Some("greeting"));
        assert_eq!(reply.first_text(), Some("Hi there"));
        assert_eq!(reply.context.as_ref().and_then(|c| c.conversation_id()), Some("c-1"));
        assert_eq!(serde_json::to_value(&reply).expect("serialize"), raw);
    }

    #[test]
    fn null_output_is_treated_as_absent() {
        let reply: ServiceReply =
            serde_json::from_value(json!({ "output": null, "intents": [] })).expect("parse");

        assert!(reply.output.is_none());
        assert!(reply.top_intent().is_none());
        assert_eq!(reply.first_text(), None);
    }

    #[test]
    fn with_text_builds_single_string_output() {
        let reply = ServiceReply::with_text("configure me");

        assert_eq!(reply.first_text(), Some("configure me"));
        assert_eq!(
            serde_json::to_value(&reply).expect("serialize"),
            json!({ "output": { "text": "configure me" } })
        );
    }

    #[test]
    fn empty_line_list_has_no_first_text() {
        assert_eq!(OutputText::Lines(Vec::new()).first(), None);
    }
}
