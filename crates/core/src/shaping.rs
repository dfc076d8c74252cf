//! Intent-confidence response shaping.
//!
//! When the conversation service answers without an `output` block the relay
//! composes the text itself from the confidence of the top-ranked intent.

use crate::domain::reply::{Intent, Output, OutputText, ServiceReply, ShapedResponse};

/// Lowest confidence at which the relay states the intent outright.
pub const UNDERSTOOD_THRESHOLD: f64 = 0.75;
/// Lowest confidence at which the relay offers the intent as a guess.
pub const TENTATIVE_THRESHOLD: f64 = 0.5;

pub const NOT_UNDERSTOOD: &str = "I did not understand your intent";

/// Fill in `output.text` for replies that arrived without an `output` block.
///
/// A reply that already has `output` is returned untouched, even when that
/// output is empty. Without intents the text stays `None`.
pub fn shape(mut reply: ServiceReply) -> ShapedResponse {
    if reply.output.is_some() {
        return reply;
    }

    let text = reply.top_intent().map(confidence_message).map(OutputText::Single);
    reply.output = Some(Output { text, ..Output::default() });
    reply
}

fn confidence_message(intent: &Intent) -> String {
    if intent.confidence >= UNDERSTOOD_THRESHOLD {
        format!("I understood your intent was {}", intent.intent)
    } else if intent.confidence >= TENTATIVE_THRESHOLD {
        format!("I think your intent was {}", intent.intent)
    } else {
        NOT_UNDERSTOOD.to_string()
    }
}
