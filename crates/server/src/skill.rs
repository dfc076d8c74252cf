use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use parley_core::{Channel, RelayError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::app::{correlation_id, AppState};

/// Catch-all slot the skill model routes the whole utterance into.
pub const UTTERANCE_SLOT: &str = "EveryThingSlot";

#[derive(Debug, Default, Deserialize)]
pub struct SkillRequest {
    #[serde(default)]
    pub request: Option<SkillRequestBody>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SkillRequestBody {
    #[serde(default)]
    pub intent: Option<SkillIntent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SkillIntent {
    #[serde(default)]
    pub slots: HashMap<String, SkillSlot>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SkillSlot {
    #[serde(default)]
    pub value: Option<String>,
}

impl SkillRequest {
    /// Reads a skill body; unparseable or mistyped bodies (`"slots": null`,
    /// a numeric `value`) yield `None`.
    pub fn from_body(payload: Result<Json<Value>, JsonRejection>) -> Option<Self> {
        let Json(body) = payload.ok()?;
        serde_json::from_value(body).ok()
    }

    pub fn utterance(&self) -> Option<&str> {
        self.request
            .as_ref()?
            .intent
            .as_ref()?
            .slots
            .get(UTTERANCE_SLOT)?
            .value
            .as_deref()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SkillResponse {
    pub version: &'static str,
    pub response: SkillResponseBody,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillResponseBody {
    pub should_end_session: bool,
    pub output_speech: OutputSpeech,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OutputSpeech {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl SkillResponse {
    fn new(text: impl Into<String>, should_end_session: bool) -> Self {
        Self {
            version: "1.0",
            response: SkillResponseBody {
                should_end_session,
                output_speech: OutputSpeech { kind: "PlainText", text: text.into() },
            },
        }
    }

    /// Speak and keep the session open for the next utterance.
    pub fn speak(text: impl Into<String>) -> Self {
        Self::new(text, false)
    }

    pub fn end_with(text: impl Into<String>) -> Self {
        Self::new(text, true)
    }
}

pub async fn skill_turn(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Json<SkillResponse> {
    let correlation_id = correlation_id();
    let request = SkillRequest::from_body(payload);
    let result = match request.as_ref().and_then(SkillRequest::utterance) {
        Some(utterance) => state.spoken_reply(Channel::Web, utterance, &correlation_id).await,
        None => Err(RelayError::UtteranceMissing),
    };

    match result {
        Ok(text) => {
            info!(
                event_name = "relay.skill.replied",
                correlation_id = %correlation_id,
                channel = %Channel::Web,
                "skill turn answered"
            );
            Json(SkillResponse::speak(text))
        }
        Err(error) => {
            warn!(
                event_name = "relay.skill.failed",
                correlation_id = %correlation_id,
                channel = %Channel::Web,
                error_class = error.error_class(),
                error = %error,
                "skill turn failed"
            );
            Json(SkillResponse::end_with(error.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, Json};
    use parley_core::{Channel, ServiceReply, UpstreamError};
    use serde_json::{json, Value};

    use super::{skill_turn, SkillRequest, SkillResponse};
    use crate::app::testing::configured;

    fn request_with(value: Value) -> SkillRequest {
        SkillRequest::from_body(Ok(Json(value))).expect("skill request")
    }

    fn hello() -> Value {
        json!({
            "request": { "intent": { "slots": { "EveryThingSlot": { "value": "hello" } } } }
        })
    }

    #[test]
    fn utterance_comes_from_catch_all_slot() {
        assert_eq!(request_with(hello()).utterance(), Some("hello"));
        assert_eq!(request_with(json!({})).utterance(), None);
        assert_eq!(
            request_with(json!({
                "request": { "intent": { "slots": { "OtherSlot": { "value": "hello" } } } }
            }))
            .utterance(),
            None
        );
    }

    #[test]
    fn envelope_uses_plain_text_speech() {
        let rendered = serde_json::to_value(SkillResponse::end_with("bye")).expect("serialize");

        assert_eq!(
            rendered,
            json!({
                "version": "1.0",
                "response": {
                    "shouldEndSession": true,
                    "outputSpeech": { "type": "PlainText", "text": "bye" }
                }
            })
        );
    }

    #[tokio::test]
    async fn first_output_line_is_spoken() {
        let reply: ServiceReply = serde_json::from_value(json!({
            "output": { "text": ["Hello there", "second line"] },
            "context": { "conversation_id": "c-7" }
        }))
        .expect("reply");
        let (state, service) = configured(vec![Ok(reply)]);

        let Json(response) = skill_turn(State(state.clone()), Ok(Json(hello()))).await;

        assert_eq!(response, SkillResponse::speak("Hello there"));
        assert_eq!(service.requests()[0].input.utterance(), Some("hello"));
        assert!(state.sessions.context(Channel::Web).await.is_some());
    }

    #[tokio::test]
    async fn upstream_failure_ends_session_with_message() {
        let (state, _) = configured(vec![Err(UpstreamError::transport("connection refused"))]);

        let Json(response) = skill_turn(State(state.clone()), Ok(Json(hello()))).await;

        assert_eq!(response, SkillResponse::end_with("connection refused"));
        assert_eq!(state.sessions.context(Channel::Web).await, None, "failures record nothing");
    }

    #[tokio::test]
    async fn missing_slot_is_answered_without_calling_upstream() {
        let (state, service) = configured(Vec::new());

        let Json(response) = skill_turn(State(state), Ok(Json(json!({})))).await;

        assert_eq!(response, SkillResponse::end_with("no utterance found in request"));
        assert!(service.requests().is_empty());
    }

    #[test]
    fn mistyped_slots_are_not_a_request() {
        let null_slots = json!({ "request": { "intent": { "slots": null } } });
        assert!(SkillRequest::from_body(Ok(Json(null_slots))).is_none());
        assert!(SkillRequest::from_body(Ok(Json(json!([1, 2])))).is_none());
    }

    #[tokio::test]
    async fn null_slots_end_the_session_without_calling_upstream() {
        let (state, service) = configured(Vec::new());
        let body = json!({ "request": { "intent": { "slots": null } } });

        let Json(response) = skill_turn(State(state), Ok(Json(body))).await;

        assert_eq!(response, SkillResponse::end_with("no utterance found in request"));
        assert!(service.requests().is_empty());
    }

    #[tokio::test]
    async fn reply_without_text_is_a_failure() {
        let (state, _) = configured(vec![Ok(ServiceReply::default())]);

        let Json(response) = skill_turn(State(state), Ok(Json(hello()))).await;

        assert_eq!(response, SkillResponse::end_with("conversation service returned no output text"));
    }
}
