//! Conversation webhook for the voice assistant (conversation API v2 JSON).

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use parley_core::{Channel, RelayError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::app::{correlation_id, AppState};

/// Spoken when a turn fails, whatever the cause.
pub const FAILURE_TEXT: &str = "Error Found. Could not connect to Watson";
pub const TEXT_INTENT: &str = "actions.intent.TEXT";
pub const API_VERSION_HEADER: &str = "google-assistant-api-version";

#[derive(Debug, Default, Deserialize)]
pub struct AssistantRequest {
    #[serde(default)]
    pub inputs: Vec<AssistantInput>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantInput {
    #[serde(default)]
    pub raw_inputs: Vec<RawInput>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawInput {
    #[serde(default)]
    pub query: Option<String>,
}

impl AssistantRequest {
    /// Reads a webhook body. A body of the wrong shape is `None` and is
    /// answered like any other failed turn.
    pub fn from_body(payload: Result<Json<Value>, JsonRejection>) -> Option<Self> {
        let Json(body) = payload.ok()?;
        serde_json::from_value(body).ok()
    }

    /// What the user said, as transcribed by the assistant.
    pub fn raw_input(&self) -> Option<&str> {
        self.inputs.first()?.raw_inputs.first()?.query.as_deref()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantResponse {
    pub expect_user_response: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_inputs: Option<Vec<ExpectedInput>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_response: Option<FinalResponse>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedInput {
    pub input_prompt: InputPrompt,
    pub possible_intents: Vec<PossibleIntent>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputPrompt {
    pub rich_initial_prompt: RichResponse,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalResponse {
    pub rich_response: RichResponse,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RichResponse {
    pub items: Vec<RichItem>,
}

impl RichResponse {
    fn speech(text: String) -> Self {
        Self { items: vec![RichItem { simple_response: SimpleResponse { text_to_speech: text } }] }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RichItem {
    pub simple_response: SimpleResponse,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleResponse {
    pub text_to_speech: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PossibleIntent {
    pub intent: String,
}

impl AssistantResponse {
    /// Speak `text` and wait for the user's next utterance.
    pub fn ask(text: impl Into<String>) -> Self {
        Self {
            expect_user_response: true,
            expected_inputs: Some(vec![ExpectedInput {
                input_prompt: InputPrompt { rich_initial_prompt: RichResponse::speech(text.into()) },
                possible_intents: vec![PossibleIntent { intent: TEXT_INTENT.to_string() }],
            }]),
            final_response: None,
        }
    }

    /// Speak `text` and close the conversation.
    pub fn tell(text: impl Into<String>) -> Self {
        Self {
            expect_user_response: false,
            expected_inputs: None,
            final_response: Some(FinalResponse { rich_response: RichResponse::speech(text.into()) }),
        }
    }
}

pub async fn assistant_turn(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> impl IntoResponse {
    let correlation_id = correlation_id();
    let request = AssistantRequest::from_body(payload);
    let result = match request.as_ref().and_then(AssistantRequest::raw_input) {
        Some(utterance) => state.spoken_reply(Channel::Assistant, utterance, &correlation_id).await,
        None => Err(RelayError::UtteranceMissing),
    };

    let response = match result {
        Ok(text) => {
            info!(
                event_name = "relay.assistant.replied",
                correlation_id = %correlation_id,
                channel = %Channel::Assistant,
                "assistant turn answered"
            );
            AssistantResponse::ask(text)
        }
        Err(error) => {
            warn!(
                event_name = "relay.assistant.failed",
                correlation_id = %correlation_id,
                channel = %Channel::Assistant,
                error_class = error.error_class(),
                error = %error,
                "assistant turn failed"
            );
            AssistantResponse::tell(FAILURE_TEXT)
        }
    };

    ([(API_VERSION_HEADER, "v2")], Json(response))
}

pub async fn assistant_liveness() -> StatusCode {
    info!(event_name = "relay.assistant.liveness", "assistant webhook checked");
    StatusCode::OK
}
