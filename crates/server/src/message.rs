use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use parley_agent::Exchange;
use parley_core::{shape, Channel, ConversationContext, MessageInput, ProviderBody};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::app::{correlation_id, AppState};

/// Body posted by the web client. The browser owns its conversation context
/// and sends it back on every turn, so nothing here touches the session slots.
#[derive(Debug, Default, PartialEq)]
pub struct WebMessage {
    pub context: ConversationContext,
    pub input: MessageInput,
}

impl WebMessage {
    /// `input` is forwarded whatever its shape; `context` must be an object.
    /// Missing or `null` fields default to `{}`.
    pub fn from_body(body: Value) -> Result<Self, String> {
        let mut fields = match body {
            Value::Object(fields) => fields,
            Value::Null => return Ok(Self::default()),
            _ => return Err("request body must be a JSON object".to_string()),
        };

        let input = match fields.remove("input") {
            None | Some(Value::Null) => MessageInput::default(),
            Some(value) => MessageInput(value),
        };
        let context = match fields.remove("context") {
            None | Some(Value::Null) => ConversationContext::new(),
            Some(Value::Object(context)) => context.into(),
            Some(_) => return Err("`context` must be a JSON object".to_string()),
        };

        Ok(Self { context, input })
    }
}

pub async fn post_message(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let correlation_id = correlation_id();
    let parsed = payload
        .map_err(|rejection| rejection.body_text())
        .and_then(|Json(body)| WebMessage::from_body(body));
    let message = match parsed {
        Ok(message) => message,
        Err(reason) => {
            warn!(
                event_name = "relay.message.rejected",
                correlation_id = %correlation_id,
                reason = %reason,
                "web message body rejected"
            );
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": reason, "code": 400 })))
                .into_response();
        }
    };

    match state.runtime.converse(message.input, Some(message.context)).await {
        Ok(Exchange::Unconfigured(reply)) => Json(reply).into_response(),
        Ok(Exchange::Replied(reply)) => {
            info!(
                event_name = "relay.message.replied",
                correlation_id = %correlation_id,
                channel = %Channel::Web,
                "web message answered"
            );
            Json(shape(reply)).into_response()
        }
        Err(error) => {
            warn!(
                event_name = "relay.message.failed",
                correlation_id = %correlation_id,
                channel = %Channel::Web,
                status = error.status,
                error = %error,
                "web message failed"
            );
            let status =
                StatusCode::from_u16(error.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            provider_response(status, error.client_body())
        }
    }
}

/// Replays the provider's error body without re-encoding it.
fn provider_response(status: StatusCode, body: ProviderBody) -> Response {
    let mut response = Response::new(Body::from(body.bytes));
    *response.status_mut() = status;
    if let Some(content_type) =
        body.content_type.and_then(|value| HeaderValue::from_str(&value).ok())
    {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    response
}
