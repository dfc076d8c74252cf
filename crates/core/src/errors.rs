use serde_json::{json, Value};
use thiserror::Error;

/// An error body exactly as the provider sent it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderBody {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ProviderBody {
    pub fn json(value: &Value) -> Self {
        Self {
            content_type: Some("application/json".to_string()),
            bytes: value.to_string().into_bytes(),
        }
    }
}

/// A failed call to the conversation service. Never retried.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{message}")]
pub struct UpstreamError {
    /// HTTP status reported by the provider, or 500 when the failure carried
    /// none (transport errors, undecodable replies).
    pub status: u16,
    pub message: String,
    pub body: Option<ProviderBody>,
}

impl UpstreamError {
    pub const DEFAULT_STATUS: u16 = 500;

    pub fn transport(message: impl Into<String>) -> Self {
        Self { status: Self::DEFAULT_STATUS, message: message.into(), body: None }
    }

    /// Build the error from a non-success HTTP response. The body is kept
    /// byte for byte; it is only parsed to find a readable message.
    pub fn from_response(status: u16, content_type: Option<&str>, raw_body: &[u8]) -> Self {
        let status = if status == 0 { Self::DEFAULT_STATUS } else { status };
        let message = provider_message(raw_body)
            .unwrap_or_else(|| format!("conversation service returned status {status}"));
        let body = (!raw_body.is_empty()).then(|| ProviderBody {
            content_type: content_type.map(str::to_string),
            bytes: raw_body.to_vec(),
        });

        Self { status, message, body }
    }

    /// Body to hand back to the web client: the provider's own body, or a
    /// minimal `{error, code}` JSON object when there was none.
    pub fn client_body(&self) -> ProviderBody {
        self.body.clone().unwrap_or_else(|| {
            ProviderBody::json(&json!({ "error": self.message, "code": self.status }))
        })
    }
}

fn provider_message(raw_body: &[u8]) -> Option<String> {
    match serde_json::from_slice::<Value>(raw_body) {
        Ok(Value::Object(fields)) => ["error", "message", "description"]
            .iter()
            .filter_map(|key| fields.get(*key))
            .find_map(|value| value.as_str().map(str::to_string)),
        Ok(Value::String(text)) => non_blank(&text),
        Ok(_) => None,
        Err(_) => non_blank(&String::from_utf8_lossy(raw_body)),
    }
}

fn non_blank(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Why a voice-channel turn could not produce something to say.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RelayError {
    #[error("no utterance found in request")]
    UtteranceMissing,
    #[error("conversation service returned no output text")]
    NoOutputText,
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl RelayError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::UtteranceMissing => "bad_request",
            Self::NoOutputText => "empty_reply",
            Self::Upstream(_) => "upstream",
        }
    }
}
