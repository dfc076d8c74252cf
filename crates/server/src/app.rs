//! Relay routes.
//!
//! - `POST /`           : skill-style voice request (web channel context)
//! - `POST /google`     : voice-assistant webhook (assistant channel context)
//! - `GET  /google`     : liveness check, empty body
//! - `POST /api/message`: web client pass-through, client-held context
//! - `GET  /health`     : readiness report
//!
//! Any other `GET` is served from the static UI directory when one exists.

use std::path::Path;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use parley_agent::{ConversationRuntime, Exchange};
use parley_core::{
    shape, Channel, MessageInput, RelayError, SessionRelay, ShapedResponse, UpstreamError,
};
use tower_http::services::ServeDir;
use tracing::info;

use crate::{assistant, health, message, skill};

#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<ConversationRuntime>,
    pub sessions: SessionRelay,
}

impl AppState {
    pub fn new(runtime: ConversationRuntime) -> Self {
        Self { runtime: Arc::new(runtime), sessions: SessionRelay::new() }
    }

    /// One voice-channel turn: send the utterance with the channel's stored
    /// context, shape the reply and keep the context it returned.
    pub async fn relay_turn(
        &self,
        channel: Channel,
        utterance: &str,
        correlation_id: &str,
    ) -> Result<ShapedResponse, UpstreamError> {
        let context = self.sessions.context(channel).await;
        match self.runtime.converse(MessageInput::text(utterance), context).await? {
            Exchange::Replied(reply) => {
                let shaped = shape(reply);
                self.record_context(channel, &shaped, correlation_id).await;
                Ok(shaped)
            }
            Exchange::Unconfigured(reply) => Ok(reply),
        }
    }

    /// Like `relay_turn`, reduced to the first line of text to speak.
    pub async fn spoken_reply(
        &self,
        channel: Channel,
        utterance: &str,
        correlation_id: &str,
    ) -> Result<String, RelayError> {
        let reply = self.relay_turn(channel, utterance, correlation_id).await?;
        reply.first_text().map(str::to_string).ok_or(RelayError::NoOutputText)
    }

    async fn record_context(
        &self,
        channel: Channel,
        reply: &ShapedResponse,
        correlation_id: &str,
    ) {
        let conversation_id =
            reply.context.as_ref().and_then(|context| context.conversation_id()).unwrap_or("none");
        self.sessions.record(channel, reply.context.clone()).await;
        info!(
            event_name = "relay.session.recorded",
            correlation_id = %correlation_id,
            channel = %channel,
            conversation_id = %conversation_id,
            "conversation context recorded"
        );
    }
}

pub fn router(state: AppState, static_dir: Option<&Path>) -> Router {
    let static_dir = static_dir.filter(|dir| dir.is_dir());

    let mut root = post(skill::skill_turn);
    if let Some(dir) = static_dir {
        root = root.get_service(ServeDir::new(dir));
    }

    let router = Router::new()
        .route("/", root)
        .route("/google", post(assistant::assistant_turn).get(assistant::assistant_liveness))
        .route("/api/message", post(message::post_message))
        .route("/health", get(health::health))
        .with_state(state);

    match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    }
}

pub fn correlation_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
