use std::sync::Arc;

use parley_agent::{ConversationRuntime, Exchange, HttpConversationService, WorkspaceSource};
use parley_core::config::{AppConfig, LoadOptions};
use parley_core::{shape, MessageInput, ServiceReply};
use serde::Serialize;

use crate::commands::CommandResult;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_RUNTIME: u8 = 3;
pub const EXIT_UPSTREAM: u8 = 4;

/// One turn against the configured conversation service, without a prior
/// context.
pub fn run(utterance: &str) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "ask",
                "config_validation",
                format!("configuration issue: {error}"),
                EXIT_CONFIG,
            );
        }
    };

    let service = match HttpConversationService::new(&config.conversation) {
        Ok(service) => service,
        Err(error) => {
            return CommandResult::failure(
                "ask",
                "client_init",
                format!("failed to build conversation client: {error}"),
                EXIT_RUNTIME,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "ask",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                EXIT_RUNTIME,
            );
        }
    };

    let conversation = ConversationRuntime::new(Arc::new(service), WorkspaceSource::default());
    runtime.block_on(ask(&conversation, utterance))
}

pub async fn ask(conversation: &ConversationRuntime, utterance: &str) -> CommandResult {
    match conversation.converse(MessageInput::text(utterance), None).await {
        Ok(Exchange::Replied(reply)) => render("answered", shape(reply)),
        Ok(Exchange::Unconfigured(reply)) => render("workspace not configured", reply),
        Err(error) => CommandResult::failure(
            "ask",
            "upstream",
            format!("conversation service failed with status {}: {error}", error.status),
            EXIT_UPSTREAM,
        ),
    }
}

fn render(summary: &str, reply: ServiceReply) -> CommandResult {
    let message = match reply.first_text() {
        Some(text) => format!("{summary}: {text}"),
        None => format!("{summary} without output text"),
    };
    with_reply(message, &reply)
}

fn with_reply(message: String, reply: &impl Serialize) -> CommandResult {
    match serde_json::to_value(reply) {
        Ok(reply) => CommandResult::success_with_reply("ask", message, Some(reply)),
        Err(error) => CommandResult::failure(
            "ask",
            "serialization",
            format!("failed to encode reply: {error}"),
            EXIT_RUNTIME,
        ),
    }
}

#[cfg(test)]
mod tests {
    use serde::{ser::Error as _, Serialize, Serializer};
    use serde_json::Value;

    use super::{with_reply, EXIT_RUNTIME};

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("reply holds a non-JSON value"))
        }
    }

    #[test]
    fn reply_encoding_failure_is_reported() {
        let result = with_reply("answered: hi".to_string(), &Unencodable);

        assert_eq!(result.exit_code, EXIT_RUNTIME);
        let payload: Value = serde_json::from_str(&result.output).expect("json output");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "serialization");
        assert!(payload["message"]
            .as_str()
            .unwrap_or_default()
            .contains("reply holds a non-JSON value"));
    }
}
