use std::sync::Arc;

use parley_core::{ConversationContext, MessageInput, MessageRequest, ServiceReply, UpstreamError};
use tracing::{debug, warn};

use crate::service::ConversationService;
use crate::workspace::{WorkspaceSource, CONFIGURATION_INSTRUCTIONS};

/// Outcome of one `converse` call that did not fail.
#[derive(Clone, Debug, PartialEq)]
pub enum Exchange {
    /// The service answered.
    Replied(ServiceReply),
    /// No workspace is configured. The service was not called and the reply
    /// only carries setup instructions.
    Unconfigured(ServiceReply),
}

impl Exchange {
    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Replied(_))
    }

    pub fn reply(&self) -> &ServiceReply {
        match self {
            Self::Replied(reply) | Self::Unconfigured(reply) => reply,
        }
    }

    pub fn into_reply(self) -> ServiceReply {
        match self {
            Self::Replied(reply) | Self::Unconfigured(reply) => reply,
        }
    }
}

pub struct ConversationRuntime {
    service: Arc<dyn ConversationService>,
    workspace: WorkspaceSource,
}

impl ConversationRuntime {
    pub fn new(service: Arc<dyn ConversationService>, workspace: WorkspaceSource) -> Self {
        Self { service, workspace }
    }

    pub fn workspace_id(&self) -> Option<String> {
        self.workspace.resolve()
    }

    /// Send one turn to the conversation service.
    ///
    /// Short-circuits with setup instructions when no workspace is configured.
    /// Failures are returned as-is; nothing here retries.
    pub async fn converse(
        &self,
        input: MessageInput,
        context: Option<ConversationContext>,
    ) -> Result<Exchange, UpstreamError> {
        let Some(workspace_id) = self.workspace.resolve() else {
            warn!(
                event_name = "conversation.workspace.unconfigured",
                "no workspace configured; returning setup instructions"
            );
            return Ok(Exchange::Unconfigured(ServiceReply::with_text(CONFIGURATION_INSTRUCTIONS)));
        };

        let request = MessageRequest::new(workspace_id, input, context);
        debug!(
            event_name = "conversation.message.sent",
            workspace_id = %request.workspace_id,
            has_context = request.context.is_some(),
            "sending turn to conversation service"
        );

        match self.service.message(&request).await {
            Ok(reply) => Ok(Exchange::Replied(reply)),
            Err(error) => {
                warn!(
                    event_name = "conversation.message.failed",
                    workspace_id = %request.workspace_id,
                    status = error.status,
                    error = %error,
                    "conversation service call failed"
                );
                Err(error)
            }
        }
    }
}
