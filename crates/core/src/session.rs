//! Per-channel conversation context.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::{channel::Channel, context::ConversationContext};

/// Holds the most recent context returned by the conversation service for
/// each channel. Cloning shares the same slots.
///
/// Reads and writes are individually atomic but a turn is not: two turns
/// running at once on one channel both read the same prior context and the
/// later `record` wins.
#[derive(Clone, Debug, Default)]
pub struct SessionRelay {
    slots: Arc<RwLock<HashMap<Channel, ConversationContext>>>,
}

impl SessionRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context to send with the next turn on `channel`; `None` starts a fresh
    /// conversation.
    pub async fn context(&self, channel: Channel) -> Option<ConversationContext> {
        self.slots.read().await.get(&channel).cloned()
    }

    /// Replace the stored context for `channel` with the one from the latest
    /// reply. A reply without context clears the slot.
    pub async fn record(&self, channel: Channel, context: Option<ConversationContext>) {
        let mut slots = self.slots.write().await;
        match context {
            Some(context) => {
                slots.insert(channel, context);
            }
            None => {
                slots.remove(&channel);
            }
        }
    }
}
