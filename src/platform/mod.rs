pub mod discord;

use anyhow::Result;
use async_trait::async_trait;

/// A message received from the chat platform
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Channel the message was posted in
    pub channel_id: u64,
    /// Platform message ID, used to address reactions
    pub message_id: u64,
    /// Display name of the author (the webhook name for webhook posts)
    pub author: String,
    /// The raw message text
    pub content: String,
    /// True when the message was posted through a channel webhook
    pub is_webhook: bool,
}

/// Reacts to a source message once its payload has been archived.
#[async_trait]
pub trait Acknowledger: Send + Sync {
    async fn add_reaction(&self, message: &IncomingMessage, emoji: &str) -> Result<()>;
}
