use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};
use twilight_gateway::{Event, EventTypeFlags, Intents, Shard, ShardId, StreamExt as _};
use twilight_http::request::channel::reaction::RequestReactionType;
use twilight_http::Client as HttpClient;
use twilight_model::channel::Message;
use twilight_model::id::Id;

use crate::archiver::Archiver;
use crate::platform::{Acknowledger, IncomingMessage};

/// Reactions go through the REST API; webhook-authored messages may refuse them.
pub struct DiscordReactor {
    http: Arc<HttpClient>,
}

impl DiscordReactor {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Acknowledger for DiscordReactor {
    async fn add_reaction(&self, message: &IncomingMessage, emoji: &str) -> Result<()> {
        let channel_id = Id::new_checked(message.channel_id).context("Channel ID is zero")?;
        let message_id = Id::new_checked(message.message_id).context("Message ID is zero")?;

        self.http
            .create_reaction(
                channel_id,
                message_id,
                &RequestReactionType::Unicode { name: emoji },
            )
            .await
            .context("Failed to add reaction")?;
        Ok(())
    }
}

fn to_incoming(msg: &Message) -> IncomingMessage {
    IncomingMessage {
        channel_id: msg.channel_id.get(),
        message_id: msg.id.get(),
        author: msg.author.name.clone(),
        content: msg.content.clone(),
        is_webhook: msg.webhook_id.is_some(),
    }
}

/// Run the Discord gateway loop.
///
/// Events are handled one at a time: each message is archived to completion
/// before the next event is pulled from the shard.
pub async fn run(bot_token: String, archiver: Arc<Archiver>) -> Result<()> {
    // Webhook posts carry their payload in `content`, which needs the privileged intent.
    let intents = Intents::GUILD_MESSAGES | Intents::MESSAGE_CONTENT;
    let mut shard = Shard::new(ShardId::ONE, bot_token, intents);
    let wanted = EventTypeFlags::READY | EventTypeFlags::MESSAGE_CREATE;

    info!("Starting Discord gateway...");

    while let Some(item) = shard.next_event(wanted).await {
        let event = match item {
            Ok(event) => event,
            Err(e) => {
                warn!("Error receiving gateway event: {}", e);
                continue;
            }
        };

        match event {
            Event::Ready(ready) => {
                debug!("Gateway ready as {}", ready.user.name);
                archiver.on_ready();
            }
            Event::MessageCreate(msg) => {
                archiver.on_message(&to_incoming(&msg)).await;
            }
            _ => {}
        }
    }

    info!("Discord gateway closed");
    Ok(())
}
