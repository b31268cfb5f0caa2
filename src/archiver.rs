use std::sync::Arc;

use chrono::Local;
use tracing::{debug, error, info, warn};

use crate::error::ArchiveError;
use crate::extract;
use crate::platform::{Acknowledger, IncomingMessage};
use crate::row::LogRow;
use crate::sheets::SheetBackend;

/// Turns chat messages on one channel into sheet rows.
/// Platform-agnostic: receives IncomingMessage, writes through SheetBackend.
pub struct Archiver {
    sheet: Arc<dyn SheetBackend>,
    ack: Arc<dyn Acknowledger>,
    channel_id: u64,
    sheet_name: String,
    reaction: String,
}

impl Archiver {
    pub fn new(
        sheet: Arc<dyn SheetBackend>,
        ack: Arc<dyn Acknowledger>,
        channel_id: u64,
        sheet_name: String,
        reaction: String,
    ) -> Self {
        Self {
            sheet,
            ack,
            channel_id,
            sheet_name,
            reaction,
        }
    }

    pub fn on_ready(&self) {
        info!("Archiver active");
        info!("  Watching channel ID: {}", self.channel_id);
        info!("  Syncing to sheet: {}", self.sheet_name);
        info!("Listening for webhooks and messages");
    }

    /// Extract, map and append one message. Returns the row that was written.
    pub async fn handle(&self, msg: &IncomingMessage) -> Result<LogRow, ArchiveError> {
        let payload = extract::extract(&msg.content)?;
        info!("Valid JSON found, parsing data");

        let row = LogRow::from_payload(&payload, Local::now().naive_local())?;

        self.sheet
            .append_row(row.cells())
            .await
            .map_err(ArchiveError::Backend)?;

        Ok(row)
    }

    /// Leaf event handler: every outcome is logged, nothing propagates.
    pub async fn on_message(&self, msg: &IncomingMessage) {
        if msg.channel_id != self.channel_id {
            debug!("Ignoring message on channel {}", msg.channel_id);
            return;
        }

        info!(
            "New message from {} (webhook: {})",
            msg.author, msg.is_webhook
        );

        match self.handle(msg).await {
            Ok(row) => {
                info!(
                    "Data for '{}' (log {}) pushed to sheet",
                    row.item_label(),
                    row.log_id()
                );
                // Best effort: webhook-authored messages often reject reactions.
                if let Err(e) = self.ack.add_reaction(msg, &self.reaction).await {
                    debug!("Reaction skipped: {:#}", e);
                }
            }
            Err(ArchiveError::NoPayload) => info!("No JSON data found in this message"),
            Err(e @ (ArchiveError::Parse { .. } | ArchiveError::MalformedPayload(_))) => {
                warn!("{}", e)
            }
            Err(e @ ArchiveError::Backend(_)) => error!("{}", e),
        }
    }
}
