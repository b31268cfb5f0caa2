mod archiver;
mod config;
mod error;
mod extract;
mod platform;
mod row;
mod sheets;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::archiver::Archiver;
use crate::config::Config;
use crate::platform::discord::{self, DiscordReactor};
use crate::sheets::auth::{ServiceAccountKey, TokenProvider};
use crate::sheets::google::GoogleSheet;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sheetbridge=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Channel: {}", config.discord.channel_id);
    info!("  Sheet: {}", config.sheets.name);
    info!("  Credentials: {}", config.sheets.credentials_path.display());

    // Connect to the spreadsheet
    let http = reqwest::Client::new();
    let key = ServiceAccountKey::load(&config.sheets.credentials_path)?;
    let auth = TokenProvider::new(http.clone(), key)?;
    let sheet = GoogleSheet::open(
        http,
        auth,
        &config.sheets.name,
        config.sheets.spreadsheet_id.as_deref(),
    )
    .await
    .with_context(|| format!("Failed to open sheet '{}'", config.sheets.name))?;

    sheets::ensure_header(&sheet)
        .await
        .context("Failed to check sheet header")?;

    // Create shared services
    let discord_http = Arc::new(twilight_http::Client::new(config.discord.bot_token.clone()));
    let archiver = Arc::new(Archiver::new(
        Arc::new(sheet),
        Arc::new(DiscordReactor::new(discord_http)),
        config.discord.channel_id,
        config.sheets.name.clone(),
        config.discord.reaction.clone(),
    ));

    // Run the Discord gateway
    info!("Bridge is starting...");
    discord::run(config.discord.bot_token, archiver).await?;

    Ok(())
}
