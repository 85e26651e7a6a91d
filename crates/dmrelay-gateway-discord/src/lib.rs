//! Discord gateway for dmrelay.
//!
//! Connects to Discord with serenity, relays direct messages through
//! [`dmrelay::RelayDispatcher`] and serves the owner-only `heel` command in
//! guild channels.

mod client;
mod download;
mod handler;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use serenity::all::{Client, GatewayIntents};
use tracing::info;

use dmrelay::{CommandTable, FileRelayStore, RelayStore};

pub use client::DiscordClient;
pub use download::AttachmentFetcher;
pub use handler::RelayHandler;

/// Settings for the Discord gateway.
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub token: String,
    pub store_path: PathBuf,
    pub command_prefix: String,
}

impl DiscordConfig {
    pub fn from_config(config: &dmrelay::Config, token: String) -> Self {
        Self {
            token,
            store_path: config.store_path.clone(),
            command_prefix: config.command_prefix.clone(),
        }
    }
}

/// The running bot.
pub struct DiscordGateway {
    config: DiscordConfig,
}

impl DiscordGateway {
    pub fn new(config: DiscordConfig) -> Self {
        Self { config }
    }

    /// Gateway intents the relay needs: guild metadata, guild messages for
    /// commands, direct messages and their content.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
    }

    /// Connect and process events until the connection ends.
    pub async fn run(self) -> anyhow::Result<()> {
        let store: Arc<dyn RelayStore> = Arc::new(FileRelayStore::new(&self.config.store_path));
        let handler = RelayHandler::new(
            store,
            CommandTable::new(self.config.command_prefix.clone()),
            AttachmentFetcher::new(),
        );

        info!(store = %self.config.store_path.display(), "Starting Discord gateway");
        let mut client = Client::builder(&self.config.token, Self::intents())
            .event_handler(handler)
            .await
            .context("failed to create Discord client")?;

        client
            .start()
            .await
            .context("Discord connection failed")?;
        Ok(())
    }
}
