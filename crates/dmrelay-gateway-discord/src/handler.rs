//! serenity event handler.
//!
//! Direct messages go to the relay dispatcher. Guild messages that invoke a
//! registered command go to the admin command handler. Everything else is
//! ignored. Serenity runs each event in its own task, so one slow relay never
//! holds up another.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use serenity::all::{Context, EventHandler, Message, Ready, UserId};
use tracing::{debug, info, warn};

use dmrelay::commands::{self, Command};
use dmrelay::{AttachmentRef, CommandTable, InboundMessage, RelayDispatcher, RelayStore};

use crate::client::DiscordClient;
use crate::download::AttachmentFetcher;

/// What to do with one incoming message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Ignore,
    /// A direct message for the relay dispatcher.
    Relay,
    /// A recognized command sent inside a guild.
    Command(Command<'a>),
}

/// Decide where a message goes.
///
/// Direct messages are always relayed, even when they look like a command;
/// the dispatcher decides what to strip from them.
pub fn route<'a>(is_own: bool, in_guild: bool, content: &'a str, commands: &CommandTable) -> Route<'a> {
    if is_own {
        return Route::Ignore;
    }
    if !in_guild {
        return Route::Relay;
    }
    match commands.parse(content) {
        Some(command) => Route::Command(command),
        None => Route::Ignore,
    }
}

/// Routes Discord events into the relay.
pub struct RelayHandler {
    store: Arc<dyn RelayStore>,
    commands: CommandTable,
    fetcher: AttachmentFetcher,
    bot_id: OnceLock<UserId>,
}

impl RelayHandler {
    pub fn new(store: Arc<dyn RelayStore>, commands: CommandTable, fetcher: AttachmentFetcher) -> Self {
        Self {
            store,
            commands,
            fetcher,
            bot_id: OnceLock::new(),
        }
    }

    fn client(&self, ctx: &Context) -> DiscordClient {
        DiscordClient::new(
            Arc::clone(&ctx.http),
            self.fetcher.clone(),
            self.bot_id.get().copied(),
        )
    }

    fn is_own_message(&self, msg: &Message) -> bool {
        match self.bot_id.get() {
            Some(id) => msg.author.id == *id,
            None => msg.author.bot,
        }
    }

    async fn relay(&self, ctx: &Context, msg: &Message) {
        let dispatcher = RelayDispatcher::new(
            Arc::new(self.client(ctx)),
            Arc::clone(&self.store),
            self.commands.clone(),
        );
        let outcome = dispatcher.handle(&inbound_message(msg)).await;
        debug!(user_id = %msg.author.id, outcome = ?outcome, "Direct message processed");
    }

    async fn run_command(&self, ctx: &Context, msg: &Message, command: Command<'_>) {
        let owner = self.client(ctx).is_owner(msg.author.id).await;
        if let Err(e) = &owner {
            warn!(user_id = %msg.author.id, error = %e, "Failed to look up application owner");
        }

        let reply = commands::execute(
            self.store.as_ref(),
            command,
            dmrelay::UserId(msg.author.id.get()),
            owner,
            msg.guild_id.map(|g| dmrelay::CommunityId(g.get())),
        )
        .await;

        if let Err(e) = msg.channel_id.say(&ctx.http, reply).await {
            warn!(channel_id = %msg.channel_id, error = %e, "Failed to answer command");
        }
    }
}

#[async_trait]
impl EventHandler for RelayHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        let _ = self.bot_id.set(ready.user.id);
        info!(user = %ready.user.name, user_id = %ready.user.id, "Bot logged in");
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let is_own = self.is_own_message(&msg);
        match route(is_own, msg.guild_id.is_some(), &msg.content, &self.commands) {
            Route::Ignore => {}
            Route::Relay => self.relay(&ctx, &msg).await,
            Route::Command(command) => self.run_command(&ctx, &msg, command).await,
        }
    }
}

/// Translate a Discord message into the relay's inbound form.
pub fn inbound_message(msg: &Message) -> InboundMessage {
    inbound_from_parts(
        msg.author.id.get(),
        &msg.content,
        msg.guild_id.map(|g| g.get()),
        msg.attachments
            .iter()
            .map(|a| attachment_ref(&a.filename, a.size, &a.url))
            .collect(),
    )
}

fn inbound_from_parts(
    sender: u64,
    content: &str,
    guild_id: Option<u64>,
    attachments: Vec<AttachmentRef>,
) -> InboundMessage {
    InboundMessage {
        sender: dmrelay::UserId(sender),
        content: content.to_string(),
        attachments,
        is_direct: guild_id.is_none(),
    }
}

fn attachment_ref(filename: &str, size: u32, url: &str) -> AttachmentRef {
    AttachmentRef {
        filename: filename.to_string(),
        size: u64::from(size),
        url: url.to_string(),
    }
}
