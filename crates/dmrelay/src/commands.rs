//! Command table and the admin "set relay target" command.
//!
//! The dispatcher only needs [`CommandTable::is_recognized`] to decide whether
//! a leading `!word` is a command or part of the payload. Executing commands is
//! the gateway's job, through [`execute`].

use thiserror::Error;
use tracing::{info, warn};

use crate::client::ClientError;
use crate::notices;
use crate::store::{RelayStore, StorageError};
use crate::types::{ChannelId, CommunityId, RelayTarget, UserId};

/// Name of the command that sets the relay target.
pub const SET_TARGET: &str = "heel";

/// Default command prefix.
pub const DEFAULT_PREFIX: &str = "!";

const COMMAND_NAMES: &[&str] = &[SET_TARGET];

/// A parsed, recognized command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Set the relay target to the channel named by `argument`.
    SetTarget { argument: &'a str },
}

/// The registered commands and their prefix.
#[derive(Debug, Clone)]
pub struct CommandTable {
    prefix: String,
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl CommandTable {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Whether `text` starts with the prefix.
    pub fn has_prefix(&self, text: &str) -> bool {
        !self.prefix.is_empty() && text.starts_with(&self.prefix)
    }

    /// Whether `text` invokes a registered command.
    pub fn is_recognized(&self, text: &str) -> bool {
        self.invoked_name(text)
            .is_some_and(|name| COMMAND_NAMES.contains(&name))
    }

    /// Parse a recognized command and its argument text.
    pub fn parse<'t>(&self, text: &'t str) -> Option<Command<'t>> {
        let name = self.invoked_name(text)?;
        let argument = text[self.prefix.len() + name.len()..].trim();
        match name {
            SET_TARGET => Some(Command::SetTarget { argument }),
            _ => None,
        }
    }

    /// The word directly after the prefix.
    fn invoked_name<'t>(&self, text: &'t str) -> Option<&'t str> {
        if !self.has_prefix(text) {
            return None;
        }
        let rest = &text[self.prefix.len()..];
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        Some(&rest[..end])
    }
}

/// Drop the first whitespace-delimited token and trim the remainder.
pub fn strip_command_token(text: &str) -> &str {
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    text[end..].trim()
}

/// Parse a channel mention (`<#123>`) or a bare channel id.
///
/// Channel names are not looked up; `heel general` is rejected.
pub fn parse_channel_ref(argument: &str) -> Option<ChannelId> {
    let raw = argument
        .strip_prefix("<#")
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(argument);
    raw.parse::<u64>().ok().filter(|id| *id != 0).map(ChannelId)
}

// ============================================================================
// Admin command handler
// ============================================================================

/// Errors reported back to whoever ran an admin command.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("only the bot owner can do that")]
    NotOwner,

    #[error("this command only works inside a server")]
    NotInCommunity,

    #[error("not a channel: {0:?}. usage: heel #channel (a channel mention or id, names are not accepted)")]
    InvalidChannel(String),

    #[error("could not verify the bot owner: {0}")]
    OwnerLookup(#[source] ClientError),

    #[error("failed to save relay config: {0}")]
    Store(#[from] StorageError),
}

/// Who ran a command, and from where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetTargetRequest<'a> {
    pub actor: UserId,
    /// Whether the platform considers `actor` the bot owner.
    pub is_owner: bool,
    /// The community the command was sent from, `None` for direct messages.
    pub community: Option<CommunityId>,
    pub argument: &'a str,
}

/// Point the relay at a channel of the invoking community.
///
/// The channel is not checked for reachability here; every relay re-checks.
pub async fn set_relay_target(
    store: &(impl RelayStore + ?Sized),
    request: SetTargetRequest<'_>,
) -> Result<RelayTarget, AdminError> {
    if !request.is_owner {
        return Err(AdminError::NotOwner);
    }
    let community = request.community.ok_or(AdminError::NotInCommunity)?;
    let channel = parse_channel_ref(request.argument)
        .ok_or_else(|| AdminError::InvalidChannel(request.argument.to_string()))?;

    let target = RelayTarget::new(community, channel);
    store.save(&target).await?;
    info!(
        channel_id = %channel,
        guild_id = %community,
        user_id = %request.actor,
        "Relay channel configured"
    );
    Ok(target)
}

/// Run a parsed command and return the reply for the invoker.
///
/// `owner` is the platform's answer to "is `actor` the bot owner"; a failed
/// lookup is reported as such rather than as a refusal.
pub async fn execute(
    store: &(impl RelayStore + ?Sized),
    command: Command<'_>,
    actor: UserId,
    owner: Result<bool, ClientError>,
    community: Option<CommunityId>,
) -> String {
    let result = match command {
        Command::SetTarget { argument } => match owner {
            Ok(is_owner) => {
                let request = SetTargetRequest {
                    actor,
                    is_owner,
                    community,
                    argument,
                };
                set_relay_target(store, request).await.map(|_| ())
            }
            Err(e) => Err(AdminError::OwnerLookup(e)),
        },
    };
    match result {
        Ok(()) => notices::TARGET_SET.to_string(),
        Err(e) => {
            warn!(user_id = %actor, error = %e, "Set relay target rejected");
            e.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, capture_logs};

    fn request(argument: &str) -> SetTargetRequest<'_> {
        SetTargetRequest {
            actor: UserId(1),
            is_owner: true,
            community: Some(CommunityId(100)),
            argument,
        }
    }

    #[test]
    fn recognizes_registered_command() {
        let table = CommandTable::default();
        assert!(table.is_recognized("!heel"));
        assert!(table.is_recognized("!heel <#5>"));
        assert!(table.is_recognized("!heel\n<#5>"));
    }

    #[test]
    fn rejects_unregistered_or_malformed() {
        let table = CommandTable::default();
        assert!(!table.is_recognized("!notacommand hello world"));
        assert!(!table.is_recognized("!HEEL"));
        assert!(!table.is_recognized("! heel"));
        assert!(!table.is_recognized("!heeled"));
        assert!(!table.is_recognized("heel"));
        assert!(!table.is_recognized(""));
        assert!(!table.is_recognized("!"));
    }

    #[test]
    fn custom_prefix() {
        let table = CommandTable::new("?");
        assert!(table.is_recognized("?heel 1"));
        assert!(!table.is_recognized("!heel 1"));
        assert!(!CommandTable::new("").is_recognized("heel"));
    }

    #[test]
    fn strips_first_token() {
        assert_eq!(strip_command_token("!notacommand hello world"), "hello world");
        assert_eq!(strip_command_token("!x   spaced out  "), "spaced out");
        assert_eq!(strip_command_token("!x\nnext line"), "next line");
        assert_eq!(strip_command_token("!alone"), "");
        assert_eq!(strip_command_token("!"), "");
    }

    #[test]
    fn parses_set_target_argument() {
        let table = CommandTable::default();
        assert_eq!(
            table.parse("!heel   <#42> "),
            Some(Command::SetTarget { argument: "<#42>" })
        );
        assert_eq!(
            table.parse("!heel"),
            Some(Command::SetTarget { argument: "" })
        );
        assert_eq!(table.parse("!other <#42>"), None);
    }

    #[test]
    fn parses_channel_refs() {
        assert_eq!(parse_channel_ref("<#123>"), Some(ChannelId(123)));
        assert_eq!(parse_channel_ref("456"), Some(ChannelId(456)));
        assert_eq!(parse_channel_ref("<@123>"), None);
        assert_eq!(parse_channel_ref("general"), None);
        assert_eq!(parse_channel_ref(""), None);
        assert_eq!(parse_channel_ref("0"), None);
    }

    #[tokio::test]
    async fn owner_sets_target() {
        let store = MemoryStore::default();
        let target = set_relay_target(&store, request("<#200>")).await.unwrap();
        assert_eq!(target, RelayTarget::new(CommunityId(100), ChannelId(200)));
        assert_eq!(store.load().await, target);
    }

    #[tokio::test]
    async fn new_target_is_logged() {
        let (_guard, logs) = capture_logs();
        let store = MemoryStore::default();
        set_relay_target(&store, request("<#200>")).await.unwrap();

        let lines = logs.lines_with("Relay channel configured");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("INFO"));
        assert!(lines[0].contains("channel_id=200"));
        assert!(lines[0].contains("guild_id=100"));
    }

    #[tokio::test]
    async fn channel_name_is_rejected_with_usage() {
        let store = MemoryStore::default();
        let err = set_relay_target(&store, request("general"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("names are not accepted"));
    }

    #[tokio::test]
    async fn non_owner_is_rejected() {
        let store = MemoryStore::default();
        let mut req = request("<#200>");
        req.is_owner = false;
        let err = set_relay_target(&store, req).await.unwrap_err();
        assert!(matches!(err, AdminError::NotOwner));
        assert_eq!(store.load().await, RelayTarget::Unconfigured);
    }

    #[tokio::test]
    async fn direct_message_is_rejected() {
        let store = MemoryStore::default();
        let mut req = request("<#200>");
        req.community = None;
        let err = set_relay_target(&store, req).await.unwrap_err();
        assert!(matches!(err, AdminError::NotInCommunity));
    }

    #[tokio::test]
    async fn bad_channel_argument_is_rejected() {
        let store = MemoryStore::default();
        let err = set_relay_target(&store, request("#general"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::InvalidChannel(ref arg) if arg == "#general"));
        assert_eq!(store.load().await, RelayTarget::Unconfigured);
    }

    #[tokio::test]
    async fn execute_acknowledges_and_overwrites() {
        let store = MemoryStore::default();
        let table = CommandTable::default();

        let command = table.parse("!heel <#1>").unwrap();
        let reply = execute(&store, command, UserId(1), Ok(true), Some(CommunityId(9))).await;
        assert_eq!(reply, "i exist to serve");

        let command = table.parse("!heel 2").unwrap();
        execute(&store, command, UserId(1), Ok(true), Some(CommunityId(8))).await;
        assert_eq!(
            store.load().await,
            RelayTarget::new(CommunityId(8), ChannelId(2))
        );
    }

    #[tokio::test]
    async fn execute_reports_errors() {
        let store = MemoryStore::default();
        let command = CommandTable::default().parse("!heel <#1>").unwrap();
        let reply = execute(&store, command, UserId(2), Ok(false), Some(CommunityId(9))).await;
        assert_eq!(reply, "only the bot owner can do that");
    }

    #[tokio::test]
    async fn execute_reports_owner_lookup_failure() {
        let store = MemoryStore::default();
        let command = CommandTable::default().parse("!heel <#1>").unwrap();
        let owner = Err(ClientError::Platform("401 Unauthorized".to_string()));
        let reply = execute(&store, command, UserId(1), owner, Some(CommunityId(9))).await;
        assert_eq!(reply, "could not verify the bot owner: 401 Unauthorized");
        assert_eq!(store.load().await, RelayTarget::Unconfigured);
    }

    #[tokio::test]
    async fn execute_reports_store_failure() {
        let store = MemoryStore::default().failing_saves();
        let command = CommandTable::default().parse("!heel <#1>").unwrap();
        let reply = execute(&store, command, UserId(1), Ok(true), Some(CommunityId(9))).await;
        assert!(reply.starts_with("failed to save relay config"));
    }
}
