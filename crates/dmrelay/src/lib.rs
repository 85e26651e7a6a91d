//! dmrelay - relay direct messages sent to a bot into one community channel.
//!
//! The crate is platform-neutral. A gateway crate (Discord today) implements
//! [`client::RelayClient`], feeds [`types::InboundMessage`]s into the
//! [`dispatcher::RelayDispatcher`] and routes prefixed guild messages to the
//! [`commands`] handler.
//!
//! ```text
//!  Gateway event
//!       │  InboundMessage
//!       ▼
//!  RelayDispatcher::handle()                 [dispatcher.rs]
//!       │  1. RelayStore::load()              [store/]
//!       │  2. PermissionGuard::check()        [guard.rs]
//!       │  3. strip unrecognized command      [commands.rs]
//!       │  4. attachment::validate()          [attachment.rs]
//!       ▼
//!  RelayClient::send_to_channel() + notices to the sender
//! ```

pub mod attachment;
pub mod client;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod guard;
pub mod notices;
pub mod store;
pub mod types;

#[cfg(test)]
mod testing;

pub use client::{ClientError, RelayClient};
pub use commands::{AdminError, CommandTable, SetTargetRequest};
pub use config::{Config, ConfigError};
pub use dispatcher::{RelayDispatcher, RelayError};
pub use guard::{GuardDenial, GuardVerdict, PermissionGuard};
pub use store::{FileRelayStore, RelayStore, StorageError};
pub use types::{
    AttachmentFailure, AttachmentRef, ChannelId, CommunityId, InboundMessage, MissingTarget,
    OutboundFile, OutboundMessage, RelayOutcome, RelayTarget, UserId,
};
