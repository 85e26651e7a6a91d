//! Chat platform port.
//!
//! Gateways implement [`RelayClient`] over their platform SDK. The relay core
//! never talks to the platform any other way.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{AttachmentRef, ChannelId, CommunityId, OutboundFile, OutboundMessage, UserId};

/// Errors surfaced by a [`RelayClient`] implementation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The platform API rejected or failed a call.
    #[error("{0}")]
    Platform(String),

    /// Retrieving an attachment failed.
    #[error("failed to download {filename}: {message}")]
    Download { filename: String, message: String },
}

impl ClientError {
    pub fn platform(err: impl std::fmt::Display) -> Self {
        Self::Platform(err.to_string())
    }
}

/// Outbound operations the relay needs from the chat platform.
///
/// Every call may suspend. Lookups return `Ok(None)` when the object does not
/// exist or is not visible to the relay identity; `Err` is reserved for
/// unexpected failures.
#[async_trait]
pub trait RelayClient: Send + Sync {
    /// Resolved community handle.
    type Community: Send + Sync;
    /// Resolved channel handle.
    type Channel: Send + Sync;

    async fn resolve_community(
        &self,
        id: CommunityId,
    ) -> Result<Option<Self::Community>, ClientError>;

    /// Look up a channel that belongs to `community`.
    async fn resolve_channel(
        &self,
        community: &Self::Community,
        id: ChannelId,
    ) -> Result<Option<Self::Channel>, ClientError>;

    /// Whether the relay identity may post messages in `channel`.
    async fn can_send(
        &self,
        community: &Self::Community,
        channel: &Self::Channel,
    ) -> Result<bool, ClientError>;

    async fn fetch_attachment(
        &self,
        attachment: &AttachmentRef,
    ) -> Result<OutboundFile, ClientError>;

    async fn send_to_channel(
        &self,
        channel: &Self::Channel,
        message: OutboundMessage,
    ) -> Result<(), ClientError>;

    async fn send_direct(&self, user: UserId, text: &str) -> Result<(), ClientError>;
}
