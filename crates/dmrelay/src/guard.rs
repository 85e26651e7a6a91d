//! Permission guard for the relay channel.
//!
//! Resolves the configured community and channel through the client and checks
//! that the relay identity may post there. The three ways this can fail are
//! kept apart because each produces a different notice.

use crate::client::{ClientError, RelayClient};
use crate::types::{ChannelId, CommunityId, MissingTarget};

/// Why the relay channel cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDenial {
    CommunityNotFound,
    ChannelNotFound,
    MissingSendPermission,
}

impl GuardDenial {
    /// The missing half of the target, if this is a resolution failure.
    pub fn missing_target(self) -> Option<MissingTarget> {
        match self {
            Self::CommunityNotFound => Some(MissingTarget::Community),
            Self::ChannelNotFound => Some(MissingTarget::Channel),
            Self::MissingSendPermission => None,
        }
    }
}

/// Result of a guard check.
pub enum GuardVerdict<C: RelayClient + ?Sized> {
    /// The channel is usable; carries its resolved handle.
    Allowed { channel: C::Channel },
    Denied(GuardDenial),
}

impl<C: RelayClient + ?Sized> GuardVerdict<C> {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Checks send access to the relay channel.
pub struct PermissionGuard<'a, C: ?Sized> {
    client: &'a C,
}

impl<'a, C: RelayClient + ?Sized> PermissionGuard<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Resolve `community`/`channel` and check the send permission.
    ///
    /// Client failures propagate as `Err`; only "not found" and "not allowed"
    /// become a [`GuardDenial`].
    pub async fn check(
        &self,
        community: CommunityId,
        channel: ChannelId,
    ) -> Result<GuardVerdict<C>, ClientError> {
        let Some(community) = self.client.resolve_community(community).await? else {
            return Ok(GuardVerdict::Denied(GuardDenial::CommunityNotFound));
        };
        let Some(channel) = self.client.resolve_channel(&community, channel).await? else {
            return Ok(GuardVerdict::Denied(GuardDenial::ChannelNotFound));
        };
        if !self.client.can_send(&community, &channel).await? {
            return Ok(GuardVerdict::Denied(GuardDenial::MissingSendPermission));
        }
        Ok(GuardVerdict::Allowed { channel })
    }

    /// Whether the relay identity can currently post in the channel.
    pub async fn can_send(
        &self,
        community: CommunityId,
        channel: ChannelId,
    ) -> Result<bool, ClientError> {
        Ok(self.check(community, channel).await?.is_allowed())
    }
}
