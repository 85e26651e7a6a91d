//! Relay data model.
//!
//! [`RelayTarget`] is the only persisted entity. Everything else lives for the
//! duration of one relay operation.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// A community (Discord guild).
    CommunityId
);
id_type!(
    /// A channel inside a community.
    ChannelId
);
id_type!(
    /// A platform user.
    UserId
);

// ============================================================================
// RelayTarget
// ============================================================================

/// The single configured relay destination.
///
/// Community and channel are either both known or both absent, so a partial
/// target cannot be constructed. Serialized through [`RelayRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RelayRecord", into = "RelayRecord")]
pub enum RelayTarget {
    /// No target has been set yet.
    #[default]
    Unconfigured,
    /// Relay into `channel` of `community`.
    Configured {
        community: CommunityId,
        channel: ChannelId,
    },
}

impl RelayTarget {
    pub fn new(community: CommunityId, channel: ChannelId) -> Self {
        Self::Configured { community, channel }
    }
}

/// On-disk layout of [`RelayTarget`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRecord {
    #[serde(default)]
    pub channel_id: Option<u64>,
    #[serde(default)]
    pub guild_id: Option<u64>,
}

impl RelayRecord {
    /// True when exactly one of the two identifiers is set.
    pub fn is_partial(&self) -> bool {
        self.channel_id.is_some() != self.guild_id.is_some()
    }
}

impl From<RelayRecord> for RelayTarget {
    fn from(record: RelayRecord) -> Self {
        match (record.guild_id, record.channel_id) {
            (Some(guild), Some(channel)) => Self::new(CommunityId(guild), ChannelId(channel)),
            _ => Self::Unconfigured,
        }
    }
}

impl From<RelayTarget> for RelayRecord {
    fn from(target: RelayTarget) -> Self {
        match target {
            RelayTarget::Unconfigured => Self::default(),
            RelayTarget::Configured { community, channel } => Self {
                channel_id: Some(channel.0),
                guild_id: Some(community.0),
            },
        }
    }
}

// ============================================================================
// Inbound
// ============================================================================

/// A file attached to an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub filename: String,
    /// Declared size in bytes.
    pub size: u64,
    /// Where the file can be downloaded from.
    pub url: String,
}

/// A message received by the relay identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender: UserId,
    pub content: String,
    pub attachments: Vec<AttachmentRef>,
    /// Whether the message arrived as a direct message.
    pub is_direct: bool,
}

// ============================================================================
// Outbound
// ============================================================================

/// An attachment downloaded and ready to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundFile {
    pub filename: String,
    pub data: Bytes,
}

/// One post into the relay channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboundMessage {
    pub content: String,
    pub files: Vec<OutboundFile>,
}

// ============================================================================
// Outcomes
// ============================================================================

/// Which half of the configured target could not be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingTarget {
    Community,
    Channel,
}

/// Why a single attachment was left out of the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentFailure {
    /// Disallowed extension or over the size ceiling.
    Rejected(String),
    /// Download failed.
    DownloadFailed(String),
}

impl AttachmentFailure {
    pub fn filename(&self) -> &str {
        match self {
            Self::Rejected(name) | Self::DownloadFailed(name) => name,
        }
    }
}

/// Final result of processing one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Not a direct message; nothing was done.
    Ignored,
    /// Text and every attachment were relayed.
    Relayed,
    /// Relayed, but the named attachments were left out.
    RelayedPartial(Vec<String>),
    /// No relay target has been set.
    Unconfigured,
    /// The configured community or channel no longer resolves.
    TargetMissing(MissingTarget),
    /// The relay identity may not post in the target channel.
    PermissionDenied,
    /// An unexpected failure, with its detail.
    InternalError(String),
}
