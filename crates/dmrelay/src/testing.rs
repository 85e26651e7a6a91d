//! Test doubles for the client port and the store.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use crate::client::{ClientError, RelayClient};
use crate::store::{RelayStore, StorageError, StorageResult};
use crate::types::{
    AttachmentRef, ChannelId, CommunityId, OutboundFile, OutboundMessage, RelayTarget, UserId,
};

/// Log lines captured from the current thread's tracing output.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Lines containing `needle`.
    pub fn lines_with(&self, needle: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.contains(needle))
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Route tracing output on this thread into a buffer until the guard drops.
///
/// `#[tokio::test]` runs on a current-thread runtime, so events from tests
/// that do not spawn tasks all land here.
pub fn capture_logs() -> (tracing::subscriber::DefaultGuard, LogBuffer) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    (tracing::subscriber::set_default(subscriber), buffer)
}

/// Something the fake client was asked to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Channel {
        channel: ChannelId,
        content: String,
        files: Vec<String>,
    },
    Direct {
        user: UserId,
        text: String,
    },
}

/// In-memory [`RelayClient`] that records every send.
#[derive(Default)]
pub struct FakeClient {
    communities: HashSet<u64>,
    /// channel id -> owning community id
    channels: HashMap<u64, u64>,
    denied: HashSet<u64>,
    broken_downloads: HashSet<String>,
    lookup_error: Option<String>,
    channel_send_error: Option<String>,
    direct_sends_fail: bool,
    sent: Mutex<Vec<Sent>>,
    fetched: Mutex<Vec<String>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_community(mut self, id: u64) -> Self {
        self.communities.insert(id);
        self
    }

    pub fn with_channel(mut self, community: u64, channel: u64) -> Self {
        self.channels.insert(channel, community);
        self
    }

    pub fn deny_send(mut self, channel: u64) -> Self {
        self.denied.insert(channel);
        self
    }

    pub fn fail_download(mut self, filename: &str) -> Self {
        self.broken_downloads.insert(filename.to_string());
        self
    }

    pub fn fail_lookups(mut self, message: &str) -> Self {
        self.lookup_error = Some(message.to_string());
        self
    }

    pub fn fail_channel_send(mut self, message: &str) -> Self {
        self.channel_send_error = Some(message.to_string());
        self
    }

    pub fn fail_direct_sends(mut self) -> Self {
        self.direct_sends_fail = true;
        self
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn direct_texts(&self, user: UserId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Direct { user: u, text } if u == user => Some(text),
                _ => None,
            })
            .collect()
    }

    /// `(content, filenames)` for each channel post.
    pub fn channel_posts(&self) -> Vec<(String, Vec<String>)> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Channel { content, files, .. } => Some((content, files)),
                _ => None,
            })
            .collect()
    }

    fn check_lookup(&self) -> Result<(), ClientError> {
        match &self.lookup_error {
            Some(message) => Err(ClientError::Platform(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RelayClient for FakeClient {
    type Community = CommunityId;
    type Channel = ChannelId;

    async fn resolve_community(
        &self,
        id: CommunityId,
    ) -> Result<Option<CommunityId>, ClientError> {
        self.check_lookup()?;
        Ok(self.communities.contains(&id.0).then_some(id))
    }

    async fn resolve_channel(
        &self,
        community: &CommunityId,
        id: ChannelId,
    ) -> Result<Option<ChannelId>, ClientError> {
        self.check_lookup()?;
        Ok((self.channels.get(&id.0) == Some(&community.0)).then_some(id))
    }

    async fn can_send(
        &self,
        _community: &CommunityId,
        channel: &ChannelId,
    ) -> Result<bool, ClientError> {
        Ok(!self.denied.contains(&channel.0))
    }

    async fn fetch_attachment(
        &self,
        attachment: &AttachmentRef,
    ) -> Result<OutboundFile, ClientError> {
        self.fetched
            .lock()
            .unwrap()
            .push(attachment.filename.clone());
        if self.broken_downloads.contains(&attachment.filename) {
            return Err(ClientError::Download {
                filename: attachment.filename.clone(),
                message: "connection reset".to_string(),
            });
        }
        Ok(OutboundFile {
            filename: attachment.filename.clone(),
            data: Bytes::from(format!("contents of {}", attachment.filename)),
        })
    }

    async fn send_to_channel(
        &self,
        channel: &ChannelId,
        message: OutboundMessage,
    ) -> Result<(), ClientError> {
        if let Some(error) = &self.channel_send_error {
            return Err(ClientError::Platform(error.clone()));
        }
        self.sent.lock().unwrap().push(Sent::Channel {
            channel: *channel,
            content: message.content,
            files: message.files.into_iter().map(|f| f.filename).collect(),
        });
        Ok(())
    }

    async fn send_direct(&self, user: UserId, text: &str) -> Result<(), ClientError> {
        if self.direct_sends_fail {
            return Err(ClientError::Platform("Cannot send messages to this user".into()));
        }
        self.sent.lock().unwrap().push(Sent::Direct {
            user,
            text: text.to_string(),
        });
        Ok(())
    }
}

/// [`RelayStore`] kept in memory.
#[derive(Default)]
pub struct MemoryStore {
    target: Mutex<RelayTarget>,
    fail_saves: bool,
}

impl MemoryStore {
    pub fn with_target(target: RelayTarget) -> Self {
        Self {
            target: Mutex::new(target),
            fail_saves: false,
        }
    }

    pub fn failing_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }
}

#[async_trait]
impl RelayStore for MemoryStore {
    async fn load(&self) -> RelayTarget {
        *self.target.lock().unwrap()
    }

    async fn save(&self, target: &RelayTarget) -> StorageResult<()> {
        if self.fail_saves {
            return Err(StorageError::file_io(
                Path::new("memory"),
                std::io::Error::other("disk full"),
            ));
        }
        *self.target.lock().unwrap() = *target;
        Ok(())
    }
}
