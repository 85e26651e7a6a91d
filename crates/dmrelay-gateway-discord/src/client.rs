//! [`RelayClient`] over the Discord HTTP API.

use std::num::NonZeroU64;
use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{
    ChannelId, CreateAttachment, CreateMessage, GuildChannel, GuildId, Http, PartialGuild, UserId,
};
use serenity::http::HttpError;

use dmrelay::{AttachmentRef, ClientError, OutboundFile, OutboundMessage, RelayClient};

use crate::download::AttachmentFetcher;

/// Discord implementation of the relay client port.
#[derive(Clone)]
pub struct DiscordClient {
    http: Arc<Http>,
    fetcher: AttachmentFetcher,
    /// The bot's own user id, when already known from the ready event.
    bot_id: Option<UserId>,
}

impl DiscordClient {
    pub fn new(http: Arc<Http>, fetcher: AttachmentFetcher, bot_id: Option<UserId>) -> Self {
        Self {
            http,
            fetcher,
            bot_id,
        }
    }

    async fn bot_id(&self) -> Result<UserId, ClientError> {
        match self.bot_id {
            Some(id) => Ok(id),
            None => Ok(self
                .http
                .get_current_user()
                .await
                .map_err(ClientError::platform)?
                .id),
        }
    }

    /// Whether `user` owns the application, directly or through its team.
    pub async fn is_owner(&self, user: UserId) -> Result<bool, ClientError> {
        let info = self
            .http
            .get_current_application_info()
            .await
            .map_err(ClientError::platform)?;
        if info.owner.as_ref().is_some_and(|owner| owner.id == user) {
            return Ok(true);
        }
        Ok(info
            .team
            .is_some_and(|team| team.members.iter().any(|m| m.user.id == user)))
    }
}

#[async_trait]
impl RelayClient for DiscordClient {
    type Community = PartialGuild;
    type Channel = GuildChannel;

    async fn resolve_community(
        &self,
        id: dmrelay::CommunityId,
    ) -> Result<Option<PartialGuild>, ClientError> {
        let Some(id) = NonZeroU64::new(id.get()).map(GuildId::from) else {
            return Ok(None);
        };
        not_found_as_none(self.http.get_guild(id).await)
    }

    async fn resolve_channel(
        &self,
        community: &PartialGuild,
        id: dmrelay::ChannelId,
    ) -> Result<Option<GuildChannel>, ClientError> {
        let Some(id) = NonZeroU64::new(id.get()).map(ChannelId::from) else {
            return Ok(None);
        };
        let channels = not_found_as_none(self.http.get_channels(community.id).await)?;
        Ok(channels.and_then(|channels| channels.into_iter().find(|c| c.id == id)))
    }

    async fn can_send(
        &self,
        community: &PartialGuild,
        channel: &GuildChannel,
    ) -> Result<bool, ClientError> {
        let me = self.bot_id().await?;
        let member = self
            .http
            .get_member(community.id, me)
            .await
            .map_err(ClientError::platform)?;
        Ok(community
            .user_permissions_in(channel, &member)
            .send_messages())
    }

    async fn fetch_attachment(
        &self,
        attachment: &AttachmentRef,
    ) -> Result<OutboundFile, ClientError> {
        self.fetcher.fetch(attachment).await
    }

    async fn send_to_channel(
        &self,
        channel: &GuildChannel,
        message: OutboundMessage,
    ) -> Result<(), ClientError> {
        let files = message
            .files
            .into_iter()
            .map(|f| CreateAttachment::bytes(f.data.to_vec(), f.filename));
        let builder = CreateMessage::new()
            .content(message.content)
            .add_files(files);
        channel
            .id
            .send_message(self.http.as_ref(), builder)
            .await
            .map_err(ClientError::platform)?;
        Ok(())
    }

    async fn send_direct(&self, user: dmrelay::UserId, text: &str) -> Result<(), ClientError> {
        let Some(user) = NonZeroU64::new(user.get()).map(UserId::from) else {
            return Err(ClientError::Platform(format!("invalid user id {user}")));
        };
        user.direct_message(self.http.as_ref(), CreateMessage::new().content(text))
            .await
            .map_err(ClientError::platform)?;
        Ok(())
    }
}

/// Map "unknown" / "no access" answers of a lookup to `None`.
fn not_found_as_none<T>(result: serenity::Result<T>) -> Result<Option<T>, ClientError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(serenity::Error::Http(HttpError::UnsuccessfulRequest(ref response)))
            if is_lookup_miss(response.status_code.as_u16()) =>
        {
            Ok(None)
        }
        Err(e) => Err(ClientError::platform(e)),
    }
}

/// Status codes Discord returns for objects that are gone or hidden from us.
fn is_lookup_miss(status: u16) -> bool {
    matches!(status, 403 | 404)
}
