//! Relay dispatcher.
//!
//! Turns one inbound direct message into at most one post in the relay channel
//! plus notices to the sender. [`RelayDispatcher::process`] runs the relay and
//! propagates unexpected client failures; [`RelayDispatcher::handle`] is the
//! boundary the gateway calls, which never fails.
//!
//! ```text
//!  handle()
//!    └─ process()
//!         ├─ not direct          → Ignored
//!         ├─ store unset         → Unconfigured
//!         ├─ guard: community    → TargetMissing(Community)
//!         ├─ guard: channel      → TargetMissing(Channel)
//!         ├─ guard: permission   → PermissionDenied
//!         ├─ collect attachments (per-item notices)
//!         └─ send + confirm      → Relayed | RelayedPartial
//!    Err(..) → notice + InternalError
//! ```

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::attachment;
use crate::client::{ClientError, RelayClient};
use crate::commands::{CommandTable, strip_command_token};
use crate::guard::{GuardVerdict, PermissionGuard};
use crate::notices;
use crate::store::RelayStore;
use crate::types::{
    AttachmentFailure, InboundMessage, MissingTarget, OutboundFile, OutboundMessage, RelayOutcome,
    RelayTarget, UserId,
};

/// Unexpected failures while relaying.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Relays direct messages into the configured channel.
pub struct RelayDispatcher<C: ?Sized> {
    client: Arc<C>,
    store: Arc<dyn RelayStore>,
    commands: CommandTable,
}

impl<C: ?Sized> Clone for RelayDispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            store: Arc::clone(&self.store),
            commands: self.commands.clone(),
        }
    }
}

impl<C: RelayClient + ?Sized> RelayDispatcher<C> {
    pub fn new(client: Arc<C>, store: Arc<dyn RelayStore>, commands: CommandTable) -> Self {
        Self {
            client,
            store,
            commands,
        }
    }

    /// Process a message, turning any unexpected failure into a notice.
    pub async fn handle(&self, message: &InboundMessage) -> RelayOutcome {
        match self.process(message).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(user_id = %message.sender, error = %e, "Error relaying message");
                let detail = e.to_string();
                self.notify(message.sender, &notices::relay_error(&detail))
                    .await;
                RelayOutcome::InternalError(detail)
            }
        }
    }

    /// Relay one message.
    pub async fn process(&self, message: &InboundMessage) -> Result<RelayOutcome, RelayError> {
        if !message.is_direct {
            return Ok(RelayOutcome::Ignored);
        }
        let sender = message.sender;

        let RelayTarget::Configured { community, channel } = self.store.load().await else {
            self.notify(sender, notices::NOT_CONFIGURED).await;
            return Ok(RelayOutcome::Unconfigured);
        };

        let guard = PermissionGuard::new(self.client.as_ref());
        let channel_handle = match guard.check(community, channel).await? {
            GuardVerdict::Allowed { channel } => channel,
            GuardVerdict::Denied(denial) => match denial.missing_target() {
                Some(missing) => {
                    let notice = match missing {
                        MissingTarget::Community => notices::SERVER_NOT_FOUND,
                        MissingTarget::Channel => notices::CHANNEL_NOT_FOUND,
                    };
                    self.notify(sender, notice).await;
                    return Ok(RelayOutcome::TargetMissing(missing));
                }
                None => {
                    warn!(channel_id = %channel, "Permissions lacking in target channel");
                    self.notify(sender, notices::MISSING_PERMISSION).await;
                    return Ok(RelayOutcome::PermissionDenied);
                }
            },
        };

        let content = self.relay_text(&message.content).to_string();
        let (files, failures) = self.collect_attachments(message).await;

        let file_count = files.len();
        self.client
            .send_to_channel(&channel_handle, OutboundMessage { content, files })
            .await?;
        info!(
            user_id = %sender,
            channel_id = %channel,
            files = file_count,
            "Message relayed"
        );

        self.notify(sender, notices::RELAYED).await;

        if failures.is_empty() {
            Ok(RelayOutcome::Relayed)
        } else {
            Ok(RelayOutcome::RelayedPartial(
                failures.iter().map(|f| f.filename().to_string()).collect(),
            ))
        }
    }

    /// Text to relay: an unrecognized leading `!word` is dropped.
    pub fn relay_text<'t>(&self, content: &'t str) -> &'t str {
        if self.commands.has_prefix(content) && !self.commands.is_recognized(content) {
            strip_command_token(content)
        } else {
            content
        }
    }

    /// Validate and download each attachment, notifying the sender per failure.
    async fn collect_attachments(
        &self,
        message: &InboundMessage,
    ) -> (Vec<OutboundFile>, Vec<AttachmentFailure>) {
        let mut files = Vec::with_capacity(message.attachments.len());
        let mut failures = Vec::new();

        for item in &message.attachments {
            if !attachment::validate(item) {
                debug!(filename = %item.filename, size = item.size, "Attachment rejected");
                self.notify(message.sender, &notices::invalid_attachment(&item.filename))
                    .await;
                failures.push(AttachmentFailure::Rejected(item.filename.clone()));
                continue;
            }
            match self.client.fetch_attachment(item).await {
                Ok(file) => files.push(file),
                Err(e) => {
                    warn!(filename = %item.filename, error = %e, "Error downloading attachment");
                    self.notify(message.sender, &notices::download_failed(&item.filename))
                        .await;
                    failures.push(AttachmentFailure::DownloadFailed(item.filename.clone()));
                }
            }
        }

        (files, failures)
    }

    /// Send a notice to `user`. Failures are logged only.
    async fn notify(&self, user: UserId, text: &str) {
        if let Err(e) = self.client.send_direct(user, text).await {
            warn!(user_id = %user, error = %e, "Failed to notify sender");
        }
    }
}
