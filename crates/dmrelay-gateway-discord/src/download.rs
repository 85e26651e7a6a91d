//! Attachment download over HTTP.

use dmrelay::{AttachmentRef, ClientError, OutboundFile};
use reqwest::Client;

/// Downloads attachments from their CDN URL.
#[derive(Debug, Clone, Default)]
pub struct AttachmentFetcher {
    client: Client,
}

impl AttachmentFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fetch(&self, attachment: &AttachmentRef) -> Result<OutboundFile, ClientError> {
        let failed = |message: String| ClientError::Download {
            filename: attachment.filename.clone(),
            message,
        };

        let response = self
            .client
            .get(&attachment.url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(failed(format!("status {}", response.status().as_u16())));
        }

        let data = response.bytes().await.map_err(|e| failed(e.to_string()))?;
        Ok(OutboundFile {
            filename: attachment.filename.clone(),
            data,
        })
    }
}
