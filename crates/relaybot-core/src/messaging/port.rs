use async_trait::async_trait;

use crate::{
    domain::{ChatId, FileRef, MessageId, MessageRef},
    messaging::types::{MessagingCapabilities, OutboundMedia},
    Result,
};

/// Cross-messenger port.
///
/// Telegram is the only implementation; replies are best-effort, so a missing
/// `reply_to` target does not fail the send.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef>;

    async fn send_media(
        &self,
        chat_id: ChatId,
        media: &OutboundMedia,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef>;

    /// Send several media items as one combined post.
    async fn send_media_group(
        &self,
        chat_id: ChatId,
        items: &[OutboundMedia],
        reply_to: Option<MessageId>,
    ) -> Result<Vec<MessageRef>>;

    async fn download_file(&self, file: &FileRef) -> Result<Vec<u8>>;
}
