//! Telegram adapter (teloxide).
//!
//! This crate implements the `relaybot-core` MessagingPort over the Telegram
//! Bot API and turns teloxide updates into core `InboundMessage`s.

use async_trait::async_trait;

use teloxide::{
    net::Download,
    prelude::*,
    types::{
        InputFile, InputMedia, InputMediaAudio, InputMediaDocument, InputMediaPhoto,
        InputMediaVideo,
    },
};

pub mod handlers;
pub mod inbound;
pub mod router;

use relaybot_core::{
    chunking::utf16_len,
    domain::{ChatId, FileRef, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{MediaKind, MessagingCapabilities, OutboundMedia},
    },
    Result,
};

/// Telegram rejects media captions above this many UTF-16 units.
pub const MAX_CAPTION_LEN: usize = 1024;
pub const MAX_MEDIA_GROUP_LEN: usize = 10;

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
    max_message_len: usize,
}

impl TelegramMessenger {
    pub fn new(bot: Bot, max_message_len: usize) -> Self {
        Self {
            bot,
            max_message_len,
        }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    fn message_ref(chat_id: ChatId, msg: &Message) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        }
    }
}

/// Caption cut to Telegram's limit, counted in UTF-16 units.
pub fn clamp_caption(caption: &str) -> String {
    if utf16_len(caption) <= MAX_CAPTION_LEN {
        return caption.to_string();
    }
    let mut len = 0usize;
    caption
        .chars()
        .take_while(|c| {
            len += c.len_utf16();
            len <= MAX_CAPTION_LEN
        })
        .collect()
}

fn input_media(media: &OutboundMedia) -> InputMedia {
    let file = InputFile::file_id(media.file.as_str().to_string());
    let caption = media.caption.as_deref().map(clamp_caption);
    match media.kind {
        MediaKind::Photo => {
            let mut m = InputMediaPhoto::new(file);
            m.caption = caption;
            InputMedia::Photo(m)
        }
        MediaKind::Video => {
            let mut m = InputMediaVideo::new(file);
            m.caption = caption;
            InputMedia::Video(m)
        }
        MediaKind::Audio => {
            let mut m = InputMediaAudio::new(file);
            m.caption = caption;
            InputMedia::Audio(m)
        }
        MediaKind::Document => {
            let mut m = InputMediaDocument::new(file);
            m.caption = caption;
            InputMedia::Document(m)
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            max_message_len: self.max_message_len,
            max_media_group_len: MAX_MEDIA_GROUP_LEN,
        }
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef> {
        let mut req = self
            .bot
            .send_message(Self::tg_chat(chat_id), text.to_string());
        if let Some(id) = reply_to {
            req = req
                .reply_to_message_id(Self::tg_msg_id(id))
                .allow_sending_without_reply(true);
        }
        let msg = req.await.map_err(Self::map_err)?;

        Ok(Self::message_ref(chat_id, &msg))
    }

    async fn send_media(
        &self,
        chat_id: ChatId,
        media: &OutboundMedia,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef> {
        let chat = Self::tg_chat(chat_id);
        let file = InputFile::file_id(media.file.as_str().to_string());
        let caption = media.caption.as_deref().map(clamp_caption);
        let reply = reply_to.map(Self::tg_msg_id);

        // Each payload type is distinct, so the optional fields are set per arm.
        let msg = match media.kind {
            MediaKind::Photo => {
                let mut req = self.bot.send_photo(chat, file);
                if let Some(c) = caption {
                    req = req.caption(c);
                }
                if let Some(id) = reply {
                    req = req.reply_to_message_id(id).allow_sending_without_reply(true);
                }
                req.await
            }
            MediaKind::Video => {
                let mut req = self.bot.send_video(chat, file);
                if let Some(c) = caption {
                    req = req.caption(c);
                }
                if let Some(id) = reply {
                    req = req.reply_to_message_id(id).allow_sending_without_reply(true);
                }
                req.await
            }
            MediaKind::Audio => {
                let mut req = self.bot.send_audio(chat, file);
                if let Some(c) = caption {
                    req = req.caption(c);
                }
                if let Some(id) = reply {
                    req = req.reply_to_message_id(id).allow_sending_without_reply(true);
                }
                req.await
            }
            MediaKind::Document => {
                let mut req = self.bot.send_document(chat, file);
                if let Some(c) = caption {
                    req = req.caption(c);
                }
                if let Some(id) = reply {
                    req = req.reply_to_message_id(id).allow_sending_without_reply(true);
                }
                req.await
            }
        }
        .map_err(Self::map_err)?;

        Ok(Self::message_ref(chat_id, &msg))
    }

    async fn send_media_group(
        &self,
        chat_id: ChatId,
        items: &[OutboundMedia],
        reply_to: Option<MessageId>,
    ) -> Result<Vec<MessageRef>> {
        if items.len() > MAX_MEDIA_GROUP_LEN {
            return Err(Error::External(format!(
                "media group of {} items exceeds {MAX_MEDIA_GROUP_LEN}",
                items.len()
            )));
        }
        let media: Vec<InputMedia> = items.iter().map(input_media).collect();

        let mut req = self.bot.send_media_group(Self::tg_chat(chat_id), media);
        if let Some(id) = reply_to {
            req = req
                .reply_to_message_id(Self::tg_msg_id(id))
                .allow_sending_without_reply(true);
        }
        let sent = req.await.map_err(Self::map_err)?;

        Ok(sent
            .iter()
            .map(|m| Self::message_ref(chat_id, m))
            .collect())
    }

    async fn download_file(&self, file: &FileRef) -> Result<Vec<u8>> {
        let meta = self
            .bot
            .get_file(file.as_str().to_string())
            .await
            .map_err(Self::map_err)?;

        let mut buf: Vec<u8> = Vec::new();
        self.bot
            .download_file(&meta.path, &mut buf)
            .await
            .map_err(|e| Error::External(format!("telegram download error: {e}")))?;

        tracing::debug!(file_id = file.as_str(), bytes = buf.len(), "downloaded file");
        Ok(buf)
    }
}
