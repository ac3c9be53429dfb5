//! Per-message relay pipeline: transform one inbound message, deliver the
//! result, and the batch variant used when a media group is flushed.

use std::{path::PathBuf, sync::Arc, time::Duration};

use crate::{
    aggregator::FlushedGroup,
    chunking::send_long,
    domain::{FileRef, MessageRef},
    errors::{Error, Failure, SendKind},
    media::{AudioExtractor, VideoNoteFiles},
    messaging::{
        port::MessagingPort,
        types::{Content, InboundMessage, MediaKind, OutboundBatch, OutboundItem, OutboundMedia},
    },
    notices,
    services::{Transcriber, Translator},
};

#[derive(Clone, Debug)]
pub struct PipelineSettings {
    pub chunk_delay: Duration,
    pub temp_dir: PathBuf,
}

pub struct Pipeline {
    messenger: Arc<dyn MessagingPort>,
    translator: Arc<dyn Translator>,
    transcriber: Arc<dyn Transcriber>,
    extractor: Arc<dyn AudioExtractor>,
    settings: PipelineSettings,
}

/// How one buffered message contributes to a media-group flush.
#[derive(Clone, Debug, PartialEq, Eq)]
enum BatchStep {
    Media(OutboundMedia),
    /// Transcribed and answered on its own, outside the combined post.
    Voice,
    Skip,
}

impl Pipeline {
    pub fn new(
        messenger: Arc<dyn MessagingPort>,
        translator: Arc<dyn Translator>,
        transcriber: Arc<dyn Transcriber>,
        extractor: Arc<dyn AudioExtractor>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            messenger,
            translator,
            transcriber,
            extractor,
            settings,
        }
    }

    /// Transform and deliver a message that is not part of a media group.
    pub async fn handle_single(&self, msg: &InboundMessage) -> Result<(), Failure> {
        let item = self.transform(msg).await?;
        self.deliver(msg, item).await
    }

    /// Produce the outbound content for one message.
    pub async fn transform(&self, msg: &InboundMessage) -> Result<OutboundItem, Failure> {
        match &msg.content {
            Content::Text(text) => Ok(OutboundItem::Text(self.translate_or_notice(text).await)),
            Content::Photo(variants) => {
                let best = variants.last().ok_or_else(|| {
                    Failure::Unexpected(Error::External("photo has no size variants".to_string()))
                })?;
                self.forward(msg, MediaKind::Photo, best).await
            }
            Content::Video(file) => self.forward(msg, MediaKind::Video, file).await,
            Content::Document(_) => match msg.caption_text() {
                // Captioned documents get a text-only reply; the file is not re-sent.
                Some(caption) => Ok(OutboundItem::Text(self.translate_or_notice(caption).await)),
                None => Err(Failure::send(
                    SendKind::Media(MediaKind::Document),
                    Error::External("document has no caption to translate".to_string()),
                )),
            },
            Content::Audio(file) => {
                let audio = self.download(file).await?;
                let text = self.transcribe_and_translate(audio, "audio.mp3").await?;
                Ok(OutboundItem::LongText(text))
            }
            Content::Voice(file) => {
                let audio = self.download(file).await?;
                let text = self
                    .transcribe_and_translate(audio, "voice_message.ogg")
                    .await?;
                Ok(OutboundItem::Text(text))
            }
            Content::VideoNote(file) => self.transform_video_note(file).await.map(OutboundItem::Text),
            Content::Unsupported => Err(Failure::Unsupported),
        }
    }

    /// Send a transformed item back to the originating chat as a reply.
    pub async fn deliver(&self, msg: &InboundMessage, item: OutboundItem) -> Result<(), Failure> {
        let kind = send_kind(&msg.content);
        let chat_id = msg.chat_id;
        let reply_to = Some(msg.message_id);

        match item {
            OutboundItem::Text(text) => {
                self.messenger
                    .send_text(chat_id, &text, reply_to)
                    .await
                    .map_err(|e| Failure::send(kind, e))?;
            }
            OutboundItem::LongText(text) => {
                let sent = send_long(
                    self.messenger.as_ref(),
                    chat_id,
                    &text,
                    reply_to,
                    self.messenger.capabilities().max_message_len,
                    self.settings.chunk_delay,
                )
                .await;
                if sent == 0 {
                    return Err(Failure::send(
                        kind,
                        Error::External("no transcript segment was delivered".to_string()),
                    ));
                }
            }
            OutboundItem::Media(media) => {
                self.messenger
                    .send_media(chat_id, &media, reply_to)
                    .await
                    .map_err(|e| Failure::send(kind, e))?;
            }
        }

        tracing::info!(
            chat_id = chat_id.0,
            kind = msg.content.label(),
            "sent translated message"
        );
        Ok(())
    }

    /// Emit a flushed media group as one combined post.
    ///
    /// Captions get a fixed placeholder; voice notes are transcribed inline and
    /// answered individually. Nothing is sent when no media item remains.
    pub async fn flush_group(&self, group: FlushedGroup) {
        let Some(first) = group.messages.first() else {
            tracing::warn!(group_id = %group.group_id, "no messages found for media group");
            return;
        };
        let reply_to = first.message_id;

        let mut items = Vec::with_capacity(group.messages.len());
        for msg in &group.messages {
            match batch_step(msg) {
                BatchStep::Media(media) => items.push(media),
                BatchStep::Voice => {
                    if let Err(failure) = self.handle_single(msg).await {
                        self.report(msg.message_ref(), &failure).await;
                    }
                }
                BatchStep::Skip => tracing::warn!(
                    group_id = %group.group_id,
                    message_id = msg.message_id.0,
                    kind = msg.content.label(),
                    "unsupported media type in group; skipping"
                ),
            }
        }

        if items.is_empty() {
            tracing::info!(group_id = %group.group_id, "media group produced no items to send");
            return;
        }

        let batch = OutboundBatch {
            chat_id: group.chat_id,
            reply_to,
            items,
        };
        let count = batch.items.len();
        match self.send_batch(&batch).await {
            Ok(()) => tracing::info!(
                chat_id = batch.chat_id.0,
                group_id = %group.group_id,
                items = count,
                "sent translated media group"
            ),
            Err(failure) => {
                let origin = MessageRef {
                    chat_id: batch.chat_id,
                    message_id: batch.reply_to,
                };
                self.report(origin, &failure).await;
            }
        }
    }

    /// Log a failure and send its notice as a reply to `origin`.
    pub async fn report(&self, origin: MessageRef, failure: &Failure) {
        match failure {
            Failure::Unsupported => tracing::warn!(
                chat_id = origin.chat_id.0,
                "received unsupported message type"
            ),
            other => tracing::error!(
                chat_id = origin.chat_id.0,
                message_id = origin.message_id.0,
                error = %other,
                "relay failed"
            ),
        }

        if let Err(e) = self
            .messenger
            .send_text(origin.chat_id, failure.notice(), Some(origin.message_id))
            .await
        {
            tracing::error!(chat_id = origin.chat_id.0, error = %e, "failed to send failure notice");
        }
    }

    async fn send_batch(&self, batch: &OutboundBatch) -> Result<(), Failure> {
        let reply_to = Some(batch.reply_to);
        // Telegram rejects albums with fewer than two items.
        if let [single] = batch.items.as_slice() {
            self.messenger
                .send_media(batch.chat_id, single, reply_to)
                .await
                .map_err(Failure::Batch)?;
            return Ok(());
        }

        let max = self.messenger.capabilities().max_media_group_len.max(2);
        for part in batch.items.chunks(max) {
            self.messenger
                .send_media_group(batch.chat_id, part, reply_to)
                .await
                .map_err(Failure::Batch)?;
        }
        Ok(())
    }

    async fn forward(
        &self,
        msg: &InboundMessage,
        kind: MediaKind,
        file: &FileRef,
    ) -> Result<OutboundItem, Failure> {
        let caption = match msg.caption_text() {
            Some(c) => Some(self.translate_or_notice(c).await),
            None => None,
        };
        Ok(OutboundItem::Media(OutboundMedia {
            kind,
            file: file.clone(),
            caption,
        }))
    }

    async fn transform_video_note(&self, file: &FileRef) -> Result<String, Failure> {
        let files = VideoNoteFiles::new(&self.settings.temp_dir, file);

        let video = self.download(file).await?;
        tokio::fs::write(&files.video, video)
            .await
            .map_err(|e| Failure::Unexpected(e.into()))?;
        self.extractor
            .extract(&files.video, &files.audio)
            .await
            .map_err(Failure::Unexpected)?;
        let audio = tokio::fs::read(&files.audio)
            .await
            .map_err(|e| Failure::Unexpected(e.into()))?;

        self.transcribe_and_translate(audio, &files.audio_file_name())
            .await
    }

    async fn download(&self, file: &FileRef) -> Result<Vec<u8>, Failure> {
        self.messenger
            .download_file(file)
            .await
            .map_err(Failure::Unexpected)
    }

    async fn transcribe_and_translate(
        &self,
        audio: Vec<u8>,
        file_name: &str,
    ) -> Result<String, Failure> {
        let transcript = self
            .transcriber
            .transcribe(audio, file_name)
            .await
            .map_err(Failure::Transcription)?;
        Ok(self.translate_or_notice(&transcript).await)
    }

    async fn translate_or_notice(&self, text: &str) -> String {
        match self.translator.translate(text).await {
            Ok(translated) => translated,
            Err(e) => {
                tracing::error!(error = %e, "translation failed");
                notices::TRANSLATION_FAILED.to_string()
            }
        }
    }
}

fn send_kind(content: &Content) -> SendKind {
    match content {
        Content::Photo(_) => SendKind::Media(MediaKind::Photo),
        Content::Video(_) => SendKind::Media(MediaKind::Video),
        Content::Document(_) => SendKind::Media(MediaKind::Document),
        Content::Audio(_) => SendKind::Media(MediaKind::Audio),
        Content::Voice(_) | Content::VideoNote(_) => SendKind::Transcript,
        Content::Text(_) | Content::Unsupported => SendKind::Text,
    }
}

fn batch_step(msg: &InboundMessage) -> BatchStep {
    let media = |kind: MediaKind, file: &FileRef, placeholder: &str| {
        BatchStep::Media(OutboundMedia {
            kind,
            file: file.clone(),
            caption: msg.caption_text().map(|_| placeholder.to_string()),
        })
    };

    match &msg.content {
        Content::Photo(variants) => match variants.last() {
            Some(best) => media(MediaKind::Photo, best, notices::GROUP_CAPTION),
            None => BatchStep::Skip,
        },
        Content::Video(file) => media(MediaKind::Video, file, notices::GROUP_CAPTION),
        Content::Audio(file) => media(MediaKind::Audio, file, notices::GROUP_AUDIO_CAPTION),
        Content::Document(file) => media(MediaKind::Document, file, notices::GROUP_CAPTION),
        Content::Voice(_) => BatchStep::Voice,
        Content::Text(_) | Content::VideoNote(_) | Content::Unsupported => BatchStep::Skip,
    }
}
