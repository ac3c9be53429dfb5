use crate::domain::{ChatId, FileRef, GroupId, MessageId, MessageRef, UserId};

/// What kind of chat a message arrived in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Channel,
}

/// Cross-messenger incoming message.
///
/// Telegram-specific fields live in the Telegram adapter; this is the
/// immutable snapshot the relay works from.
#[derive(Clone, Debug)]
pub struct InboundMessage {
    pub message_id: MessageId,
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    pub sender: Option<UserId>,
    pub group_id: Option<GroupId>,
    pub caption: Option<String>,
    pub content: Content,
}

impl InboundMessage {
    pub fn message_ref(&self) -> MessageRef {
        MessageRef {
            chat_id: self.chat_id,
            message_id: self.message_id,
        }
    }

    /// Caption with surrounding whitespace removed, if any is left.
    pub fn caption_text(&self) -> Option<&str> {
        self.caption
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Exactly one content kind per message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content {
    Text(String),
    /// Resolution-ordered variants, smallest first.
    Photo(Vec<FileRef>),
    Video(FileRef),
    Audio(FileRef),
    Document(FileRef),
    Voice(FileRef),
    VideoNote(FileRef),
    Unsupported,
}

impl Content {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Photo(_) => "photo",
            Self::Video(_) => "video",
            Self::Audio(_) => "audio",
            Self::Document(_) => "document",
            Self::Voice(_) => "voice",
            Self::VideoNote(_) => "video_note",
            Self::Unsupported => "unsupported",
        }
    }
}

/// Media kinds that can be forwarded by reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
    Audio,
    Document,
}

/// A media item re-sent by file reference with a replacement caption.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMedia {
    pub kind: MediaKind,
    pub file: FileRef,
    pub caption: Option<String>,
}

/// Result of transforming one inbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutboundItem {
    /// Single text reply.
    Text(String),
    /// Transcript text, split by the chunked sender when long.
    LongText(String),
    Media(OutboundMedia),
}

/// Ordered media items sent as one combined post.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundBatch {
    pub chat_id: ChatId,
    pub reply_to: MessageId,
    pub items: Vec<OutboundMedia>,
}

/// Capabilities / limits of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub max_message_len: usize,
    pub max_media_group_len: usize,
}
