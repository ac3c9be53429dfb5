use crate::{messaging::types::MediaKind, notices};

/// Core error type.
///
/// Adapter crates map their specific errors into this type so the relay
/// pipeline can handle failures consistently.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// What went wrong while relaying one message.
///
/// Every pipeline operation returns one of these on failure; the router's
/// reporter turns it into exactly one user-visible notice.
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    /// The outbound send for this kind of content was rejected.
    #[error("failed to send {kind:?}: {source}")]
    Send { kind: SendKind, source: Error },

    #[error("transcription failed: {0}")]
    Transcription(Error),

    #[error("unsupported message type")]
    Unsupported,

    /// Download, extraction or anything else the pipeline did not anticipate.
    #[error("unexpected failure: {0}")]
    Unexpected(Error),

    #[error("failed to send media group: {0}")]
    Batch(Error),
}

/// Which delivery path a send failure came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendKind {
    Text,
    Media(MediaKind),
    Transcript,
}

impl Failure {
    pub fn send(kind: SendKind, source: Error) -> Self {
        Self::Send { kind, source }
    }

    /// Fixed notice text shown to the chat for this failure.
    pub fn notice(&self) -> &'static str {
        match self {
            Self::Send { kind, .. } => match kind {
                SendKind::Text => notices::TEXT_FAILED,
                SendKind::Media(MediaKind::Photo) => notices::PHOTO_FAILED,
                SendKind::Media(MediaKind::Video) => notices::VIDEO_FAILED,
                SendKind::Media(MediaKind::Document) => notices::DOCUMENT_FAILED,
                SendKind::Media(MediaKind::Audio) | SendKind::Transcript => notices::AUDIO_FAILED,
            },
            Self::Transcription(_) => notices::TRANSCRIPTION_FAILED,
            Self::Unsupported => notices::UNSUPPORTED,
            Self::Unexpected(_) => notices::GENERIC_ERROR,
            Self::Batch(_) => notices::MEDIA_GROUP_FAILED,
        }
    }
}
