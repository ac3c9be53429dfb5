//! Fixed user-facing texts.

/// Substituted for a translation when the translator fails.
pub const TRANSLATION_FAILED: &str = "مشکلی در ترجمه متن پیش آمد!";

/// Caption placeholder for photos, videos and documents inside a media group.
pub const GROUP_CAPTION: &str = "ترجمه شد!";
/// Caption placeholder for audio inside a media group.
pub const GROUP_AUDIO_CAPTION: &str = "اهنگ ترجمه شد!";

pub const TEXT_FAILED: &str = "Failed to translate your message.";
pub const PHOTO_FAILED: &str = "Failed to send the translated photo.";
pub const VIDEO_FAILED: &str = "Failed to send the translated video.";
pub const DOCUMENT_FAILED: &str = "Failed to send the translated document.";
pub const AUDIO_FAILED: &str = "Failed to send the translated audio.";
pub const TRANSCRIPTION_FAILED: &str = "Failed to transcribe the audio.";
pub const MEDIA_GROUP_FAILED: &str = "Failed to send the translated media group.";
pub const UNSUPPORTED: &str = "Unsupported message type. Please send text or media with captions.";
pub const GENERIC_ERROR: &str = "An error occurred while processing your message.";
