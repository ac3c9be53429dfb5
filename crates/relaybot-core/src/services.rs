//! Ports for the external text/audio services.

use async_trait::async_trait;

use crate::Result;

/// Translates free text (into Persian, per the configured prompt).
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String>;
}

/// Speech-to-text over raw audio bytes.
///
/// `file_name` carries the container hint (`.ogg`, `.mp3`) the service needs.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> Result<String>;
}
