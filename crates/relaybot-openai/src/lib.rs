//! OpenAI adapter (translation + voice transcription).
//!
//! Translation uses `chat/completions`; transcription uses
//! `audio/transcriptions`. Any OpenAI-compatible base URL works.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use relaybot_core::{
    errors::Error,
    services::{Transcriber, Translator},
    Result,
};

/// Instruction line put in front of every text sent for translation.
const TRANSLATE_INSTRUCTION: &str =
    "متن رو به صورت تخصصی در حوضه بازار مالی ترجمه و مرتب کن: \n\n";
const TEMPERATURE: f32 = 0.3;

#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub system_prompt: String,
    pub transcription_model: String,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct OpenAiClient {
    cfg: OpenAiConfig,
    http: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

impl OpenAiClient {
    pub fn new(cfg: OpenAiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| Error::External(format!("http client build failed: {e}")))?;
        Ok(Self { cfg, http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.cfg.base_url.trim_end_matches('/'))
    }

    fn chat_request(&self, text: &str) -> ChatRequest<'_> {
        ChatRequest {
            model: &self.cfg.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Some(self.cfg.system_prompt.clone()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Some(format!("{TRANSLATE_INSTRUCTION}{text}")),
                },
            ],
            temperature: TEMPERATURE,
        }
    }

    async fn error_for_status(resp: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Err(Error::External(format!(
            "openai {what} failed: {status} {}",
            body.chars().take(200).collect::<String>()
        )))
    }
}

#[async_trait]
impl Translator for OpenAiClient {
    async fn translate(&self, text: &str) -> Result<String> {
        tracing::debug!(model = %self.cfg.model, chars = text.chars().count(), "requesting translation");

        let resp = self
            .http
            .post(self.url("chat/completions"))
            .bearer_auth(&self.cfg.api_key)
            .json(&self.chat_request(text))
            .send()
            .await
            .map_err(|e| Error::External(format!("openai request error: {e}")))?;
        let resp = Self::error_for_status(resp, "translation").await?;

        let body = resp
            .text()
            .await
            .map_err(|e| Error::External(format!("openai response error: {e}")))?;

        first_choice_text(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Transcriber for OpenAiClient {
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> Result<String> {
        tracing::debug!(
            model = %self.cfg.transcription_model,
            bytes = audio.len(),
            file_name,
            "requesting transcription"
        );

        let form = reqwest::multipart::Form::new()
            .text("model", self.cfg.transcription_model.clone())
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio)
                    .file_name(file_name.to_string())
                    .mime_str(mime_for(file_name))
                    .map_err(|e| Error::External(format!("openai multipart error: {e}")))?,
            );

        let resp = self
            .http
            .post(self.url("audio/transcriptions"))
            .bearer_auth(&self.cfg.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::External(format!("openai request error: {e}")))?;
        let resp = Self::error_for_status(resp, "transcription").await?;

        let body: TranscriptionResponse = serde_json::from_str(
            &resp
                .text()
                .await
                .map_err(|e| Error::External(format!("openai response error: {e}")))?,
        )?;

        if body.text.trim().is_empty() {
            return Err(Error::External(
                "openai transcription returned empty text".to_string(),
            ));
        }
        Ok(body.text)
    }
}

fn first_choice_text(body: ChatResponse) -> Result<String> {
    let text = body
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(Error::External(
            "openai translation returned empty text".to_string(),
        ));
    }
    Ok(text)
}

fn mime_for(file_name: &str) -> &'static str {
    let lower = file_name.to_ascii_lowercase();
    match lower.rsplit_once('.').map(|(_, ext)| ext) {
        Some("ogg") | Some("oga") | Some("opus") => "audio/ogg",
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        Some("wav") => "audio/wav",
        _ => "application/octet-stream",
    }
}
