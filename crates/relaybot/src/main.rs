use std::sync::Arc;

use relaybot_core::{
    config::Config,
    services::{Transcriber, Translator},
};
use relaybot_openai::{OpenAiClient, OpenAiConfig};

#[tokio::main]
async fn main() -> Result<(), relaybot_core::Error> {
    relaybot_core::logging::init("relaybot")?;

    let cfg = Arc::new(Config::load()?);
    tracing::info!(
        model = %cfg.model,
        transcription_model = %cfg.transcription_model,
        media_group_timeout = ?cfg.media_group_timeout,
        "configuration loaded"
    );

    let openai = Arc::new(OpenAiClient::new(OpenAiConfig {
        api_key: cfg.openai_api_key.clone(),
        base_url: cfg.openai_base_url.clone(),
        model: cfg.model.clone(),
        system_prompt: cfg.system_prompt.clone(),
        transcription_model: cfg.transcription_model.clone(),
        timeout: cfg.request_timeout,
    })?);
    let translator: Arc<dyn Translator> = openai.clone();
    let transcriber: Arc<dyn Transcriber> = openai;

    relaybot_telegram::router::run_polling(cfg, translator, transcriber)
        .await
        .map_err(|e| relaybot_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
