use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, error_handlers::LoggingErrorHandler, prelude::*};

use relaybot_core::{
    config::Config,
    media::FfmpegExtractor,
    messaging::{
        port::MessagingPort,
        throttled::{ThrottleConfig, ThrottledMessenger},
    },
    pipeline::{Pipeline, PipelineSettings},
    router::Router,
    services::{Transcriber, Translator},
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
}

pub async fn run_polling(
    cfg: Arc<Config>,
    translator: Arc<dyn Translator>,
    transcriber: Arc<dyn Transcriber>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => tracing::info!(username = %me.username(), "relaybot started"),
        Err(e) => tracing::warn!(error = %e, "get_me failed; continuing"),
    }
    let access = cfg.access_policy();
    if access.is_open() {
        tracing::info!("no allow-lists configured; relaying every chat");
    } else {
        tracing::info!(
            users = cfg.allowed_users.len(),
            groups = cfg.allowed_groups.len(),
            channels = cfg.allowed_channels.len(),
            "allow-lists active"
        );
    }

    // Album flushes and chunked replies burst; the decorator keeps us under flood limits.
    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(
        bot.clone(),
        cfg.telegram_message_limit,
    ));
    let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
        raw_messenger,
        ThrottleConfig::default(),
    ));

    let pipeline = Arc::new(Pipeline::new(
        messenger,
        translator,
        transcriber,
        Arc::new(FfmpegExtractor::new(cfg.ffmpeg_path.clone())),
        PipelineSettings {
            chunk_delay: cfg.chunk_delay,
            temp_dir: cfg.temp_dir.clone(),
        },
    ));
    let router = Arc::new(Router::new(pipeline, access, cfg.media_group_timeout));

    let state = Arc::new(AppState {
        router: router.clone(),
    });

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handlers::handle_message))
        .branch(Update::filter_channel_post().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            tracing::debug!(update_id = upd.id, "ignoring update");
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "error in update handler",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    tracing::info!("dispatcher stopped; draining media groups");
    router.shutdown().await;
    Ok(())
}
