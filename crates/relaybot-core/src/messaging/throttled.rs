use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    domain::{ChatId, FileRef, MessageId, MessageRef},
    messaging::{
        port::MessagingPort,
        types::{MessagingCapabilities, OutboundMedia},
    },
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between *any* outbound sends (global flood control).
    pub global_min_interval: Duration,
    /// Minimum spacing between sends to one chat.
    pub per_chat_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_min_interval: Duration::from_millis(40), // ~25/sec
            per_chat_min_interval: Duration::from_millis(50),
        }
    }
}

/// Next free send slot, globally and per chat.
#[derive(Debug, Default)]
struct Slots {
    global: Option<Instant>,
    chats: HashMap<ChatId, Instant>,
}

impl Slots {
    /// Book the next global slot and the next slot for `chat_id`, each on its
    /// own clock, and return how long to wait until both are open.
    fn reserve(&mut self, cfg: &ThrottleConfig, chat_id: ChatId, now: Instant) -> Duration {
        let global = self.global.map_or(now, |next| next.max(now));
        self.global = Some(global + cfg.global_min_interval);

        let chat = self.chats.get(&chat_id).map_or(now, |next| (*next).max(now));
        self.chats.insert(chat_id, chat + cfg.per_chat_min_interval);
        // Entries already in the past carry no constraint.
        self.chats.retain(|_, next| *next > now);

        global.max(chat).saturating_duration_since(now)
    }
}

/// MessagingPort decorator that spaces outbound sends.
///
/// Best-effort defense against Telegram 429 errors. It never retries; file
/// downloads pass through unthrottled.
pub struct ThrottledMessenger {
    inner: Arc<dyn MessagingPort>,
    cfg: ThrottleConfig,
    slots: Mutex<Slots>,
}

impl ThrottledMessenger {
    pub fn new(inner: Arc<dyn MessagingPort>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            cfg,
            slots: Mutex::new(Slots::default()),
        }
    }

    async fn wait_turn(&self, chat_id: ChatId) {
        let wait = self
            .slots
            .lock()
            .await
            .reserve(&self.cfg, chat_id, Instant::now());
        if !wait.is_zero() {
            tracing::trace!(chat_id = chat_id.0, wait = ?wait, "throttling send");
            sleep(wait).await;
        }
    }
}

#[async_trait]
impl MessagingPort for ThrottledMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        self.inner.capabilities()
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef> {
        self.wait_turn(chat_id).await;
        self.inner.send_text(chat_id, text, reply_to).await
    }

    async fn send_media(
        &self,
        chat_id: ChatId,
        media: &OutboundMedia,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef> {
        self.wait_turn(chat_id).await;
        self.inner.send_media(chat_id, media, reply_to).await
    }

    async fn send_media_group(
        &self,
        chat_id: ChatId,
        items: &[OutboundMedia],
        reply_to: Option<MessageId>,
    ) -> Result<Vec<MessageRef>> {
        self.wait_turn(chat_id).await;
        self.inner.send_media_group(chat_id, items, reply_to).await
    }

    async fn download_file(&self, file: &FileRef) -> Result<Vec<u8>> {
        self.inner.download_file(file).await
    }
}
