//! Fake collaborators shared by the unit tests.

use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, FileRef, GroupId, MessageId, MessageRef, UserId},
    errors::Error,
    media::AudioExtractor,
    messaging::{
        port::MessagingPort,
        types::{ChatKind, Content, InboundMessage, MessagingCapabilities, OutboundMedia},
    },
    services::{Transcriber, Translator},
    Result,
};

pub fn message(id: i32, content: Content) -> InboundMessage {
    InboundMessage {
        message_id: MessageId(id),
        chat_id: ChatId(100),
        chat_kind: ChatKind::Private,
        sender: Some(UserId(7)),
        group_id: None,
        caption: None,
        content,
    }
}

pub fn text_message(id: i32, text: &str) -> InboundMessage {
    message(id, Content::Text(text.to_string()))
}

pub fn grouped(mut msg: InboundMessage, group: &str, caption: Option<&str>) -> InboundMessage {
    msg.group_id = Some(GroupId(group.to_string()));
    msg.caption = caption.map(str::to_string);
    msg
}

pub fn photo(id: i32) -> InboundMessage {
    message(
        id,
        Content::Photo(vec![
            FileRef(format!("photo{id}_small")),
            FileRef(format!("photo{id}_large")),
        ]),
    )
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sent {
    Text(String),
    Media(OutboundMedia),
    Group(Vec<OutboundMedia>),
}

#[derive(Clone, Debug)]
pub struct SentMessage {
    pub chat_id: ChatId,
    pub reply_to: Option<MessageId>,
    pub body: Sent,
}

/// Records every successful send; failures are scripted per call type.
#[derive(Default)]
pub struct RecordingMessenger {
    next_id: AtomicI32,
    max_message_len: AtomicUsize,
    sent: Mutex<Vec<SentMessage>>,
    fail_text: Mutex<Vec<String>>,
    fail_media: AtomicBool,
    fail_groups: AtomicBool,
    fail_downloads: AtomicBool,
    downloads: Mutex<Vec<FileRef>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI32::new(1000),
            max_message_len: AtomicUsize::new(4096),
            ..Default::default()
        }
    }

    pub fn set_max_message_len(&self, max: usize) {
        self.max_message_len.store(max, Ordering::SeqCst);
    }

    pub fn fail_text_containing(&self, needle: &str) {
        self.fail_text.lock().unwrap().push(needle.to_string());
    }

    pub fn fail_media(&self) {
        self.fail_media.store(true, Ordering::SeqCst);
    }

    pub fn fail_groups(&self) {
        self.fail_groups.store(true, Ordering::SeqCst);
    }

    pub fn fail_downloads(&self) {
        self.fail_downloads.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s.body {
                Sent::Text(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn groups(&self) -> Vec<(Option<MessageId>, Vec<OutboundMedia>)> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s.body {
                Sent::Group(items) => Some((s.reply_to, items)),
                _ => None,
            })
            .collect()
    }

    pub fn downloads(&self) -> Vec<FileRef> {
        self.downloads.lock().unwrap().clone()
    }

    fn record(&self, chat_id: ChatId, reply_to: Option<MessageId>, body: Sent) -> MessageRef {
        self.sent.lock().unwrap().push(SentMessage {
            chat_id,
            reply_to,
            body,
        });
        MessageRef {
            chat_id,
            message_id: MessageId(self.next_id.fetch_add(1, Ordering::SeqCst)),
        }
    }
}

#[async_trait]
impl MessagingPort for RecordingMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            max_message_len: self.max_message_len.load(Ordering::SeqCst),
            max_media_group_len: 10,
        }
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef> {
        if self
            .fail_text
            .lock()
            .unwrap()
            .iter()
            .any(|n| text.contains(n.as_str()))
        {
            return Err(Error::External("scripted text failure".to_string()));
        }
        Ok(self.record(chat_id, reply_to, Sent::Text(text.to_string())))
    }

    async fn send_media(
        &self,
        chat_id: ChatId,
        media: &OutboundMedia,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef> {
        if self.fail_media.load(Ordering::SeqCst) {
            return Err(Error::External("scripted media failure".to_string()));
        }
        Ok(self.record(chat_id, reply_to, Sent::Media(media.clone())))
    }

    async fn send_media_group(
        &self,
        chat_id: ChatId,
        items: &[OutboundMedia],
        reply_to: Option<MessageId>,
    ) -> Result<Vec<MessageRef>> {
        if self.fail_groups.load(Ordering::SeqCst) {
            return Err(Error::External("scripted group failure".to_string()));
        }
        Ok(vec![self.record(chat_id, reply_to, Sent::Group(items.to_vec()))])
    }

    async fn download_file(&self, file: &FileRef) -> Result<Vec<u8>> {
        self.downloads.lock().unwrap().push(file.clone());
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(Error::External("scripted download failure".to_string()));
        }
        Ok(format!("bytes:{}", file.as_str()).into_bytes())
    }
}

/// Prefixes input with `fa:`; can be switched to fail.
#[derive(Default)]
pub struct FakeTranslator {
    fail: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl FakeTranslator {
    pub fn failing() -> Self {
        let t = Self::default();
        t.fail.store(true, Ordering::SeqCst);
        t
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        self.calls.lock().unwrap().push(text.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::External("translator down".to_string()));
        }
        Ok(format!("fa:{text}"))
    }
}

/// Returns `transcript(<file name>)`, or a fixed long transcript when set.
#[derive(Default)]
pub struct FakeTranscriber {
    fail: AtomicBool,
    long_output: Mutex<Option<String>>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl FakeTranscriber {
    pub fn failing() -> Self {
        let t = Self::default();
        t.fail.store(true, Ordering::SeqCst);
        t
    }

    pub fn returning(text: String) -> Self {
        let t = Self::default();
        *t.long_output.lock().unwrap() = Some(text);
        t
    }

    /// `(file_name, byte_len)` per call.
    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((file_name.to_string(), audio.len()));
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::External("stt down".to_string()));
        }
        if let Some(text) = self.long_output.lock().unwrap().clone() {
            return Ok(text);
        }
        Ok(format!("transcript({file_name})"))
    }
}

/// Writes a stub mp3 next to the video, or fails after checking the input.
#[derive(Default)]
pub struct FakeExtractor {
    fail: AtomicBool,
    calls: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl FakeExtractor {
    pub fn failing() -> Self {
        let e = Self::default();
        e.fail.store(true, Ordering::SeqCst);
        e
    }

    pub fn calls(&self) -> Vec<(PathBuf, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioExtractor for FakeExtractor {
    async fn extract(&self, video: &Path, audio: &Path) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((video.to_path_buf(), audio.to_path_buf()));
        if !video.exists() {
            return Err(Error::External("video file missing".to_string()));
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::External("extraction failed".to_string()));
        }
        tokio::fs::write(audio, b"mp3-bytes").await?;
        Ok(())
    }
}
