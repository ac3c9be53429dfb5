use std::time::Duration;

use crate::{
    domain::{ChatId, MessageId},
    messaging::port::MessagingPort,
};

/// Length as Telegram counts it (UTF-16 code units).
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Split text into segments of at most `max_len` UTF-16 units.
///
/// Segments break at line boundaries (the newline at a break is dropped); a
/// single line longer than `max_len` is hard-split between characters. Text
/// that already fits is returned unchanged as the only segment.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    if utf16_len(text) <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    // `None` means no line is pending; `Some("")` is a pending empty line.
    let mut current: Option<(String, usize)> = None;

    for line in text.split('\n') {
        let line_len = utf16_len(line);

        if let Some((buf, len)) = current.as_mut() {
            if *len + 1 + line_len <= max_len {
                buf.push('\n');
                buf.push_str(line);
                *len += 1 + line_len;
                continue;
            }
        }

        if let Some((buf, _)) = current.take() {
            chunks.push(buf);
        }

        if line_len <= max_len {
            current = Some((line.to_string(), line_len));
        } else {
            chunks.extend(hard_split(line, max_len));
        }
    }

    if let Some((buf, _)) = current {
        chunks.push(buf);
    }
    chunks
}

/// A surrogate pair is never split, so with `max_len == 1` a non-BMP
/// character still becomes its own two-unit piece.
fn hard_split(line: &str, max_len: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut buf = String::new();
    let mut len = 0usize;

    for ch in line.chars() {
        let w = ch.len_utf16();
        if !buf.is_empty() && len + w > max_len {
            pieces.push(std::mem::take(&mut buf));
            len = 0;
        }
        buf.push(ch);
        len += w;
    }
    if !buf.is_empty() {
        pieces.push(buf);
    }
    pieces
}

/// Send long text as ordered segments, pausing `delay` between sends.
///
/// Best-effort: a failed segment is logged and the rest are still sent.
/// Returns the number of segments delivered.
pub async fn send_long(
    messenger: &dyn MessagingPort,
    chat_id: ChatId,
    text: &str,
    reply_to: Option<MessageId>,
    max_len: usize,
    delay: Duration,
) -> usize {
    let segments: Vec<String> = split_message(text, max_len)
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect();
    let total = segments.len();
    let mut sent = 0usize;

    for (idx, segment) in segments.iter().enumerate() {
        if idx > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match messenger.send_text(chat_id, segment, reply_to).await {
            Ok(_) => sent += 1,
            Err(e) => tracing::error!(
                chat_id = chat_id.0,
                segment = idx + 1,
                total,
                error = %e,
                "failed to send message chunk"
            ),
        }
    }
    sent
}
