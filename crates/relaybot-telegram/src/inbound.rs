//! teloxide `Message` -> core `InboundMessage`.

use teloxide::types::Message;

use relaybot_core::{
    domain::{ChatId, FileRef, GroupId, MessageId, UserId},
    messaging::types::{ChatKind, Content, InboundMessage},
};

pub fn chat_kind(msg: &Message) -> ChatKind {
    if msg.chat.is_channel() {
        ChatKind::Channel
    } else if msg.chat.is_group() || msg.chat.is_supergroup() {
        ChatKind::Group
    } else {
        ChatKind::Private
    }
}

/// First matching kind wins; captions are carried separately.
pub fn content(msg: &Message) -> Content {
    if let Some(text) = msg.text() {
        return Content::Text(text.to_string());
    }
    if let Some(sizes) = msg.photo() {
        return Content::Photo(
            sizes
                .iter()
                .map(|p| FileRef(p.file.id.clone()))
                .collect(),
        );
    }
    if let Some(video) = msg.video() {
        return Content::Video(FileRef(video.file.id.clone()));
    }
    if let Some(audio) = msg.audio() {
        return Content::Audio(FileRef(audio.file.id.clone()));
    }
    if let Some(doc) = msg.document() {
        return Content::Document(FileRef(doc.file.id.clone()));
    }
    if let Some(voice) = msg.voice() {
        return Content::Voice(FileRef(voice.file.id.clone()));
    }
    if let Some(note) = msg.video_note() {
        return Content::VideoNote(FileRef(note.file.id.clone()));
    }
    Content::Unsupported
}

pub fn from_message(msg: &Message) -> InboundMessage {
    InboundMessage {
        message_id: MessageId(msg.id.0),
        chat_id: ChatId(msg.chat.id.0),
        chat_kind: chat_kind(msg),
        sender: msg.from().map(|u| UserId(u.id.0 as i64)),
        group_id: msg.media_group_id().map(|g| GroupId(g.to_string())),
        caption: msg.caption().map(str::to_string),
        content: content(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Message {
        serde_json::from_value(value).expect("deserialize message")
    }

    fn private_base() -> serde_json::Value {
        json!({
            "message_id": 11,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Sara" },
            "from": { "id": 1001, "is_bot": false, "first_name": "Sara" }
        })
    }

    fn with(mut base: serde_json::Value, key: &str, value: serde_json::Value) -> Message {
        base[key] = value;
        parse(base)
    }

    #[test]
    fn text_message_is_mapped() {
        let msg = with(private_base(), "text", json!("Oil prices fell."));
        let inbound = from_message(&msg);

        assert_eq!(inbound.message_id, MessageId(11));
        assert_eq!(inbound.chat_id, ChatId(42));
        assert_eq!(inbound.chat_kind, ChatKind::Private);
        assert_eq!(inbound.sender, Some(UserId(1001)));
        assert_eq!(inbound.group_id, None);
        assert_eq!(inbound.content, Content::Text("Oil prices fell.".into()));
    }

    #[test]
    fn grouped_photo_keeps_variants_caption_and_group() {
        let mut base = private_base();
        base["media_group_id"] = json!("13579");
        base["caption"] = json!("Q3 results");
        let msg = with(
            base,
            "photo",
            json!([
                { "file_id": "small", "file_unique_id": "s", "width": 90, "height": 90 },
                { "file_id": "large", "file_unique_id": "l", "width": 1280, "height": 1280 }
            ]),
        );
        let inbound = from_message(&msg);

        assert_eq!(inbound.group_id, Some(GroupId("13579".into())));
        assert_eq!(inbound.caption.as_deref(), Some("Q3 results"));
        assert_eq!(
            inbound.content,
            Content::Photo(vec![FileRef("small".into()), FileRef("large".into())])
        );
    }

    #[test]
    fn voice_is_mapped() {
        let msg = with(
            private_base(),
            "voice",
            json!({
                "file_id": "voice-file-id",
                "file_unique_id": "voice-unique-id",
                "duration": 3,
                "mime_type": "audio/ogg",
                "file_size": 123
            }),
        );
        assert_eq!(
            content(&msg),
            Content::Voice(FileRef("voice-file-id".into()))
        );
    }

    #[test]
    fn video_note_is_mapped() {
        let msg = with(
            private_base(),
            "video_note",
            json!({
                "file_id": "note-id",
                "file_unique_id": "note-unique",
                "length": 240,
                "duration": 5
            }),
        );
        assert_eq!(content(&msg), Content::VideoNote(FileRef("note-id".into())));
    }

    #[test]
    fn contact_is_unsupported() {
        let msg = with(
            private_base(),
            "contact",
            json!({ "phone_number": "+100000", "first_name": "Desk" }),
        );
        assert_eq!(content(&msg), Content::Unsupported);
    }

    #[test]
    fn channel_post_has_no_sender() {
        let msg = parse(json!({
            "message_id": 5,
            "date": 1,
            "chat": { "id": -1001234, "type": "channel", "title": "Markets" },
            "text": "Breaking"
        }));
        let inbound = from_message(&msg);

        assert_eq!(inbound.chat_kind, ChatKind::Channel);
        assert_eq!(inbound.sender, None);
        assert_eq!(inbound.chat_id, ChatId(-1001234));
    }

    #[test]
    fn supergroup_is_a_group() {
        let msg = parse(json!({
            "message_id": 6,
            "date": 1,
            "chat": { "id": -100999, "type": "supergroup", "title": "Desk" },
            "from": { "id": 7, "is_bot": false, "first_name": "Ali" },
            "text": "hi"
        }));
        assert_eq!(chat_kind(&msg), ChatKind::Group);
    }
}
