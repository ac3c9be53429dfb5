//! Telegram update handlers.
//!
//! Every message and channel post is converted to a core `InboundMessage`
//! and handed to the relay router; the router owns all replies.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use crate::{inbound, router::AppState};

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let inbound = inbound::from_message(&msg);
    tracing::info!(
        chat_id = inbound.chat_id.0,
        message_id = inbound.message_id.0,
        kind = inbound.content.label(),
        grouped = inbound.group_id.is_some(),
        "received message"
    );

    state.router.route(inbound).await;
    Ok(())
}
