use std::{sync::Arc, time::Duration};

use crate::{
    aggregator::{BoxFuture, Buffered, FlushFn, FlushedGroup, MediaGroupAggregator},
    messaging::types::InboundMessage,
    pipeline::Pipeline,
    security::AccessPolicy,
};

/// Entry point for every inbound message.
///
/// Grouped messages are buffered; everything else runs through the
/// single-message pipeline. Failures end here as one notice to the chat.
pub struct Router {
    pipeline: Arc<Pipeline>,
    groups: Arc<MediaGroupAggregator>,
    access: AccessPolicy,
}

impl Router {
    pub fn new(pipeline: Arc<Pipeline>, access: AccessPolicy, group_window: Duration) -> Self {
        let flusher = Arc::clone(&pipeline);
        let flush: FlushFn = Arc::new(move |group: FlushedGroup| {
            let pipeline = Arc::clone(&flusher);
            let fut: BoxFuture = Box::pin(async move {
                pipeline.flush_group(group).await;
            });
            fut
        });

        Self {
            pipeline,
            groups: MediaGroupAggregator::new(group_window, flush),
            access,
        }
    }

    pub fn groups(&self) -> &Arc<MediaGroupAggregator> {
        &self.groups
    }

    pub async fn route(&self, msg: InboundMessage) {
        if !self.access.allows(&msg) {
            tracing::warn!(
                chat_id = msg.chat_id.0,
                sender = ?msg.sender.map(|u| u.0),
                "message rejected by allow-list"
            );
            return;
        }

        if let Some(group_id) = msg.group_id.clone() {
            let message_id = msg.message_id.0;
            match self.groups.insert(group_id.clone(), msg).await {
                Buffered::Started { generation } => tracing::debug!(
                    group_id = %group_id,
                    generation,
                    message_id,
                    "started media group buffer"
                ),
                Buffered::Appended { len, .. } => tracing::debug!(
                    group_id = %group_id,
                    len,
                    message_id,
                    "appended to media group buffer"
                ),
            }
            return;
        }

        if let Err(failure) = self.pipeline.handle_single(&msg).await {
            self.pipeline.report(msg.message_ref(), &failure).await;
        }
    }

    /// Flush every buffered group before the process exits.
    pub async fn shutdown(&self) {
        self.groups.shutdown().await;
    }
}
