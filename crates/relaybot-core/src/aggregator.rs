use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc, time::Duration};

use tokio::{sync::Mutex, time::Instant};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::{
    domain::{ChatId, GroupId},
    messaging::types::InboundMessage,
};

pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;
pub type FlushFn = Arc<dyn Fn(FlushedGroup) -> BoxFuture + Send + Sync>;

/// A group taken out of the live set, handed to the flush callback.
#[derive(Debug)]
pub struct FlushedGroup {
    pub group_id: GroupId,
    pub chat_id: ChatId,
    pub generation: u64,
    pub created_at: Instant,
    /// Arrival order.
    pub messages: Vec<InboundMessage>,
}

/// Outcome of buffering one message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Buffered {
    /// First message of a new buffer; its timer is now running.
    Started { generation: u64 },
    Appended { generation: u64, len: usize },
}

struct PendingGroup {
    chat_id: ChatId,
    generation: u64,
    created_at: Instant,
    messages: Vec<InboundMessage>,
}

#[derive(Default)]
struct Groups {
    pending: HashMap<GroupId, PendingGroup>,
    next_generation: u64,
}

/// Buffers media-group items for a fixed window measured from the first
/// arrival, then hands each group to the flush callback exactly once.
///
/// A message for a group id whose buffer was already taken starts a new
/// generation and is flushed separately.
pub struct MediaGroupAggregator {
    window: Duration,
    flush: FlushFn,
    groups: Mutex<Groups>,
    shutdown: CancellationToken,
    timers: TaskTracker,
}

impl MediaGroupAggregator {
    pub fn new(window: Duration, flush: FlushFn) -> Arc<Self> {
        Arc::new(Self {
            window,
            flush,
            groups: Mutex::new(Groups::default()),
            shutdown: CancellationToken::new(),
            timers: TaskTracker::new(),
        })
    }

    /// Append `msg` to its group, creating the buffer (and timer) if needed.
    pub async fn insert(self: &Arc<Self>, group_id: GroupId, msg: InboundMessage) -> Buffered {
        let mut groups = self.groups.lock().await;

        if let Some(group) = groups.pending.get_mut(&group_id) {
            group.messages.push(msg);
            return Buffered::Appended {
                generation: group.generation,
                len: group.messages.len(),
            };
        }

        groups.next_generation += 1;
        let generation = groups.next_generation;
        groups.pending.insert(
            group_id.clone(),
            PendingGroup {
                chat_id: msg.chat_id,
                generation,
                created_at: Instant::now(),
                messages: vec![msg],
            },
        );
        drop(groups);

        self.spawn_timer(group_id, generation);
        Buffered::Started { generation }
    }

    /// Number of groups still buffering.
    pub async fn pending(&self) -> usize {
        self.groups.lock().await.pending.len()
    }

    /// Fire every pending timer now and wait until all flushes are done.
    pub async fn shutdown(&self) {
        let pending = self.pending().await;
        tracing::info!(pending, "draining media groups");
        self.shutdown.cancel();
        self.timers.close();
        self.timers.wait().await;
    }

    fn spawn_timer(self: &Arc<Self>, group_id: GroupId, generation: u64) {
        let aggregator = Arc::clone(self);
        let shutdown = self.shutdown.clone();
        self.timers.spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!(group_id = %group_id, "flushing media group early for shutdown");
                }
                _ = tokio::time::sleep(aggregator.window) => {}
            }

            if let Some(group) = aggregator.take(&group_id, generation).await {
                tracing::info!(
                    group_id = %group.group_id,
                    messages = group.messages.len(),
                    buffered_for = ?group.created_at.elapsed(),
                    "flushing media group"
                );
                (aggregator.flush)(group).await;
            }
        });
    }

    /// Remove the buffer for `group_id` if it is still the given generation.
    async fn take(&self, group_id: &GroupId, generation: u64) -> Option<FlushedGroup> {
        let mut groups = self.groups.lock().await;
        if groups.pending.get(group_id)?.generation != generation {
            return None;
        }
        let group = groups.pending.remove(group_id)?;
        Some(FlushedGroup {
            group_id: group_id.clone(),
            chat_id: group.chat_id,
            generation: group.generation,
            created_at: group.created_at,
            messages: group.messages,
        })
    }
}
