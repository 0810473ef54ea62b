// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast hub: one room per queue, throttled personalized delivery.
//!
//! The hub is the [`ChangeSink`] the queue service signals after each
//! mutation. A signal only arms the throttle; the payload is loaded and
//! personalized when the window closes, once per subscriber.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use officehours_config::model::BroadcastConfig;
use officehours_core::model::{ChatSession, Queue};
use officehours_core::{
    ChangeKind, ChangeSink, ChatSessions, OfficeHoursError, QueueId, QueueStore, Role, UserId,
};
use officehours_queue::{ReadCache, Snapshot, metrics, personalize};

use crate::throttle::Throttle;

/// Who is on the other end of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: UserId,
    pub role: Role,
}

/// One message sent to a subscriber, serialized as JSON text.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubMessage {
    pub queue_id: QueueId,
    #[serde(flatten)]
    pub payload: HubPayload,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum HubPayload {
    Questions(Snapshot),
    QueueMeta(Queue),
    ChatSessions(Vec<ChatSession>),
}

/// Unpersonalized payload source, loaded once per delivery.
enum Source {
    Questions(Snapshot),
    QueueMeta(Queue),
    ChatSessions(Vec<ChatSession>),
}

impl Source {
    fn render(&self, queue_id: QueueId, viewer: Viewer) -> HubMessage {
        let payload = match self {
            Source::Questions(snapshot) => {
                HubPayload::Questions(personalize(snapshot, viewer.user_id, viewer.role))
            }
            Source::QueueMeta(queue) => HubPayload::QueueMeta(queue.clone()),
            Source::ChatSessions(sessions) => HubPayload::ChatSessions(
                sessions
                    .iter()
                    .filter(|s| viewer.role.is_staff() || s.student_id == viewer.user_id)
                    .cloned()
                    .collect(),
            ),
        };
        HubMessage { queue_id, payload }
    }
}

struct Subscriber {
    viewer: Viewer,
    tx: mpsc::Sender<String>,
}

struct HubInner {
    rooms: DashMap<QueueId, HashMap<u64, Subscriber>>,
    next_id: AtomicU64,
    throttle: Throttle,
    buffer: usize,
    read_cache: ReadCache,
    store: Arc<dyn QueueStore>,
    chat: Arc<dyn ChatSessions>,
}

/// Rooms of subscribers keyed by queue.
#[derive(Clone)]
pub struct BroadcastHub {
    inner: Arc<HubInner>,
}

impl BroadcastHub {
    pub fn new(
        read_cache: ReadCache,
        store: Arc<dyn QueueStore>,
        chat: Arc<dyn ChatSessions>,
        config: &BroadcastConfig,
    ) -> Self {
        Self {
            inner: Arc::new(HubInner {
                rooms: DashMap::new(),
                next_id: AtomicU64::new(1),
                throttle: Throttle::new(std::time::Duration::from_millis(config.throttle_ms)),
                buffer: config.subscriber_buffer.max(1),
                read_cache,
                store,
                chat,
            }),
        }
    }

    /// A bounded channel sized for one subscriber.
    pub fn channel(&self) -> (mpsc::Sender<String>, mpsc::Receiver<String>) {
        mpsc::channel(self.inner.buffer)
    }

    /// Join the room for `queue_id`. Dropping the returned handle leaves it.
    pub fn subscribe(&self, queue_id: QueueId, viewer: Viewer, tx: mpsc::Sender<String>) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .rooms
            .entry(queue_id)
            .or_default()
            .insert(id, Subscriber { viewer, tx });
        debug!(queue_id = %queue_id, user_id = %viewer.user_id, subscriber = id, "subscribed");
        Subscription {
            hub: Arc::downgrade(&self.inner),
            queue_id,
            id,
        }
    }

    pub fn subscriber_count(&self, queue_id: QueueId) -> usize {
        self.inner.rooms.get(&queue_id).map_or(0, |room| room.len())
    }

    pub fn room_count(&self) -> usize {
        self.inner.rooms.len()
    }

    /// The message `viewer` would receive for `kind` right now.
    pub async fn render(
        &self,
        queue_id: QueueId,
        kind: ChangeKind,
        viewer: Viewer,
    ) -> Result<HubMessage, OfficeHoursError> {
        let source = self.load(queue_id, kind).await?;
        Ok(source.render(queue_id, viewer))
    }

    async fn load(&self, queue_id: QueueId, kind: ChangeKind) -> Result<Source, OfficeHoursError> {
        Ok(match kind {
            ChangeKind::Questions => {
                Source::Questions(self.inner.read_cache.get_questions(queue_id).await?)
            }
            ChangeKind::QueueMeta => Source::QueueMeta(
                self.inner
                    .store
                    .get_queue(queue_id)
                    .await?
                    .ok_or_else(|| OfficeHoursError::not_found("queue", queue_id))?,
            ),
            ChangeKind::ChatSessions => {
                Source::ChatSessions(self.inner.chat.active(queue_id).await?)
            }
        })
    }

    /// Send the current payload to every subscriber of the room now, without
    /// throttling. Returns how many subscribers received it.
    pub async fn deliver(&self, queue_id: QueueId, kind: ChangeKind) -> usize {
        let targets: Vec<(u64, Viewer, mpsc::Sender<String>)> = match self.inner.rooms.get(&queue_id) {
            Some(room) => room
                .iter()
                .map(|(id, s)| (*id, s.viewer, s.tx.clone()))
                .collect(),
            None => return 0,
        };
        if targets.is_empty() {
            return 0;
        }

        let source = match self.load(queue_id, kind).await {
            Ok(source) => source,
            Err(e) => {
                warn!(queue_id = %queue_id, kind = %kind, error = %e, "broadcast payload unavailable");
                return 0;
            }
        };

        let mut delivered = 0;
        let mut closed = Vec::new();
        for (id, viewer, tx) in targets {
            let text = match serde_json::to_string(&source.render(queue_id, viewer)) {
                Ok(text) => text,
                Err(e) => {
                    warn!(queue_id = %queue_id, error = %e, "broadcast serialization failed");
                    continue;
                }
            };
            match tx.try_send(text) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(queue_id = %queue_id, subscriber = id, "subscriber channel full, skipping");
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(queue_id = %queue_id, subscriber = id, "subscriber gone");
                    closed.push(id);
                }
            }
        }

        if !closed.is_empty() {
            self.inner.remove(queue_id, &closed);
        }
        metrics::record_broadcast(kind, delivered);
        delivered
    }

    fn schedule(&self, queue_id: QueueId, kind: ChangeKind) {
        if !self.inner.rooms.contains_key(&queue_id) {
            return;
        }
        let key = (queue_id, kind);
        if !self.inner.throttle.arm(key) {
            return;
        }
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                self.inner.throttle.release(&key);
                warn!(queue_id = %queue_id, "no async runtime, dropping broadcast");
                return;
            }
        };
        let hub = self.clone();
        let window = self.inner.throttle.window();
        handle.spawn(async move {
            tokio::time::sleep(window).await;
            let absorbed = hub.inner.throttle.release(&key);
            debug!(queue_id = %queue_id, kind = %kind, absorbed, "throttle window closed");
            hub.deliver(queue_id, kind).await;
        });
    }
}

impl HubInner {
    fn remove(&self, queue_id: QueueId, ids: &[u64]) {
        if let Some(mut room) = self.rooms.get_mut(&queue_id) {
            for id in ids {
                room.remove(id);
            }
        }
        self.rooms.remove_if(&queue_id, |_, room| room.is_empty());
    }
}

impl ChangeSink for BroadcastHub {
    fn queue_changed(&self, queue_id: QueueId, kind: ChangeKind) {
        self.schedule(queue_id, kind);
    }
}

/// Membership in a room. Leaves the room on drop.
pub struct Subscription {
    hub: Weak<HubInner>,
    queue_id: QueueId,
    id: u64,
}

impl Subscription {
    pub fn queue_id(&self) -> QueueId {
        self.queue_id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.hub.upgrade() {
            inner.remove(self.queue_id, &[self.id]);
            debug!(queue_id = %self.queue_id, subscriber = self.id, "unsubscribed");
        }
    }
}
