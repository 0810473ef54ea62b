// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named one-shot timers.
//!
//! A timer is identified by a [`TimerKey`]. Scheduling under a key that
//! already holds a pending timer aborts the old one first, so at most one
//! timer per key is ever pending.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::debug;

use officehours_core::{QueueId, UserId};

/// What a timer is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Auto-leave check after a leave prompt went unanswered.
    LeaveQueue,
}

/// Deterministic timer name, rendered as `leave-queue:{queue}:{student}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerKey {
    pub kind: TimerKind,
    pub queue_id: QueueId,
    pub student_id: UserId,
}

impl TimerKey {
    pub fn leave_queue(queue_id: QueueId, student_id: UserId) -> Self {
        Self {
            kind: TimerKind::LeaveQueue,
            queue_id,
            student_id,
        }
    }
}

impl fmt::Display for TimerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            TimerKind::LeaveQueue => "leave-queue",
        };
        write!(f, "{kind}:{}:{}", self.queue_id, self.student_id)
    }
}

struct Pending {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Pending timers keyed by name.
#[derive(Default)]
pub struct TimerRegistry {
    pending: DashMap<TimerKey, Pending>,
    generation: AtomicU64,
}

impl TimerRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Run `task` after `delay` under `key`, replacing any pending timer with
    /// the same key.
    ///
    /// The entry is removed just before `task` starts, so a task may
    /// schedule its own successor under the same key.
    pub fn schedule<F>(self: &Arc<Self>, key: TimerKey, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let registry: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(registry) = registry.upgrade() {
                registry
                    .pending
                    .remove_if(&key, |_, p| p.generation == generation);
            }
            debug!(timer = %key, "timer fired");
            task.await;
        });

        if let Some(old) = self.pending.insert(key, Pending { generation, handle }) {
            old.handle.abort();
            debug!(timer = %key, "replaced pending timer");
        }
    }

    /// Abort the pending timer under `key`. Returns whether one was pending.
    pub fn cancel(&self, key: &TimerKey) -> bool {
        match self.pending.remove(key) {
            Some((_, p)) => {
                p.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, key: &TimerKey) -> bool {
        self.pending
            .get(key)
            .is_some_and(|p| !p.handle.is_finished())
    }

    /// Number of timers that have not fired yet.
    pub fn len(&self) -> usize {
        self.pending
            .iter()
            .filter(|p| !p.handle.is_finished())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Abort everything. Used at shutdown.
    pub fn cancel_all(&self) {
        self.pending.retain(|_, p| {
            p.handle.abort();
            false
        });
    }
}
