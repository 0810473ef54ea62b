// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push notifier that records every event for assertions.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use officehours_core::model::PushEvent;
use officehours_core::{Collaborator, CollaboratorKind, OfficeHoursError, PushNotifier, UserId};

/// Captures `(recipient, event)` pairs. Can be switched to fail every call.
pub struct RecordingPush {
    sent: Arc<Mutex<Vec<(UserId, PushEvent)>>>,
    failing: AtomicBool,
}

impl RecordingPush {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            failing: AtomicBool::new(false),
        }
    }

    /// Make subsequent `notify` calls fail after recording.
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<(UserId, PushEvent)> {
        self.sent.lock().await.clone()
    }

    /// Events delivered to one user.
    pub async fn sent_to(&self, user_id: UserId) -> Vec<PushEvent> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub async fn clear(&self) {
        self.sent.lock().await.clear();
    }
}

impl Default for RecordingPush {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collaborator for RecordingPush {
    fn name(&self) -> &str {
        "recording-push"
    }

    fn kind(&self) -> CollaboratorKind {
        CollaboratorKind::Push
    }
}

#[async_trait]
impl PushNotifier for RecordingPush {
    async fn notify(&self, user_id: UserId, event: PushEvent) -> Result<(), OfficeHoursError> {
        self.sent.lock().await.push((user_id, event));
        if self.failing.load(Ordering::SeqCst) {
            return Err(OfficeHoursError::Notification {
                message: "push transport unavailable".into(),
                source: None,
            });
        }
        Ok(())
    }
}
