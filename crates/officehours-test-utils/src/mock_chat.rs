// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-session collaborator that logs calls and can refuse to end sessions.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use officehours_core::model::ChatSession;
use officehours_core::{
    ChatSessions, Collaborator, CollaboratorKind, OfficeHoursError, QuestionId, QueueId,
};

/// One recorded call on [`MockChat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCall {
    Create(ChatSession),
    End(QueueId, QuestionId),
    Clear(QueueId, QuestionId),
}

#[derive(Default)]
pub struct MockChat {
    calls: Mutex<Vec<ChatCall>>,
    open: Mutex<Vec<ChatSession>>,
    fail_end: AtomicBool,
}

impl MockChat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `end` fail so callers fall back to `clear`.
    pub fn fail_end(&self, failing: bool) {
        self.fail_end.store(failing, Ordering::SeqCst);
    }

    pub async fn calls(&self) -> Vec<ChatCall> {
        self.calls.lock().await.clone()
    }

    async fn close(&self, queue_id: QueueId, question_id: QuestionId) {
        self.open
            .lock()
            .await
            .retain(|s| !(s.queue_id == queue_id && s.question_id == question_id));
    }
}

#[async_trait]
impl Collaborator for MockChat {
    fn name(&self) -> &str {
        "mock-chat"
    }

    fn kind(&self) -> CollaboratorKind {
        CollaboratorKind::ChatSession
    }
}

#[async_trait]
impl ChatSessions for MockChat {
    async fn create(&self, session: &ChatSession) -> Result<(), OfficeHoursError> {
        self.calls.lock().await.push(ChatCall::Create(session.clone()));
        self.open.lock().await.push(session.clone());
        Ok(())
    }

    async fn end(&self, queue_id: QueueId, question_id: QuestionId) -> Result<(), OfficeHoursError> {
        self.calls
            .lock()
            .await
            .push(ChatCall::End(queue_id, question_id));
        if self.fail_end.load(Ordering::SeqCst) {
            return Err(OfficeHoursError::ChatSession {
                message: "transcript store unavailable".into(),
                source: None,
            });
        }
        self.close(queue_id, question_id).await;
        Ok(())
    }

    async fn clear(
        &self,
        queue_id: QueueId,
        question_id: QuestionId,
    ) -> Result<(), OfficeHoursError> {
        self.calls
            .lock()
            .await
            .push(ChatCall::Clear(queue_id, question_id));
        self.close(queue_id, question_id).await;
        Ok(())
    }

    async fn active(&self, queue_id: QueueId) -> Result<Vec<ChatSession>, OfficeHoursError> {
        Ok(self
            .open
            .lock()
            .await
            .iter()
            .filter(|s| s.queue_id == queue_id)
            .cloned()
            .collect())
    }
}
