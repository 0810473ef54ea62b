// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process collaborator implementations used when nothing external is
//! configured.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{error, info};

use officehours_core::model::{ChatSession, PushEvent};
use officehours_core::{
    ChatSessions, Collaborator, CollaboratorKind, ErrorReporter, OfficeHoursError, PushNotifier,
    QuestionId, QueueId, SnapshotCache, UserId,
};

/// Snapshot cache held in process memory.
#[derive(Debug, Default)]
pub struct MemorySnapshotCache {
    entries: DashMap<String, String>,
}

impl MemorySnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Collaborator for MemorySnapshotCache {
    fn name(&self) -> &str {
        "memory-cache"
    }

    fn kind(&self) -> CollaboratorKind {
        CollaboratorKind::SnapshotCache
    }
}

#[async_trait]
impl SnapshotCache for MemorySnapshotCache {
    async fn get(&self, key: &str) -> Result<Option<String>, OfficeHoursError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), OfficeHoursError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), OfficeHoursError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Push notifier that only logs. Stands in until a real transport is wired.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPushNotifier;

#[async_trait]
impl Collaborator for LogPushNotifier {
    fn name(&self) -> &str {
        "log-push"
    }

    fn kind(&self) -> CollaboratorKind {
        CollaboratorKind::Push
    }
}

#[async_trait]
impl PushNotifier for LogPushNotifier {
    async fn notify(&self, user_id: UserId, event: PushEvent) -> Result<(), OfficeHoursError> {
        info!(user_id = %user_id, ?event, "push notification");
        Ok(())
    }
}

/// Chat sessions tracked in memory, keyed by (queue, question).
///
/// Ending and clearing both drop the entry; there is no transcript store
/// behind this implementation.
#[derive(Debug, Default)]
pub struct MemoryChatSessions {
    sessions: DashMap<(QueueId, QuestionId), ChatSession>,
}

impl MemoryChatSessions {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Collaborator for MemoryChatSessions {
    fn name(&self) -> &str {
        "memory-chat"
    }

    fn kind(&self) -> CollaboratorKind {
        CollaboratorKind::ChatSession
    }
}

#[async_trait]
impl ChatSessions for MemoryChatSessions {
    async fn create(&self, session: &ChatSession) -> Result<(), OfficeHoursError> {
        self.sessions
            .insert((session.queue_id, session.question_id), session.clone());
        Ok(())
    }

    async fn end(&self, queue_id: QueueId, question_id: QuestionId) -> Result<(), OfficeHoursError> {
        self.sessions.remove(&(queue_id, question_id));
        Ok(())
    }

    async fn clear(
        &self,
        queue_id: QueueId,
        question_id: QuestionId,
    ) -> Result<(), OfficeHoursError> {
        self.sessions.remove(&(queue_id, question_id));
        Ok(())
    }

    async fn active(&self, queue_id: QueueId) -> Result<Vec<ChatSession>, OfficeHoursError> {
        let mut found: Vec<ChatSession> = self
            .sessions
            .iter()
            .filter(|e| e.key().0 == queue_id)
            .map(|e| e.value().clone())
            .collect();
        found.sort_by_key(|s| s.question_id);
        Ok(found)
    }
}

/// Error reporter that forwards captured failures to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorReporter;

#[async_trait]
impl Collaborator for TracingErrorReporter {
    fn name(&self) -> &str {
        "tracing-reporter"
    }

    fn kind(&self) -> CollaboratorKind {
        CollaboratorKind::ErrorTracking
    }
}

impl ErrorReporter for TracingErrorReporter {
    fn capture(&self, job: &str, error: &OfficeHoursError) {
        error!(job, error = %error, kind = ?error.kind(), "background job failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_cache_overwrites_and_deletes() {
        let cache = MemorySnapshotCache::new();
        assert_eq!(cache.get("q:1").await.unwrap(), None);
        cache.set("q:1", "a".into()).await.unwrap();
        cache.set("q:1", "b".into()).await.unwrap();
        assert_eq!(cache.get("q:1").await.unwrap().as_deref(), Some("b"));
        assert_eq!(cache.len(), 1);
        cache.delete("q:1").await.unwrap();
        cache.delete("q:1").await.unwrap();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn chat_sessions_are_scoped_per_queue() {
        let chat = MemoryChatSessions::new();
        for (queue, question) in [(1, 10), (1, 11), (2, 12)] {
            chat.create(&ChatSession {
                queue_id: QueueId(queue),
                question_id: QuestionId(question),
                student_id: UserId(100),
                staff_id: UserId(5),
            })
            .await
            .unwrap();
        }
        assert_eq!(chat.active(QueueId(1)).await.unwrap().len(), 2);

        chat.end(QueueId(1), QuestionId(10)).await.unwrap();
        chat.clear(QueueId(1), QuestionId(11)).await.unwrap();
        assert!(chat.active(QueueId(1)).await.unwrap().is_empty());
        assert_eq!(chat.active(QueueId(2)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn defaults_report_healthy() {
        assert_eq!(
            LogPushNotifier.health_check().await.unwrap(),
            officehours_core::HealthStatus::Healthy
        );
        assert_eq!(TracingErrorReporter.kind(), CollaboratorKind::ErrorTracking);
    }
}
