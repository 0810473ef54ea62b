// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`QueueStore`] trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use officehours_config::model::StorageConfig;
use officehours_core::model::{
    Alert, AlertType, DeliveryMode, NewAlert, NewQuestion, Question, QuestionGroup,
    QuestionRecord, Queue, QueueSettings, StaffEvent, UserSummary,
};
use officehours_core::{
    AlertId, Collaborator, CollaboratorKind, CourseId, HealthStatus, OfficeHoursError,
    QuestionId, QuestionStatus, QueueId, QueueStore, UserId,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed store.
///
/// The database is opened lazily by [`SqliteStore::initialize`]; every other
/// call fails until then.
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a store for the configured path without touching the disk.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Create and initialize in one step.
    pub async fn open(config: StorageConfig) -> Result<Self, OfficeHoursError> {
        let store = Self::new(config);
        store.initialize().await?;
        Ok(store)
    }

    /// Open the database and run migrations. Fails if called twice.
    pub async fn initialize(&self) -> Result<(), OfficeHoursError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| OfficeHoursError::Storage {
            source: "store already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "sqlite store initialized");
        Ok(())
    }

    /// Checkpoint the WAL. The connection stays usable.
    pub async fn close(&self) -> Result<(), OfficeHoursError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    /// The underlying database, for query modules not exposed by the trait.
    pub fn db(&self) -> Result<&Database, OfficeHoursError> {
        self.db.get().ok_or_else(|| OfficeHoursError::Storage {
            source: "store not initialized, call initialize() first".into(),
        })
    }

    // --- Seeding helpers: accounts and courses are managed upstream. ---

    pub async fn upsert_user(
        &self,
        id: UserId,
        name: &str,
        photo_url: Option<&str>,
    ) -> Result<(), OfficeHoursError> {
        queries::users::upsert_user(self.db()?, id, name, photo_url).await
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<UserSummary>, OfficeHoursError> {
        queries::users::get_user(self.db()?, id).await
    }

    pub async fn create_queue(
        &self,
        course_id: CourseId,
        room: &str,
        allow_questions: bool,
    ) -> Result<QueueId, OfficeHoursError> {
        queries::queues::insert_queue(self.db()?, course_id, room, allow_questions).await
    }

    pub async fn staff_events(&self, queue_id: QueueId) -> Result<Vec<StaffEvent>, OfficeHoursError> {
        queries::events::list_for_queue(self.db()?, queue_id).await
    }
}

#[async_trait]
impl Collaborator for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn kind(&self) -> CollaboratorKind {
        CollaboratorKind::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, OfficeHoursError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        match db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> { conn.execute_batch("SELECT 1;") })
            .await
        {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl QueueStore for SqliteStore {
    // --- Questions ---

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, OfficeHoursError> {
        queries::questions::get_question(self.db()?, id).await
    }

    async fn insert_question(&self, question: &NewQuestion) -> Result<Question, OfficeHoursError> {
        queries::questions::insert_question(self.db()?, question).await
    }

    async fn update_question_if_status(
        &self,
        question: &Question,
        expected: QuestionStatus,
    ) -> Result<bool, OfficeHoursError> {
        queries::questions::update_if_status(self.db()?, question, expected).await
    }

    async fn list_live_questions(
        &self,
        queue_id: QueueId,
        limit: usize,
    ) -> Result<Vec<QuestionRecord>, OfficeHoursError> {
        queries::questions::list_live(self.db()?, queue_id, limit).await
    }

    async fn list_live_questions_for_student(
        &self,
        queue_id: QueueId,
        student_id: UserId,
    ) -> Result<Vec<Question>, OfficeHoursError> {
        queries::questions::list_live_for_student(self.db()?, queue_id, student_id).await
    }

    async fn queues_with_live_questions(&self) -> Result<Vec<QueueId>, OfficeHoursError> {
        queries::questions::queues_with_live(self.db()?).await
    }

    // --- Queues ---

    async fn get_queue(&self, id: QueueId) -> Result<Option<Queue>, OfficeHoursError> {
        queries::queues::get_queue(self.db()?, id).await
    }

    async fn list_queues(&self) -> Result<Vec<Queue>, OfficeHoursError> {
        queries::queues::list_queues(self.db()?).await
    }

    async fn add_staff(&self, queue_id: QueueId, user_id: UserId) -> Result<bool, OfficeHoursError> {
        queries::queues::add_staff(self.db()?, queue_id, user_id).await
    }

    async fn remove_staff(
        &self,
        queue_id: QueueId,
        user_id: UserId,
    ) -> Result<bool, OfficeHoursError> {
        queries::queues::remove_staff(self.db()?, queue_id, user_id).await
    }

    async fn clear_staff(&self, queue_id: QueueId) -> Result<Vec<UserId>, OfficeHoursError> {
        queries::queues::clear_staff(self.db()?, queue_id).await
    }

    async fn set_queue_disabled(
        &self,
        queue_id: QueueId,
        disabled: bool,
    ) -> Result<(), OfficeHoursError> {
        if queries::queues::set_disabled(self.db()?, queue_id, disabled).await? {
            Ok(())
        } else {
            Err(OfficeHoursError::not_found("queue", queue_id))
        }
    }

    async fn update_queue_settings(
        &self,
        queue_id: QueueId,
        settings: &QueueSettings,
    ) -> Result<(), OfficeHoursError> {
        if queries::queues::update_settings(self.db()?, queue_id, settings).await? {
            Ok(())
        } else {
            Err(OfficeHoursError::not_found("queue", queue_id))
        }
    }

    async fn record_staff_event(&self, event: &StaffEvent) -> Result<(), OfficeHoursError> {
        queries::events::record(self.db()?, event).await
    }

    // --- Groups ---

    async fn create_group(
        &self,
        queue_id: QueueId,
        creator_id: UserId,
        question_ids: &[QuestionId],
    ) -> Result<QuestionGroup, OfficeHoursError> {
        queries::groups::create_group(self.db()?, queue_id, creator_id, question_ids, Utc::now())
            .await
    }

    async fn list_groups(&self, queue_id: QueueId) -> Result<Vec<QuestionGroup>, OfficeHoursError> {
        queries::groups::list_groups(self.db()?, queue_id).await
    }

    // --- Alerts ---

    async fn insert_alert(&self, alert: &NewAlert) -> Result<Alert, OfficeHoursError> {
        queries::alerts::insert_alert(self.db()?, alert).await
    }

    async fn get_alert(&self, id: AlertId) -> Result<Option<Alert>, OfficeHoursError> {
        queries::alerts::get_alert(self.db()?, id).await
    }

    async fn list_alerts_for_user(
        &self,
        user_id: UserId,
        course_id: CourseId,
        include_resolved: bool,
    ) -> Result<Vec<Alert>, OfficeHoursError> {
        queries::alerts::list_for_user(self.db()?, user_id, course_id, include_resolved).await
    }

    async fn list_unresolved_alerts_for_queue(
        &self,
        queue_id: QueueId,
        alert_type: Option<AlertType>,
        mode: Option<DeliveryMode>,
    ) -> Result<Vec<Alert>, OfficeHoursError> {
        queries::alerts::list_unresolved_for_queue(self.db()?, queue_id, alert_type, mode).await
    }

    async fn resolve_alert(&self, id: AlertId, at: DateTime<Utc>) -> Result<bool, OfficeHoursError> {
        queries::alerts::resolve(self.db()?, id, at).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &std::path::Path) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string_lossy().into_owned(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn identifies_as_store() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(make_config(&dir.path().join("id.db")));
        assert_eq!(store.name(), "sqlite");
        assert_eq!(store.kind(), CollaboratorKind::Store);
    }

    #[tokio::test]
    async fn health_reflects_initialization() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(make_config(&dir.path().join("health.db")));
        assert!(matches!(
            store.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
        assert!(store.get_queue(QueueId(1)).await.is_err());

        store.initialize().await.unwrap();
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        assert!(store.initialize().await.is_err(), "second initialize must fail");
    }

    #[tokio::test]
    async fn missing_queue_updates_are_not_found() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(make_config(&dir.path().join("nf.db")))
            .await
            .unwrap();

        let err = store.set_queue_disabled(QueueId(42), true).await.unwrap_err();
        assert!(matches!(err, OfficeHoursError::NotFound { entity: "queue", id: 42 }));
        let err = store
            .update_queue_settings(QueueId(42), &QueueSettings::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), officehours_core::ErrorKind::NotFound);
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn queue_and_question_through_trait_object() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(make_config(&dir.path().join("dyn.db")))
            .await
            .unwrap();
        store.upsert_user(UserId(1), "Ada", None).await.unwrap();
        let queue = store.create_queue(CourseId(3), "Lab", true).await.unwrap();

        let store: &dyn QueueStore = &store;
        let q = store
            .insert_question(&NewQuestion {
                queue_id: queue,
                creator_id: UserId(1),
                text: "segfault".into(),
                tags: Default::default(),
                is_task_question: false,
                status: QuestionStatus::Drafting,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        assert_eq!(q.last_ready_at, None);

        let records = store.list_live_questions(queue, 10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].creator.name, "Ada");
    }
}
