// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for integration testing.
//!
//! `TestHarness` assembles the queue stack over a temp SQLite database with
//! recording collaborators, plus helpers to seed users, queues, and
//! questions.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;

use officehours_config::OfficeHoursConfig;
use officehours_config::model::StorageConfig;
use officehours_core::model::{NewQuestion, Question};
use officehours_core::{
    ChangeSink, CourseId, OfficeHoursError, QuestionStatus, QueueId, QueueStore, UserId,
};
use officehours_queue::{AlertRegistry, LifecycleService, QuestionDraft, QueueService, ReadCache};
use officehours_storage::SqliteStore;

use crate::mock_cache::MockCache;
use crate::mock_chat::MockChat;
use crate::mock_push::RecordingPush;
use crate::recorders::{RecordingReporter, RecordingSink};

/// Course every harness queue belongs to unless stated otherwise.
pub const COURSE: CourseId = CourseId(7);

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    max_questions: Option<usize>,
    leave_prompt_delay_secs: Option<u64>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            max_questions: None,
            leave_prompt_delay_secs: None,
        }
    }

    /// Cap on questions per snapshot.
    pub fn with_max_questions(mut self, max: usize) -> Self {
        self.max_questions = Some(max);
        self
    }

    pub fn with_leave_prompt_delay(mut self, secs: u64) -> Self {
        self.leave_prompt_delay_secs = Some(secs);
        self
    }

    /// Build the harness, creating a fresh database.
    pub async fn build(self) -> Result<TestHarness, OfficeHoursError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| OfficeHoursError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = OfficeHoursConfig::default();
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        };
        if let Some(max) = self.max_questions {
            config.queue.max_questions_per_queue = max;
        }
        if let Some(secs) = self.leave_prompt_delay_secs {
            config.reclaim.leave_prompt_delay_secs = secs;
        }

        let store = Arc::new(SqliteStore::open(config.storage.clone()).await?);
        let cache = Arc::new(MockCache::new());
        let push = Arc::new(RecordingPush::new());
        let chat = Arc::new(MockChat::new());
        let sink = Arc::new(RecordingSink::new());
        let reporter = Arc::new(RecordingReporter::new());

        let read_cache = ReadCache::new(
            store.clone(),
            cache.clone(),
            config.queue.max_questions_per_queue,
        );

        let harness = TestHarness {
            store,
            cache,
            push,
            chat,
            sink,
            reporter,
            read_cache,
            config,
            _temp_dir: temp_dir,
        };
        Ok(harness)
    }
}

/// A complete test environment with recording collaborators and temp storage.
pub struct TestHarness {
    /// SQLite store (temp DB, cleaned up on drop).
    pub store: Arc<SqliteStore>,
    pub cache: Arc<MockCache>,
    pub push: Arc<RecordingPush>,
    pub chat: Arc<MockChat>,
    pub sink: Arc<RecordingSink>,
    pub reporter: Arc<RecordingReporter>,
    pub read_cache: ReadCache,
    pub config: OfficeHoursConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// The store as the trait object services take.
    pub fn dyn_store(&self) -> Arc<dyn QueueStore> {
        self.store.clone()
    }

    /// A service wired to the harness collaborators and the recording sink.
    pub fn service(&self) -> QueueService {
        self.service_with_sink(self.sink.clone())
    }

    /// Same wiring with a different change sink (e.g. a broadcast hub).
    pub fn service_with_sink(&self, sink: Arc<dyn ChangeSink>) -> QueueService {
        QueueService::builder(self.dyn_store(), self.read_cache.clone())
            .push(self.push.clone())
            .chat(self.chat.clone())
            .sink(sink)
            .build()
    }

    pub fn lifecycle(&self) -> LifecycleService {
        LifecycleService::new(self.dyn_store(), self.push.clone(), self.chat.clone())
    }

    pub fn alerts(&self) -> AlertRegistry {
        AlertRegistry::new(self.dyn_store())
    }

    pub async fn user(&self, id: i64, name: &str) -> Result<UserId, OfficeHoursError> {
        let user = UserId(id);
        self.store.upsert_user(user, name, None).await?;
        Ok(user)
    }

    /// An open queue in [`COURSE`] with the given staff checked in.
    pub async fn queue_with_staff(&self, staff: &[UserId]) -> Result<QueueId, OfficeHoursError> {
        let queue = self.store.create_queue(COURSE, "Lab 2", true).await?;
        for user in staff {
            self.store.add_staff(queue, *user).await?;
        }
        Ok(queue)
    }

    /// Insert a question directly, bypassing admission checks.
    pub async fn question(
        &self,
        queue_id: QueueId,
        creator: UserId,
        status: QuestionStatus,
    ) -> Result<Question, OfficeHoursError> {
        self.store
            .insert_question(&NewQuestion {
                queue_id,
                creator_id: creator,
                text: format!("question from {creator}"),
                tags: BTreeSet::new(),
                is_task_question: false,
                status,
                created_at: Utc::now(),
            })
            .await
    }

    /// A draft for `create_question` with sensible defaults.
    pub fn draft(&self, queue_id: QueueId, creator: UserId, status: QuestionStatus) -> QuestionDraft {
        QuestionDraft {
            queue_id,
            creator_id: creator,
            text: "my tests fail on CI only".into(),
            tags: BTreeSet::new(),
            is_task_question: false,
            status,
        }
    }

    pub async fn reload(&self, question: &Question) -> Result<Question, OfficeHoursError> {
        self.store
            .get_question(question.id)
            .await?
            .ok_or_else(|| OfficeHoursError::not_found("question", question.id))
    }
}
