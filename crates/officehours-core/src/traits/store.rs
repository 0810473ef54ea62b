// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable store trait for questions, queues, groups, alerts, and staff events.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::OfficeHoursError;
use crate::model::{
    Alert, AlertType, DeliveryMode, NewAlert, NewQuestion, Question, QuestionGroup,
    QuestionRecord, Queue, QueueSettings, StaffEvent,
};
use crate::traits::collaborator::Collaborator;
use crate::types::{AlertId, CourseId, QuestionId, QuestionStatus, QueueId, UserId};

/// The source of truth behind every service in the core.
///
/// Question updates are compare-and-swap on the expected status: a lost race
/// reports `Ok(false)` and leaves the row untouched.
#[async_trait]
pub trait QueueStore: Collaborator {
    // --- Questions ---

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, OfficeHoursError>;

    async fn insert_question(&self, question: &NewQuestion) -> Result<Question, OfficeHoursError>;

    /// Writes every mutable column of `question` if the stored status still
    /// equals `expected`. Returns whether the row was written.
    async fn update_question_if_status(
        &self,
        question: &Question,
        expected: QuestionStatus,
    ) -> Result<bool, OfficeHoursError>;

    /// Non-terminal questions of a queue with their people, oldest first,
    /// at most `limit` rows.
    async fn list_live_questions(
        &self,
        queue_id: QueueId,
        limit: usize,
    ) -> Result<Vec<QuestionRecord>, OfficeHoursError>;

    /// Non-terminal questions a student has in a queue.
    async fn list_live_questions_for_student(
        &self,
        queue_id: QueueId,
        student_id: UserId,
    ) -> Result<Vec<Question>, OfficeHoursError>;

    /// Queues holding at least one non-terminal question.
    async fn queues_with_live_questions(&self) -> Result<Vec<QueueId>, OfficeHoursError>;

    // --- Queues ---

    async fn get_queue(&self, id: QueueId) -> Result<Option<Queue>, OfficeHoursError>;

    async fn list_queues(&self) -> Result<Vec<Queue>, OfficeHoursError>;

    /// Adds a staff member. Returns false when already present.
    async fn add_staff(&self, queue_id: QueueId, user_id: UserId)
        -> Result<bool, OfficeHoursError>;

    /// Removes a staff member. Returns false when not present.
    async fn remove_staff(
        &self,
        queue_id: QueueId,
        user_id: UserId,
    ) -> Result<bool, OfficeHoursError>;

    /// Removes every staff member and returns who was removed.
    async fn clear_staff(&self, queue_id: QueueId) -> Result<Vec<UserId>, OfficeHoursError>;

    async fn set_queue_disabled(
        &self,
        queue_id: QueueId,
        disabled: bool,
    ) -> Result<(), OfficeHoursError>;

    /// Replaces the queue settings and its derived tag rows under a write lock.
    async fn update_queue_settings(
        &self,
        queue_id: QueueId,
        settings: &QueueSettings,
    ) -> Result<(), OfficeHoursError>;

    async fn record_staff_event(&self, event: &StaffEvent) -> Result<(), OfficeHoursError>;

    // --- Groups ---

    async fn create_group(
        &self,
        queue_id: QueueId,
        creator_id: UserId,
        question_ids: &[QuestionId],
    ) -> Result<QuestionGroup, OfficeHoursError>;

    async fn list_groups(&self, queue_id: QueueId) -> Result<Vec<QuestionGroup>, OfficeHoursError>;

    // --- Alerts ---

    async fn insert_alert(&self, alert: &NewAlert) -> Result<Alert, OfficeHoursError>;

    async fn get_alert(&self, id: AlertId) -> Result<Option<Alert>, OfficeHoursError>;

    async fn list_alerts_for_user(
        &self,
        user_id: UserId,
        course_id: CourseId,
        include_resolved: bool,
    ) -> Result<Vec<Alert>, OfficeHoursError>;

    /// Unresolved alerts whose payload references `queue_id`, optionally
    /// filtered by type and delivery mode.
    async fn list_unresolved_alerts_for_queue(
        &self,
        queue_id: QueueId,
        alert_type: Option<AlertType>,
        mode: Option<DeliveryMode>,
    ) -> Result<Vec<Alert>, OfficeHoursError>;

    /// Marks an alert resolved. Returns false when it was already resolved.
    async fn resolve_alert(&self, id: AlertId, at: DateTime<Utc>)
        -> Result<bool, OfficeHoursError>;
}
