// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted aggregates: questions, queues, groups, alerts, and staff events.
//!
//! These are the source-of-truth shapes. Derived view models (snapshots,
//! redacted question views) live in `officehours-queue`.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::{AlertId, CourseId, GroupId, QuestionId, QuestionStatus, QueueId, UserId};

/// A help request submitted by a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub queue_id: QueueId,
    pub creator_id: UserId,
    pub helper_id: Option<UserId>,
    pub status: QuestionStatus,
    pub text: String,
    pub tags: BTreeSet<String>,
    pub group_id: Option<GroupId>,
    pub is_task_question: bool,
    pub created_at: DateTime<Utc>,
    pub first_helped_at: Option<DateTime<Utc>>,
    pub helped_at: Option<DateTime<Utc>>,
    pub last_ready_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Cumulative seconds spent waiting.
    pub wait_time: i64,
    /// Cumulative seconds spent being helped.
    pub help_time: i64,
}

/// Input for inserting a new question row.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub queue_id: QueueId,
    pub creator_id: UserId,
    pub text: String,
    pub tags: BTreeSet<String>,
    pub is_task_question: bool,
    pub status: QuestionStatus,
    pub created_at: DateTime<Utc>,
}

/// Public identity fields of a user, as shown in snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub photo_url: Option<String>,
}

/// A question joined with the people attached to it.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionRecord {
    pub question: Question,
    pub creator: UserSummary,
    pub helper: Option<UserSummary>,
}

/// A tag a question in this queue may carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QueueTag {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// A task a student may check off in a task question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QueueTask {
    pub id: String,
    pub display_name: String,
}

/// Per-queue tag and task schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QueueSettings {
    #[serde(default)]
    pub tags: Vec<QueueTag>,
    #[serde(default)]
    pub tasks: Vec<QueueTask>,
}

impl QueueSettings {
    /// Rejects duplicate tag or task ids and blank display names.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = BTreeSet::new();
        for tag in &self.tags {
            if tag.display_name.trim().is_empty() {
                return Err(format!("tag `{}` has an empty display name", tag.id));
            }
            if !seen.insert(format!("tag:{}", tag.id)) {
                return Err(format!("duplicate tag id `{}`", tag.id));
            }
        }
        for task in &self.tasks {
            if task.display_name.trim().is_empty() {
                return Err(format!("task `{}` has an empty display name", task.id));
            }
            if !seen.insert(format!("task:{}", task.id)) {
                return Err(format!("duplicate task id `{}`", task.id));
            }
        }
        Ok(())
    }
}

/// A live help queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Queue {
    pub id: QueueId,
    pub course_id: CourseId,
    pub room: String,
    pub allow_questions: bool,
    pub is_disabled: bool,
    pub settings: QueueSettings,
    /// Staff currently checked in. Emptiness gates admission and reclamation.
    pub staff: Vec<UserId>,
}

impl Queue {
    pub fn is_staffed(&self) -> bool {
        !self.staff.is_empty()
    }
}

/// A set of questions handled jointly by one staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionGroup {
    pub id: GroupId,
    pub queue_id: QueueId,
    pub creator_id: UserId,
    pub question_ids: Vec<QuestionId>,
}

/// How an alert is surfaced to its user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    Modal,
    Feed,
}

/// Tag of an [`AlertPayload`] variant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum AlertType {
    RephraseQuestion,
    PromptStudentToLeaveQueue,
    EventEndedCheckoutStaff,
}

/// Typed alert payload, one shape per alert type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AlertPayload {
    #[serde(rename_all = "camelCase")]
    RephraseQuestion {
        question_id: QuestionId,
        queue_id: QueueId,
    },
    #[serde(rename_all = "camelCase")]
    PromptStudentToLeaveQueue {
        queue_id: QueueId,
        #[serde(default)]
        question_id: Option<QuestionId>,
    },
    #[serde(rename_all = "camelCase")]
    EventEndedCheckoutStaff { queue_id: QueueId },
}

impl AlertPayload {
    pub fn alert_type(&self) -> AlertType {
        match self {
            AlertPayload::RephraseQuestion { .. } => AlertType::RephraseQuestion,
            AlertPayload::PromptStudentToLeaveQueue { .. } => {
                AlertType::PromptStudentToLeaveQueue
            }
            AlertPayload::EventEndedCheckoutStaff { .. } => AlertType::EventEndedCheckoutStaff,
        }
    }

    /// The queue this payload refers to. Every current variant names one.
    pub fn queue_id(&self) -> QueueId {
        match self {
            AlertPayload::RephraseQuestion { queue_id, .. }
            | AlertPayload::PromptStudentToLeaveQueue { queue_id, .. }
            | AlertPayload::EventEndedCheckoutStaff { queue_id } => *queue_id,
        }
    }
}

/// An out-of-band notice tied to a user and course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: AlertId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub payload: AlertPayload,
    pub delivery_mode: DeliveryMode,
    pub sent: DateTime<Utc>,
    pub resolved: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Alert {
    pub fn alert_type(&self) -> AlertType {
        self.payload.alert_type()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }
}

/// Input for inserting a new alert row.
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub payload: AlertPayload,
    pub delivery_mode: DeliveryMode,
    pub sent: DateTime<Utc>,
}

/// Kind of staff presence event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StaffEventKind {
    CheckedIn,
    CheckedOut,
    ForcedCheckout,
}

/// A recorded staff check-in / check-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffEvent {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub queue_id: QueueId,
    pub kind: StaffEventKind,
    pub at: DateTime<Utc>,
}

/// Push events delivered to a question's creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PushEvent {
    StaffReady {
        queue_id: QueueId,
        question_id: QuestionId,
    },
    ThirdInLine {
        queue_id: QueueId,
        question_id: QuestionId,
    },
    Paused {
        queue_id: QueueId,
        question_id: QuestionId,
    },
    Removed {
        queue_id: QueueId,
        question_id: QuestionId,
    },
}

/// A chat session attached to a question being helped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub queue_id: QueueId,
    pub question_id: QuestionId,
    pub student_id: UserId,
    pub staff_id: UserId,
}
