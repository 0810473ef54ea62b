// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-session side channel attached to questions being helped.

use async_trait::async_trait;

use crate::error::OfficeHoursError;
use crate::model::ChatSession;
use crate::traits::collaborator::Collaborator;
use crate::types::{QuestionId, QueueId};

/// Chat sessions keyed by (queue, question).
#[async_trait]
pub trait ChatSessions: Collaborator {
    /// Opens a session between the student and the helping staff member.
    async fn create(&self, session: &ChatSession) -> Result<(), OfficeHoursError>;

    /// Ends a session, keeping its transcript.
    async fn end(&self, queue_id: QueueId, question_id: QuestionId)
        -> Result<(), OfficeHoursError>;

    /// Drops session metadata without keeping a transcript.
    async fn clear(
        &self,
        queue_id: QueueId,
        question_id: QuestionId,
    ) -> Result<(), OfficeHoursError>;

    /// Sessions currently open in a queue.
    async fn active(&self, queue_id: QueueId) -> Result<Vec<ChatSession>, OfficeHoursError>;
}
