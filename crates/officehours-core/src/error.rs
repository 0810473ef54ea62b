// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the officehours help-queue core.

use thiserror::Error;

use crate::types::{QuestionStatus, Role};

/// The primary error type used across the service layer and collaborator traits.
#[derive(Debug, Error)]
pub enum OfficeHoursError {
    /// The state machine does not allow this edge for the acting role.
    #[error("{role} cannot change question status from {from} to {to}")]
    IllegalTransition {
        role: Role,
        from: QuestionStatus,
        to: QuestionStatus,
    },

    /// Another staff member already owns the question.
    #[error("question {question_id} is already claimed by user {helper_id}")]
    AlreadyClaimed { question_id: i64, helper_id: i64 },

    /// A student acted on a question another student created.
    #[error("user {user_id} does not own question {question_id}")]
    NotOwner { question_id: i64, user_id: i64 },

    /// The row changed underneath a read-modify-write (lost compare-and-swap).
    #[error("question {question_id} changed concurrently: expected status {expected}")]
    ConcurrentModification {
        question_id: i64,
        expected: QuestionStatus,
    },

    /// A typed payload did not match the shape expected for its tag.
    #[error("invalid payload for {kind}: {message}")]
    InvalidPayload { kind: String, message: String },

    /// Caller input failed a domain precondition.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced queue, question, alert, or group does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Durable store failure (connection, query, serialization). Fatal for the caller.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Snapshot cache read or write failure.
    #[error("cache error: {message}")]
    Cache {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Push notification delivery failure.
    #[error("notification error: {message}")]
    Notification {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Chat-session collaborator failure.
    #[error("chat session error: {message}")]
    ChatSession {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors (invalid cron expression, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification of [`OfficeHoursError`] used by callers to decide
/// between rejecting, retrying at the human layer, or swallowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Transient,
    Fatal,
}

impl OfficeHoursError {
    /// Returns the error class this variant belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IllegalTransition { .. }
            | Self::InvalidPayload { .. }
            | Self::NotOwner { .. }
            | Self::Validation(_)
            | Self::Config(_) => ErrorKind::Validation,
            Self::AlreadyClaimed { .. } | Self::ConcurrentModification { .. } => {
                ErrorKind::Conflict
            }
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Cache { .. } | Self::Notification { .. } | Self::ChatSession { .. } => {
                ErrorKind::Transient
            }
            Self::Storage { .. } | Self::Internal(_) => ErrorKind::Fatal,
        }
    }

    /// Shorthand for a [`OfficeHoursError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl Into<i64>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}
