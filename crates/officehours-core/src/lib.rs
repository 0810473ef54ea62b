// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the officehours help-queue server.
//!
//! This crate holds the domain types, the question lifecycle transition
//! table, the shared error type, and the collaborator traits the service
//! crates are written against.

pub mod error;
pub mod model;
pub mod state_machine;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ErrorKind, OfficeHoursError};
pub use state_machine::{allowed_targets, can_transition, ensure_transition};
pub use types::{
    AlertId, ChangeKind, CollaboratorKind, CourseId, GroupId, HealthStatus, QuestionId,
    QuestionStatus, QueueId, Role, UserId,
};

pub use traits::{
    ChangeSink, ChatSessions, Collaborator, ErrorReporter, NullSink, PushNotifier, QueueStore,
    SnapshotCache,
};
