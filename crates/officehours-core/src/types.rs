// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identifier, role, and status types shared by every officehours crate.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

id_type!(
    /// Primary key of a question row.
    QuestionId
);
id_type!(
    /// Primary key of a queue row.
    QueueId
);
id_type!(
    /// Primary key of a user (student or staff).
    UserId
);
id_type!(
    /// Primary key of a course.
    CourseId
);
id_type!(
    /// Primary key of an alert row.
    AlertId
);
id_type!(
    /// Primary key of a question group.
    GroupId
);

/// The role an actor holds in the course that owns the queue.
///
/// `System` is the reclamation actor used by background jobs; it has its own
/// column in the transition table and is never assigned to a user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Ta,
    Professor,
    System,
}

impl Role {
    /// Teaching assistants and professors share the staff capabilities.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Ta | Role::Professor)
    }
}

/// Lifecycle status of a question.
///
/// Thirteen values across four categories: initial (`Drafting`), open
/// (`Queued`, `PriorityQueued`, `Paused`, `Helping`), limbo (`CantFind`,
/// `ReQueueing`, `TADeleted`), and terminal (`Resolved`, `ConfirmedDeleted`,
/// `Stale`, `DeletedDraft`, `LeftDueToNoStaff`). Persisted as the variant name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum QuestionStatus {
    Drafting,
    Queued,
    PriorityQueued,
    Paused,
    Helping,
    CantFind,
    ReQueueing,
    TADeleted,
    Resolved,
    ConfirmedDeleted,
    Stale,
    DeletedDraft,
    LeftDueToNoStaff,
}

impl QuestionStatus {
    /// Every status, in declaration order.
    pub const ALL: [QuestionStatus; 13] = [
        QuestionStatus::Drafting,
        QuestionStatus::Queued,
        QuestionStatus::PriorityQueued,
        QuestionStatus::Paused,
        QuestionStatus::Helping,
        QuestionStatus::CantFind,
        QuestionStatus::ReQueueing,
        QuestionStatus::TADeleted,
        QuestionStatus::Resolved,
        QuestionStatus::ConfirmedDeleted,
        QuestionStatus::Stale,
        QuestionStatus::DeletedDraft,
        QuestionStatus::LeftDueToNoStaff,
    ];

    /// Ready for staff attention (Paused counts for wait-time accounting).
    pub fn is_waiting(self) -> bool {
        matches!(
            self,
            QuestionStatus::Queued | QuestionStatus::PriorityQueued | QuestionStatus::Paused
        )
    }

    /// Transient disconnect state pending student re-entry or closure.
    pub fn is_limbo(self) -> bool {
        matches!(
            self,
            QuestionStatus::CantFind | QuestionStatus::ReQueueing | QuestionStatus::TADeleted
        )
    }

    /// Immutable sink: no outgoing transition.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            QuestionStatus::Resolved
                | QuestionStatus::ConfirmedDeleted
                | QuestionStatus::Stale
                | QuestionStatus::DeletedDraft
                | QuestionStatus::LeftDueToNoStaff
        )
    }

    /// Drafting, waiting, or being helped.
    pub fn is_open(self) -> bool {
        !self.is_terminal() && !self.is_limbo()
    }

    /// Open or limbo: anything reclamation may still touch.
    pub fn is_live(self) -> bool {
        !self.is_terminal()
    }

    /// Statuses that count as live, used by queries that must exclude sinks.
    pub fn live() -> impl Iterator<Item = QuestionStatus> {
        Self::ALL.into_iter().filter(|s| s.is_live())
    }
}

/// Health status reported by collaborator health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Collaborator is fully operational.
    Healthy,
    /// Collaborator is operational but experiencing issues.
    Degraded(String),
    /// Collaborator is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum CollaboratorKind {
    Store,
    SnapshotCache,
    Push,
    ChatSession,
    ErrorTracking,
    Broadcast,
}

/// What changed about a queue, used to pick the throttle lane and payload.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// The set or state of the queue's questions changed.
    Questions,
    /// Queue metadata (staff list, flags, config) changed.
    QueueMeta,
    /// The set of active chat sessions changed.
    ChatSessions,
}
