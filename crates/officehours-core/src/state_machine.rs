// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The question lifecycle transition table.
//!
//! This table is the only authority on which status edges a role may take.
//! Services, handlers, and background jobs must call [`ensure_transition`]
//! (or [`can_transition`]) instead of re-deriving legality.

use crate::error::OfficeHoursError;
use crate::types::{QuestionStatus, Role};

use QuestionStatus::*;

const QUEUE_STUDENT: &[QuestionStatus] = &[ConfirmedDeleted];
const QUEUE_STAFF: &[QuestionStatus] = &[Helping, TADeleted];

const HELPING_STUDENT: &[QuestionStatus] = &[ConfirmedDeleted, ReQueueing];
const HELPING_STAFF: &[QuestionStatus] = &[Resolved, ReQueueing, CantFind, Paused, TADeleted];
const PAUSED_STAFF: &[QuestionStatus] = &[Resolved, ReQueueing, CantFind, Helping, TADeleted];

const REENTRY_STUDENT: &[QuestionStatus] = &[Queued, PriorityQueued, ConfirmedDeleted];

const RECLAIM: &[QuestionStatus] = &[Stale, LeftDueToNoStaff];

const NONE: &[QuestionStatus] = &[];

/// Targets reachable from `old` by `role`, excluding the implicit self-edge.
pub fn allowed_targets(old: QuestionStatus, role: Role) -> &'static [QuestionStatus] {
    if old.is_terminal() {
        return NONE;
    }
    if role == Role::System {
        return RECLAIM;
    }
    let staff = role.is_staff();
    match old {
        Drafting if staff => &[Helping, DeletedDraft],
        Drafting => &[Queued, ConfirmedDeleted],
        Queued | PriorityQueued if staff => QUEUE_STAFF,
        Queued | PriorityQueued => QUEUE_STUDENT,
        Helping if staff => HELPING_STAFF,
        Paused if staff => PAUSED_STAFF,
        Helping | Paused => HELPING_STUDENT,
        CantFind | ReQueueing if staff => NONE,
        CantFind | ReQueueing => REENTRY_STUDENT,
        TADeleted if staff => NONE,
        TADeleted => QUEUE_STUDENT,
        Resolved | ConfirmedDeleted | Stale | DeletedDraft | LeftDueToNoStaff => NONE,
    }
}

/// True iff `old == new` or the table lists `new` for `(old, role)`.
pub fn can_transition(old: QuestionStatus, new: QuestionStatus, role: Role) -> bool {
    old == new || allowed_targets(old, role).contains(&new)
}

/// Capability check used by every mutating path.
pub fn ensure_transition(
    old: QuestionStatus,
    new: QuestionStatus,
    role: Role,
) -> Result<(), OfficeHoursError> {
    if can_transition(old, new, role) {
        Ok(())
    } else {
        Err(OfficeHoursError::IllegalTransition {
            role,
            from: old,
            to: new,
        })
    }
}
