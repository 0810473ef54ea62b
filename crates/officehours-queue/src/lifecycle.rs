// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Applying status transitions to questions.
//!
//! [`plan_transition`] is the pure half: it checks ownership and legality,
//! updates the time accounting, and lists the side effects the transition
//! owes. [`LifecycleService`] persists the plan with a compare-and-swap on the
//! old status and then runs the side effects best effort.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use officehours_core::model::{ChatSession, NewQuestion, PushEvent, Question};
use officehours_core::{
    ChatSessions, OfficeHoursError, PushNotifier, QuestionId, QuestionStatus, QueueId,
    QueueStore, Role, UserId, ensure_transition,
};

use crate::metrics;

/// Actor id recorded for transitions made by the reclamation jobs.
pub const SYSTEM_ACTOR: UserId = UserId(0);

/// Side effect a transition owes after it has been persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    Push { user_id: UserId, event: PushEvent },
    OpenChat(ChatSession),
    /// End the chat session, keeping its transcript.
    EndChat,
    /// Drop the chat session metadata.
    ClearChat,
}

/// The outcome of planning a transition before anything is written.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPlan {
    pub updated: Question,
    /// False for a self-edge: nothing to write and nothing to notify.
    pub changed: bool,
    pub effects: Vec<SideEffect>,
}

/// Compute the new state of `question` after moving it to `new`.
pub fn plan_transition(
    question: &Question,
    new: QuestionStatus,
    actor: UserId,
    role: Role,
    now: DateTime<Utc>,
) -> Result<TransitionPlan, OfficeHoursError> {
    let old = question.status;
    let staff = role.is_staff();

    if staff && matches!(old, QuestionStatus::Helping | QuestionStatus::Resolved) {
        if let Some(helper) = question.helper_id {
            if helper != actor {
                return Err(OfficeHoursError::AlreadyClaimed {
                    question_id: question.id.0,
                    helper_id: helper.0,
                });
            }
        }
    }
    if role == Role::Student && actor != question.creator_id {
        return Err(OfficeHoursError::NotOwner {
            question_id: question.id.0,
            user_id: actor.0,
        });
    }
    ensure_transition(old, new, role)?;

    let mut q = question.clone();
    if old == new {
        return Ok(TransitionPlan {
            updated: q,
            changed: false,
            effects: Vec::new(),
        });
    }

    let mut effects = Vec::new();
    let push = |event: PushEvent| SideEffect::Push {
        user_id: question.creator_id,
        event,
    };
    let ids = (q.queue_id, q.id);

    let becoming_helped = new == QuestionStatus::Helping;
    let closing_from_waiting = old.is_waiting() && new.is_terminal();
    let first_time_helped = becoming_helped && q.first_helped_at.is_none();

    if becoming_helped || closing_from_waiting {
        let ready = *q.last_ready_at.get_or_insert(q.created_at);
        q.wait_time += (now - ready).num_seconds().max(0);

        if becoming_helped || staff {
            q.helper_id = Some(actor);
            q.helped_at = Some(now);
            q.first_helped_at.get_or_insert(now);
        }
        if becoming_helped {
            effects.push(push(PushEvent::StaffReady {
                queue_id: ids.0,
                question_id: ids.1,
            }));
        }
    }

    if !old.is_waiting() && new.is_waiting() {
        q.last_ready_at = Some(now);
    }

    if old == QuestionStatus::Helping {
        if let Some(helped_at) = q.helped_at {
            q.help_time += (now - helped_at).num_seconds().max(0);
        }
    }

    if new == QuestionStatus::Paused {
        q.helper_id.get_or_insert(actor);
        effects.push(push(PushEvent::Paused {
            queue_id: ids.0,
            question_id: ids.1,
        }));
    }

    if new.is_terminal() {
        q.closed_at = Some(now);
    }
    if new.is_limbo() {
        q.group_id = None;
    }

    if staff && new == QuestionStatus::TADeleted {
        effects.push(push(PushEvent::Removed {
            queue_id: ids.0,
            question_id: ids.1,
        }));
    }

    if new == QuestionStatus::Resolved {
        effects.push(SideEffect::EndChat);
    } else if new.is_terminal() {
        effects.push(SideEffect::ClearChat);
    } else if first_time_helped {
        effects.push(SideEffect::OpenChat(ChatSession {
            queue_id: q.queue_id,
            question_id: q.id,
            student_id: q.creator_id,
            staff_id: actor,
        }));
    }

    q.status = new;
    Ok(TransitionPlan {
        updated: q,
        changed: true,
        effects,
    })
}

/// Result of an applied transition.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub question: Question,
    pub previous: QuestionStatus,
    pub changed: bool,
}

impl TransitionOutcome {
    /// Whether the question left the Queued / PriorityQueued line.
    pub fn left_line(&self) -> bool {
        self.changed
            && matches!(
                self.previous,
                QuestionStatus::Queued | QuestionStatus::PriorityQueued
            )
            && !matches!(
                self.question.status,
                QuestionStatus::Queued | QuestionStatus::PriorityQueued
            )
    }
}

/// Input for [`LifecycleService::create_question`].
#[derive(Debug, Clone)]
pub struct QuestionDraft {
    pub queue_id: QueueId,
    pub creator_id: UserId,
    pub text: String,
    pub tags: BTreeSet<String>,
    pub is_task_question: bool,
    pub status: QuestionStatus,
}

/// Persists transitions and runs their side effects.
#[derive(Clone)]
pub struct LifecycleService {
    store: Arc<dyn QueueStore>,
    push: Arc<dyn PushNotifier>,
    chat: Arc<dyn ChatSessions>,
}

impl LifecycleService {
    pub fn new(
        store: Arc<dyn QueueStore>,
        push: Arc<dyn PushNotifier>,
        chat: Arc<dyn ChatSessions>,
    ) -> Self {
        Self { store, push, chat }
    }

    pub fn store(&self) -> &Arc<dyn QueueStore> {
        &self.store
    }

    pub fn push(&self) -> &Arc<dyn PushNotifier> {
        &self.push
    }

    pub fn chat(&self) -> &Arc<dyn ChatSessions> {
        &self.chat
    }

    /// Load a question by id and transition it at the current time.
    pub async fn change_status(
        &self,
        question_id: QuestionId,
        new: QuestionStatus,
        actor: UserId,
        role: Role,
    ) -> Result<TransitionOutcome, OfficeHoursError> {
        let question = self
            .store
            .get_question(question_id)
            .await?
            .ok_or_else(|| OfficeHoursError::not_found("question", question_id))?;
        self.change_status_at(&question, new, actor, role, Utc::now())
            .await
    }

    /// Transition an already loaded question.
    ///
    /// The write is conditional on the stored status still being
    /// `question.status`; losing that race yields
    /// [`OfficeHoursError::ConcurrentModification`] and nothing is retried.
    pub async fn change_status_at(
        &self,
        question: &Question,
        new: QuestionStatus,
        actor: UserId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, OfficeHoursError> {
        let plan = plan_transition(question, new, actor, role, now)?;
        let previous = question.status;
        if !plan.changed {
            return Ok(TransitionOutcome {
                question: plan.updated,
                previous,
                changed: false,
            });
        }

        if !self
            .store
            .update_question_if_status(&plan.updated, previous)
            .await?
        {
            return Err(OfficeHoursError::ConcurrentModification {
                question_id: question.id.0,
                expected: previous,
            });
        }

        metrics::record_transition(previous, new);
        info!(
            question_id = %question.id,
            queue_id = %question.queue_id,
            from = %previous,
            to = %new,
            role = %role,
            "question status changed"
        );

        self.run_effects(&plan.updated, plan.effects).await;

        Ok(TransitionOutcome {
            question: plan.updated,
            previous,
            changed: true,
        })
    }

    async fn run_effects(&self, question: &Question, effects: Vec<SideEffect>) {
        let (queue_id, question_id) = (question.queue_id, question.id);
        for effect in effects {
            match effect {
                SideEffect::Push { user_id, event } => {
                    if let Err(e) = self.push.notify(user_id, event).await {
                        warn!(user_id = %user_id, error = %e, "push notification failed");
                    }
                }
                SideEffect::OpenChat(session) => {
                    if let Err(e) = self.chat.create(&session).await {
                        warn!(question_id = %question_id, error = %e, "failed to open chat session");
                    }
                }
                SideEffect::EndChat => {
                    if let Err(e) = self.chat.end(queue_id, question_id).await {
                        warn!(
                            question_id = %question_id,
                            error = %e,
                            "failed to end chat session, clearing instead"
                        );
                        if let Err(e) = self.chat.clear(queue_id, question_id).await {
                            warn!(question_id = %question_id, error = %e, "failed to clear chat session");
                        }
                    }
                }
                SideEffect::ClearChat => {
                    if let Err(e) = self.chat.clear(queue_id, question_id).await {
                        warn!(question_id = %question_id, error = %e, "failed to clear chat session");
                    }
                }
            }
        }
    }

    /// Insert a new question after checking the queue admits it.
    pub async fn create_question(
        &self,
        draft: QuestionDraft,
        now: DateTime<Utc>,
    ) -> Result<Question, OfficeHoursError> {
        if !matches!(
            draft.status,
            QuestionStatus::Drafting | QuestionStatus::Queued
        ) {
            return Err(OfficeHoursError::Validation(format!(
                "a new question must start as Drafting or Queued, not {}",
                draft.status
            )));
        }

        let queue = self
            .store
            .get_queue(draft.queue_id)
            .await?
            .ok_or_else(|| OfficeHoursError::not_found("queue", draft.queue_id))?;
        if queue.is_disabled {
            return Err(OfficeHoursError::Validation(format!(
                "queue {} is disabled",
                queue.id
            )));
        }
        if !queue.allow_questions {
            return Err(OfficeHoursError::Validation(format!(
                "queue {} is not accepting questions",
                queue.id
            )));
        }
        if draft.status == QuestionStatus::Queued && !queue.is_staffed() {
            return Err(OfficeHoursError::Validation(format!(
                "queue {} has no staff checked in",
                queue.id
            )));
        }
        if !queue.settings.tags.is_empty() {
            if let Some(unknown) = draft
                .tags
                .iter()
                .find(|t| !queue.settings.tags.iter().any(|known| &known.id == *t))
            {
                return Err(OfficeHoursError::Validation(format!(
                    "unknown tag `{unknown}` for queue {}",
                    queue.id
                )));
            }
        }
        let existing = self
            .store
            .list_live_questions_for_student(draft.queue_id, draft.creator_id)
            .await?;
        if let Some(open) = existing.first() {
            return Err(OfficeHoursError::Validation(format!(
                "student {} already has question {} in queue {}",
                draft.creator_id, open.id, queue.id
            )));
        }

        let question = self
            .store
            .insert_question(&NewQuestion {
                queue_id: draft.queue_id,
                creator_id: draft.creator_id,
                text: draft.text,
                tags: draft.tags,
                is_task_question: draft.is_task_question,
                status: draft.status,
                created_at: now,
            })
            .await?;
        info!(
            question_id = %question.id,
            queue_id = %question.queue_id,
            status = %question.status,
            "question created"
        );
        Ok(question)
    }

    /// Move live questions of a queue (optionally only one student's) to a
    /// reclamation status as the system actor.
    ///
    /// Questions that changed underneath are skipped; any other failure
    /// stops the run. Returns the questions that were moved.
    pub async fn reclaim_live(
        &self,
        queue_id: QueueId,
        student: Option<UserId>,
        target: QuestionStatus,
        now: DateTime<Utc>,
    ) -> Result<Vec<Question>, OfficeHoursError> {
        let questions = match student {
            Some(student_id) => {
                self.store
                    .list_live_questions_for_student(queue_id, student_id)
                    .await?
            }
            None => self
                .store
                .list_live_questions(queue_id, usize::MAX)
                .await?
                .into_iter()
                .map(|r| r.question)
                .collect(),
        };

        let mut moved = Vec::with_capacity(questions.len());
        for question in questions {
            match self
                .change_status_at(&question, target, SYSTEM_ACTOR, Role::System, now)
                .await
            {
                Ok(outcome) => moved.push(outcome.question),
                Err(OfficeHoursError::ConcurrentModification { question_id, .. }) => {
                    debug!(question_id, "question changed during reclamation, skipping");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(moved)
    }
}
