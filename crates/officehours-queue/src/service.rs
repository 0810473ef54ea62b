// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The queue facade used by the HTTP layer and the CLI.
//!
//! Every accepted mutation follows the same order: write to the store,
//! refresh the queue's cached snapshot (failure logged, never fatal), then
//! signal the [`ChangeSink`].

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use officehours_core::model::{
    AlertType, PushEvent, QuestionGroup, Queue, QueueSettings, StaffEvent, StaffEventKind,
};
use officehours_core::{
    ChangeKind, ChangeSink, ChatSessions, CourseId, NullSink, OfficeHoursError, PushNotifier,
    QuestionId, QuestionStatus, QueueId, QueueStore, Role, UserId,
};

use crate::alerts::{AlertCreation, AlertRegistry, AlertView, RawAlert};
use crate::cache::ReadCache;
use crate::defaults::{LogPushNotifier, MemoryChatSessions};
use crate::lifecycle::{LifecycleService, QuestionDraft, TransitionOutcome};
use crate::snapshot::Snapshot;

/// What `check_out` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOutOutcome {
    /// The user was on the staff list and has been removed.
    pub removed: bool,
    /// The queue has no staff left after this checkout.
    pub queue_emptied: bool,
}

/// Builder for [`QueueService`]. Collaborators left unset fall back to the
/// in-process defaults.
pub struct QueueServiceBuilder {
    store: Arc<dyn QueueStore>,
    read_cache: ReadCache,
    push: Option<Arc<dyn PushNotifier>>,
    chat: Option<Arc<dyn ChatSessions>>,
    sink: Option<Arc<dyn ChangeSink>>,
}

impl QueueServiceBuilder {
    pub fn push(mut self, push: Arc<dyn PushNotifier>) -> Self {
        self.push = Some(push);
        self
    }

    pub fn chat(mut self, chat: Arc<dyn ChatSessions>) -> Self {
        self.chat = Some(chat);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn ChangeSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> QueueService {
        let push = self.push.unwrap_or_else(|| Arc::new(LogPushNotifier));
        let chat = self
            .chat
            .unwrap_or_else(|| Arc::new(MemoryChatSessions::new()));
        let sink = self.sink.unwrap_or_else(|| Arc::new(NullSink));
        QueueService {
            lifecycle: LifecycleService::new(self.store.clone(), push, chat),
            alerts: AlertRegistry::new(self.store.clone()),
            store: self.store,
            read_cache: self.read_cache,
            sink,
        }
    }
}

/// Upward surface over the lifecycle, read cache, and alert registry.
#[derive(Clone)]
pub struct QueueService {
    store: Arc<dyn QueueStore>,
    lifecycle: LifecycleService,
    read_cache: ReadCache,
    alerts: AlertRegistry,
    sink: Arc<dyn ChangeSink>,
}

impl QueueService {
    pub fn builder(store: Arc<dyn QueueStore>, read_cache: ReadCache) -> QueueServiceBuilder {
        QueueServiceBuilder {
            store,
            read_cache,
            push: None,
            chat: None,
            sink: None,
        }
    }

    pub fn store(&self) -> &Arc<dyn QueueStore> {
        &self.store
    }

    pub fn lifecycle(&self) -> &LifecycleService {
        &self.lifecycle
    }

    pub fn read_cache(&self) -> &ReadCache {
        &self.read_cache
    }

    pub fn alerts(&self) -> &AlertRegistry {
        &self.alerts
    }

    pub fn sink(&self) -> &Arc<dyn ChangeSink> {
        &self.sink
    }

    /// Refresh the cached snapshot and signal the sink. Returns the fresh
    /// snapshot when the refresh succeeded.
    pub async fn after_mutation(&self, queue_id: QueueId, kind: ChangeKind) -> Option<Snapshot> {
        let snapshot = match self.read_cache.refresh(queue_id).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(queue_id = %queue_id, error = %e, "snapshot refresh failed after mutation");
                // The entry predates the mutation; the next read rebuilds it.
                if let Err(e) = self.read_cache.invalidate(queue_id).await {
                    warn!(queue_id = %queue_id, error = %e, "snapshot invalidation failed");
                }
                None
            }
        };
        self.sink.queue_changed(queue_id, kind);
        snapshot
    }

    pub async fn change_status(
        &self,
        question_id: QuestionId,
        new: QuestionStatus,
        actor: UserId,
        role: Role,
    ) -> Result<TransitionOutcome, OfficeHoursError> {
        let outcome = self
            .lifecycle
            .change_status(question_id, new, actor, role)
            .await?;
        if !outcome.changed {
            return Ok(outcome);
        }

        let queue_id = outcome.question.queue_id;
        let snapshot = self.after_mutation(queue_id, ChangeKind::Questions).await;
        if new == QuestionStatus::Helping || new.is_terminal() {
            self.sink.queue_changed(queue_id, ChangeKind::ChatSessions);
        }
        if outcome.left_line() {
            if let Some(snapshot) = snapshot {
                self.notify_third_in_line(queue_id, &snapshot).await;
            }
        }
        Ok(outcome)
    }

    /// The priority line is served first, so it counts ahead of the
    /// regular line when finding who is now third.
    async fn notify_third_in_line(&self, queue_id: QueueId, snapshot: &Snapshot) {
        let Some(third) = snapshot
            .priority_queue
            .iter()
            .chain(snapshot.questions.iter())
            .nth(2)
        else {
            return;
        };
        let Some(creator) = third.creator_id() else {
            return;
        };
        let event = PushEvent::ThirdInLine {
            queue_id,
            question_id: third.id,
        };
        if let Err(e) = self.lifecycle.push().notify(creator, event).await {
            warn!(user_id = %creator, error = %e, "third-in-line push failed");
        }
    }

    /// The unredacted snapshot of a queue.
    pub async fn get_questions(&self, queue_id: QueueId) -> Result<Snapshot, OfficeHoursError> {
        self.read_cache.get_questions(queue_id).await
    }

    pub async fn personalized(
        &self,
        queue_id: QueueId,
        viewer: UserId,
        role: Role,
    ) -> Result<Snapshot, OfficeHoursError> {
        self.read_cache.personalized(queue_id, viewer, role).await
    }

    pub async fn create_question(
        &self,
        draft: QuestionDraft,
    ) -> Result<officehours_core::model::Question, OfficeHoursError> {
        let question = self.lifecycle.create_question(draft, Utc::now()).await?;
        self.after_mutation(question.queue_id, ChangeKind::Questions)
            .await;
        Ok(question)
    }

    /// Add a staff member to the queue. Returns false if already checked in.
    pub async fn check_in(
        &self,
        queue_id: QueueId,
        user_id: UserId,
        role: Role,
    ) -> Result<bool, OfficeHoursError> {
        require_staff(role, "check in")?;
        let course_id = self.queue_course(queue_id).await?;
        let added = self.store.add_staff(queue_id, user_id).await?;
        if added {
            let now = Utc::now();
            self.record_event(user_id, course_id, queue_id, StaffEventKind::CheckedIn, now)
                .await?;
            // Staff are back: pending leave prompts no longer apply.
            self.alerts
                .resolve_for_queue(queue_id, Some(AlertType::PromptStudentToLeaveQueue), now)
                .await?;
            info!(queue_id = %queue_id, user_id = %user_id, "staff checked in");
            self.after_mutation(queue_id, ChangeKind::QueueMeta).await;
        }
        Ok(added)
    }

    /// Remove a staff member and report whether the queue is now empty.
    pub async fn check_out(
        &self,
        queue_id: QueueId,
        user_id: UserId,
    ) -> Result<CheckOutOutcome, OfficeHoursError> {
        let course_id = self.queue_course(queue_id).await?;
        let removed = self.store.remove_staff(queue_id, user_id).await?;
        if !removed {
            return Ok(CheckOutOutcome {
                removed: false,
                queue_emptied: false,
            });
        }
        self.record_event(user_id, course_id, queue_id, StaffEventKind::CheckedOut, Utc::now())
            .await?;
        let queue_emptied = self
            .store
            .get_queue(queue_id)
            .await?
            .is_some_and(|q| !q.is_staffed());
        info!(queue_id = %queue_id, user_id = %user_id, queue_emptied, "staff checked out");
        self.after_mutation(queue_id, ChangeKind::QueueMeta).await;
        Ok(CheckOutOutcome {
            removed,
            queue_emptied,
        })
    }

    /// Disable a queue: every live question goes stale and modal alerts
    /// referencing it are resolved.
    pub async fn disable_queue(&self, queue_id: QueueId, role: Role) -> Result<usize, OfficeHoursError> {
        require_staff(role, "disable a queue")?;
        let now = Utc::now();
        self.store.set_queue_disabled(queue_id, true).await?;
        let staled = self
            .lifecycle
            .reclaim_live(queue_id, None, QuestionStatus::Stale, now)
            .await?;
        self.alerts.resolve_for_queue(queue_id, None, now).await?;
        info!(queue_id = %queue_id, staled = staled.len(), "queue disabled");
        self.after_mutation(queue_id, ChangeKind::Questions).await;
        self.sink.queue_changed(queue_id, ChangeKind::QueueMeta);
        Ok(staled.len())
    }

    /// Replace a queue's tag and task schema.
    pub async fn update_queue_config(
        &self,
        queue_id: QueueId,
        settings: QueueSettings,
        role: Role,
    ) -> Result<(), OfficeHoursError> {
        require_staff(role, "edit queue settings")?;
        settings.validate().map_err(OfficeHoursError::Validation)?;
        self.store.update_queue_settings(queue_id, &settings).await?;
        info!(queue_id = %queue_id, tags = settings.tags.len(), "queue settings updated");
        self.after_mutation(queue_id, ChangeKind::QueueMeta).await;
        Ok(())
    }

    /// Group questions so one staff member handles them together.
    pub async fn create_group(
        &self,
        queue_id: QueueId,
        actor: UserId,
        role: Role,
        question_ids: &[QuestionId],
    ) -> Result<QuestionGroup, OfficeHoursError> {
        require_staff(role, "create a group")?;
        let unique: BTreeSet<_> = question_ids.iter().copied().collect();
        if unique.is_empty() {
            return Err(OfficeHoursError::Validation(
                "a group needs at least one question".into(),
            ));
        }
        let ids: Vec<QuestionId> = unique.into_iter().collect();
        let group = self.store.create_group(queue_id, actor, &ids).await?;
        info!(queue_id = %queue_id, group_id = %group.id, size = ids.len(), "group created");
        self.after_mutation(queue_id, ChangeKind::Questions).await;
        Ok(group)
    }

    pub async fn list_alerts(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Vec<AlertView>, OfficeHoursError> {
        self.alerts.list_for_user(user_id, course_id, Utc::now()).await
    }

    /// Staff send an alert to a user. The payload must name a queue of the
    /// alert's course.
    pub async fn send_alert(
        &self,
        role: Role,
        raw: RawAlert,
    ) -> Result<AlertCreation, OfficeHoursError> {
        require_staff(role, "send alerts")?;
        let new = raw.into_new(Utc::now())?;
        let queue_id = new.payload.queue_id();
        if self.queue_course(queue_id).await? != new.course_id {
            return Err(OfficeHoursError::Validation(format!(
                "queue {queue_id} is not part of course {}",
                new.course_id
            )));
        }
        let creation = self.alerts.create(new).await?;
        if creation.is_new() {
            self.after_mutation(queue_id, ChangeKind::Questions).await;
        }
        Ok(creation)
    }

    pub async fn resolve_alert(
        &self,
        alert_id: officehours_core::AlertId,
        owner: UserId,
    ) -> Result<bool, OfficeHoursError> {
        let resolved = self
            .alerts
            .resolve(alert_id, Some(owner), Utc::now())
            .await?;
        if resolved {
            if let Some(alert) = self.store.get_alert(alert_id).await? {
                self.after_mutation(alert.payload.queue_id(), ChangeKind::Questions)
                    .await;
            }
        }
        Ok(resolved)
    }

    /// The queue, or `NotFound`.
    pub async fn require_queue(&self, queue_id: QueueId) -> Result<Queue, OfficeHoursError> {
        self.store
            .get_queue(queue_id)
            .await?
            .ok_or_else(|| OfficeHoursError::not_found("queue", queue_id))
    }

    async fn queue_course(&self, queue_id: QueueId) -> Result<CourseId, OfficeHoursError> {
        Ok(self.require_queue(queue_id).await?.course_id)
    }

    async fn record_event(
        &self,
        user_id: UserId,
        course_id: CourseId,
        queue_id: QueueId,
        kind: StaffEventKind,
        at: DateTime<Utc>,
    ) -> Result<(), OfficeHoursError> {
        self.store
            .record_staff_event(&StaffEvent {
                user_id,
                course_id,
                queue_id,
                kind,
                at,
            })
            .await
    }
}

fn require_staff(role: Role, action: &str) -> Result<(), OfficeHoursError> {
    if role.is_staff() {
        Ok(())
    } else {
        Err(OfficeHoursError::Validation(format!(
            "only staff may {action}"
        )))
    }
}
