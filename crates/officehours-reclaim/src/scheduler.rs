// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reclamation jobs and the scheduler that runs them.
//!
//! Every entry point is wrapped in a job boundary: a failure is logged,
//! handed to the [`ErrorReporter`], counted, and swallowed, so neither the
//! cron loops nor a pending timer ever die from a job error.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use officehours_config::model::ReclaimConfig;
use officehours_core::model::{
    AlertPayload, DeliveryMode, NewAlert, StaffEvent, StaffEventKind,
};
use officehours_core::{
    AlertId, ChangeKind, CourseId, ErrorReporter, OfficeHoursError, QuestionStatus, QueueId,
    UserId,
};
use officehours_queue::{AlertCreation, QueueService, metrics};

use crate::cron::{parse_schedule, run_cron};
use crate::timers::{TimerKey, TimerRegistry};

/// Outcome of a sweep over one or more queues.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub queues_cleaned: usize,
    pub questions_staled: usize,
    pub alerts_resolved: usize,
}

impl SweepReport {
    fn absorb(&mut self, other: SweepReport) {
        self.queues_cleaned += other.queues_cleaned;
        self.questions_staled += other.questions_staled;
        self.alerts_resolved += other.alerts_resolved;
    }
}

/// Drives abandoned state to terminal statuses through the queue service.
#[derive(Clone)]
pub struct Reclaimer {
    service: QueueService,
    reporter: Arc<dyn ErrorReporter>,
    timers: Arc<TimerRegistry>,
    leave_delay: Duration,
}

impl Reclaimer {
    pub fn new(service: QueueService, reporter: Arc<dyn ErrorReporter>, config: &ReclaimConfig) -> Self {
        Self {
            service,
            reporter,
            timers: TimerRegistry::new(),
            leave_delay: Duration::from_secs(config.leave_prompt_delay_secs),
        }
    }

    pub fn timers(&self) -> &Arc<TimerRegistry> {
        &self.timers
    }

    /// Run `body`, reporting and swallowing any error.
    pub async fn run_job<T, Fut>(&self, job: &'static str, body: Fut) -> Option<T>
    where
        Fut: Future<Output = Result<T, OfficeHoursError>>,
    {
        match body.await {
            Ok(value) => Some(value),
            Err(e) => {
                error!(job, error = %e, "reclamation job failed");
                self.reporter.capture(job, &e);
                metrics::record_job_failure(job);
                None
            }
        }
    }

    // --- DailySweep ---

    /// Stale every live question in queues that have no staff left.
    pub async fn daily_sweep(&self) -> Option<SweepReport> {
        self.run_job("daily_sweep", self.sweep_unstaffed(Utc::now()))
            .await
    }

    async fn sweep_unstaffed(&self, now: DateTime<Utc>) -> Result<SweepReport, OfficeHoursError> {
        let store = self.service.store();
        let mut report = SweepReport::default();
        for queue_id in store.queues_with_live_questions().await? {
            let Some(queue) = store.get_queue(queue_id).await? else {
                continue;
            };
            if queue.is_staffed() {
                continue;
            }
            report.absorb(self.clean(queue_id, now).await?);
        }
        info!(
            queues = report.queues_cleaned,
            questions = report.questions_staled,
            "daily sweep finished"
        );
        Ok(report)
    }

    // --- CleanQueue ---

    /// Sweep a single queue. Without `force` a staffed queue is left alone.
    pub async fn clean_queue(&self, queue_id: QueueId, force: bool) -> Result<SweepReport, OfficeHoursError> {
        let queue = self
            .service
            .store()
            .get_queue(queue_id)
            .await?
            .ok_or_else(|| OfficeHoursError::not_found("queue", queue_id))?;
        if !force && queue.is_staffed() {
            debug!(queue_id = %queue_id, "queue is staffed, not cleaning");
            return Ok(SweepReport::default());
        }
        self.clean(queue_id, Utc::now()).await
    }

    async fn clean(&self, queue_id: QueueId, now: DateTime<Utc>) -> Result<SweepReport, OfficeHoursError> {
        let staled = self
            .service
            .lifecycle()
            .reclaim_live(queue_id, None, QuestionStatus::Stale, now)
            .await?;
        let alerts_resolved = self.service.alerts().resolve_for_queue(queue_id, None, now).await?;
        self.service
            .after_mutation(queue_id, ChangeKind::Questions)
            .await;
        info!(
            queue_id = %queue_id,
            questions = staled.len(),
            alerts = alerts_resolved,
            "queue cleaned"
        );
        Ok(SweepReport {
            queues_cleaned: 1,
            questions_staled: staled.len(),
            alerts_resolved,
        })
    }

    // --- StaffForceCheckout ---

    /// Check every staff member out of every queue.
    pub async fn staff_force_checkout(&self) -> Option<usize> {
        self.run_job("staff_force_checkout", self.force_checkout(Utc::now()))
            .await
    }

    async fn force_checkout(&self, now: DateTime<Utc>) -> Result<usize, OfficeHoursError> {
        let store = self.service.store();
        let mut removed = 0;
        for queue in store.list_queues().await? {
            let staff = store.clear_staff(queue.id).await?;
            if staff.is_empty() {
                continue;
            }
            for user_id in &staff {
                store
                    .record_staff_event(&StaffEvent {
                        user_id: *user_id,
                        course_id: queue.course_id,
                        queue_id: queue.id,
                        kind: StaffEventKind::ForcedCheckout,
                        at: now,
                    })
                    .await?;
                self.service
                    .alerts()
                    .create(NewAlert {
                        user_id: *user_id,
                        course_id: queue.course_id,
                        payload: AlertPayload::EventEndedCheckoutStaff { queue_id: queue.id },
                        delivery_mode: DeliveryMode::Feed,
                        sent: now,
                    })
                    .await?;
            }
            removed += staff.len();
            info!(queue_id = %queue.id, staff = staff.len(), "forced staff checkout");
            self.service
                .after_mutation(queue.id, ChangeKind::QueueMeta)
                .await;
        }
        Ok(removed)
    }

    // --- LeaveQueuePrompt ---

    /// Prompt every student still waiting in an unstaffed queue, then arm a
    /// timer per student. Returns how many new prompts were created.
    pub async fn leave_queue_prompt(&self, queue_id: QueueId) -> Option<usize> {
        self.run_job("leave_queue_prompt", self.prompt_students(queue_id, Utc::now()))
            .await
    }

    async fn prompt_students(&self, queue_id: QueueId, now: DateTime<Utc>) -> Result<usize, OfficeHoursError> {
        let store = self.service.store();
        let Some(queue) = store.get_queue(queue_id).await? else {
            return Err(OfficeHoursError::not_found("queue", queue_id));
        };
        if queue.is_staffed() {
            debug!(queue_id = %queue_id, "staff present, no leave prompt");
            return Ok(0);
        }

        let records = store.list_live_questions(queue_id, usize::MAX).await?;
        let mut students = BTreeSet::new();
        let mut first_question = BTreeMap::new();
        for record in &records {
            let creator = record.question.creator_id;
            students.insert(creator);
            first_question.entry(creator).or_insert(record.question.id);
        }

        let mut created = 0;
        for student in students {
            let creation = self
                .service
                .alerts()
                .create(NewAlert {
                    user_id: student,
                    course_id: queue.course_id,
                    payload: AlertPayload::PromptStudentToLeaveQueue {
                        queue_id,
                        question_id: first_question.get(&student).copied(),
                    },
                    delivery_mode: DeliveryMode::Modal,
                    sent: now,
                })
                .await?;
            match creation {
                AlertCreation::Created(alert) => {
                    created += 1;
                    self.arm_leave_timer(queue_id, student, queue.course_id, alert.id);
                }
                AlertCreation::Duplicate(alert) => {
                    // Keep the running deadline; only re-arm a timer that was lost.
                    let key = TimerKey::leave_queue(queue_id, student);
                    if self.timers.is_pending(&key) {
                        debug!(queue_id = %queue_id, student_id = %student, "leave prompt already pending");
                    } else {
                        self.arm_leave_timer(queue_id, student, queue.course_id, alert.id);
                    }
                }
            }
        }

        if created > 0 {
            self.service
                .after_mutation(queue_id, ChangeKind::Questions)
                .await;
        }
        info!(queue_id = %queue_id, prompts = created, "leave prompts issued");
        Ok(created)
    }

    fn arm_leave_timer(&self, queue_id: QueueId, student: UserId, course_id: CourseId, alert_id: AlertId) {
        let key = TimerKey::leave_queue(queue_id, student);
        let this = self.clone();
        self.timers.schedule(key, self.leave_delay, async move {
            this.auto_leave_queue(student, queue_id, course_id, alert_id)
                .await;
        });
    }

    // --- autoLeaveQueue ---

    /// Timer body: remove a student who ignored the prompt, or re-check later
    /// if they chose to stay.
    pub async fn auto_leave_queue(
        &self,
        student: UserId,
        queue_id: QueueId,
        course_id: CourseId,
        alert_id: AlertId,
    ) -> Option<usize> {
        self.run_job(
            "auto_leave_queue",
            self.leave_or_recheck(student, queue_id, course_id, alert_id, Utc::now()),
        )
        .await
    }

    async fn leave_or_recheck(
        &self,
        student: UserId,
        queue_id: QueueId,
        course_id: CourseId,
        alert_id: AlertId,
        now: DateTime<Utc>,
    ) -> Result<usize, OfficeHoursError> {
        let store = self.service.store();
        let alert = store
            .get_alert(alert_id)
            .await?
            .ok_or_else(|| OfficeHoursError::not_found("alert", alert_id))?;

        if alert.is_resolved() {
            // The student chose to stay. Look again after another delay.
            debug!(
                queue_id = %queue_id,
                student_id = %student,
                course_id = %course_id,
                "leave prompt answered, rechecking later"
            );
            let this = self.clone();
            self.timers.schedule(
                TimerKey::leave_queue(queue_id, student),
                self.leave_delay,
                async move {
                    this.leave_queue_prompt(queue_id).await;
                },
            );
            return Ok(0);
        }

        store.resolve_alert(alert_id, now).await?;
        let left = self
            .service
            .lifecycle()
            .reclaim_live(queue_id, Some(student), QuestionStatus::LeftDueToNoStaff, now)
            .await?;
        info!(
            queue_id = %queue_id,
            student_id = %student,
            questions = left.len(),
            "student removed from unstaffed queue"
        );
        self.service
            .after_mutation(queue_id, ChangeKind::Questions)
            .await;
        Ok(left.len())
    }
}

/// Spawn the two cron loops. Both stop when `cancel` fires.
pub fn spawn_cron_jobs(
    reclaimer: Reclaimer,
    config: &ReclaimConfig,
    cancel: CancellationToken,
) -> Result<Vec<JoinHandle<()>>, OfficeHoursError> {
    let sweep = parse_schedule(&config.daily_sweep_cron)?;
    let checkout = parse_schedule(&config.force_checkout_cron)?;

    let sweeper = reclaimer.clone();
    let sweep_cancel = cancel.clone();
    let sweep_task = tokio::spawn(async move {
        run_cron("daily_sweep", sweep, sweep_cancel, || {
            let r = sweeper.clone();
            async move {
                r.daily_sweep().await;
            }
        })
        .await;
    });

    let checkout_task = tokio::spawn(async move {
        run_cron("staff_force_checkout", checkout, cancel, || {
            let r = reclaimer.clone();
            async move {
                r.staff_force_checkout().await;
            }
        })
        .await;
    });

    Ok(vec![sweep_task, checkout_task])
}
