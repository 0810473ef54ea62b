// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed out-of-band alerts: creation with dedup, lazy staleness, and
//! payload validation.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use officehours_core::model::{Alert, AlertPayload, AlertType, DeliveryMode, NewAlert};
use officehours_core::{AlertId, CourseId, OfficeHoursError, QueueId, QueueStore, UserId};

/// What a client gets back when listing alerts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertView {
    pub id: AlertId,
    pub payload: AlertPayload,
    pub delivery_mode: DeliveryMode,
    pub sent: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl From<Alert> for AlertView {
    fn from(alert: Alert) -> Self {
        Self {
            id: alert.id,
            payload: alert.payload,
            delivery_mode: alert.delivery_mode,
            sent: alert.sent,
            read_at: alert.read_at,
        }
    }
}

/// Result of [`AlertRegistry::create`].
#[derive(Debug, Clone, PartialEq)]
pub enum AlertCreation {
    Created(Alert),
    /// An equivalent unresolved alert already existed; nothing was written.
    Duplicate(Alert),
}

impl AlertCreation {
    pub fn alert(&self) -> &Alert {
        match self {
            AlertCreation::Created(a) | AlertCreation::Duplicate(a) => a,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, AlertCreation::Created(_))
    }
}

/// Structural check of a raw payload against a named alert type, yielding
/// the typed payload.
///
/// Unknown type names pass with `None`, so clients may carry alert kinds this
/// server does not model. [`RawAlert::into_new`] runs every client-supplied
/// alert through this check before anything is stored.
pub fn assert_payload_type(
    alert_type: &str,
    payload: &serde_json::Value,
) -> Result<Option<AlertPayload>, OfficeHoursError> {
    let Ok(expected) = AlertType::from_str(alert_type) else {
        debug!(alert_type, "unknown alert type accepted without validation");
        return Ok(None);
    };

    let invalid = |message: String| OfficeHoursError::InvalidPayload {
        kind: alert_type.to_string(),
        message,
    };

    let Some(fields) = payload.as_object() else {
        return Err(invalid("payload must be a JSON object".into()));
    };
    let mut tagged = fields.clone();
    tagged.insert("type".into(), serde_json::Value::String(alert_type.to_string()));

    let parsed: AlertPayload =
        serde_json::from_value(serde_json::Value::Object(tagged)).map_err(|e| invalid(e.to_string()))?;
    if parsed.alert_type() != expected {
        return Err(invalid(format!(
            "payload describes {} instead",
            parsed.alert_type()
        )));
    }
    Ok(Some(parsed))
}

/// A client-supplied alert: type name and payload as they arrived.
#[derive(Debug, Clone)]
pub struct RawAlert {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub alert_type: String,
    pub payload: serde_json::Value,
    pub delivery_mode: DeliveryMode,
}

impl RawAlert {
    /// Validate the payload and type it. A type name that only passes the
    /// check because it is unknown cannot be stored and is rejected.
    pub fn into_new(self, sent: DateTime<Utc>) -> Result<NewAlert, OfficeHoursError> {
        let Some(payload) = assert_payload_type(&self.alert_type, &self.payload)? else {
            return Err(OfficeHoursError::Validation(format!(
                "alert type `{}` cannot be stored",
                self.alert_type
            )));
        };
        Ok(NewAlert {
            user_id: self.user_id,
            course_id: self.course_id,
            payload,
            delivery_mode: self.delivery_mode,
            sent,
        })
    }
}

/// Alert operations over the store.
#[derive(Clone)]
pub struct AlertRegistry {
    store: Arc<dyn QueueStore>,
}

impl AlertRegistry {
    pub fn new(store: Arc<dyn QueueStore>) -> Self {
        Self { store }
    }

    /// Unresolved alerts of one type referencing a queue, any delivery mode.
    pub async fn unresolved_for(
        &self,
        queue_id: QueueId,
        alert_type: AlertType,
    ) -> Result<Vec<Alert>, OfficeHoursError> {
        self.store
            .list_unresolved_alerts_for_queue(queue_id, Some(alert_type), None)
            .await
    }

    /// Insert an alert. A modal leave prompt is deduplicated per
    /// (user, queue): if one is unresolved it is returned instead.
    pub async fn create(&self, new: NewAlert) -> Result<AlertCreation, OfficeHoursError> {
        if new.delivery_mode == DeliveryMode::Modal
            && new.payload.alert_type() == AlertType::PromptStudentToLeaveQueue
        {
            let existing = self
                .store
                .list_unresolved_alerts_for_queue(
                    new.payload.queue_id(),
                    Some(AlertType::PromptStudentToLeaveQueue),
                    Some(DeliveryMode::Modal),
                )
                .await?;
            if let Some(alert) = existing.into_iter().find(|a| a.user_id == new.user_id) {
                return Ok(AlertCreation::Duplicate(alert));
            }
        }
        let alert = self.store.insert_alert(&new).await?;
        info!(
            alert_id = %alert.id,
            user_id = %alert.user_id,
            alert_type = %alert.alert_type(),
            "alert created"
        );
        Ok(AlertCreation::Created(alert))
    }

    /// Resolve an alert. When `owner` is given the alert must belong to them,
    /// otherwise it is reported as not found. Returns false if it was already
    /// resolved.
    pub async fn resolve(
        &self,
        id: AlertId,
        owner: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<bool, OfficeHoursError> {
        let alert = self
            .store
            .get_alert(id)
            .await?
            .ok_or_else(|| OfficeHoursError::not_found("alert", id))?;
        if owner.is_some_and(|o| o != alert.user_id) {
            return Err(OfficeHoursError::not_found("alert", id));
        }
        self.store.resolve_alert(id, now).await
    }

    /// Resolve unresolved modal alerts that reference `queue_id`, optionally
    /// only those of one type.
    pub async fn resolve_for_queue(
        &self,
        queue_id: QueueId,
        alert_type: Option<AlertType>,
        now: DateTime<Utc>,
    ) -> Result<usize, OfficeHoursError> {
        let alerts = self
            .store
            .list_unresolved_alerts_for_queue(queue_id, alert_type, Some(DeliveryMode::Modal))
            .await?;
        let mut resolved = 0;
        for alert in alerts {
            if self.store.resolve_alert(alert.id, now).await? {
                resolved += 1;
            }
        }
        if resolved > 0 {
            debug!(queue_id = %queue_id, resolved, "resolved modal alerts for queue");
        }
        Ok(resolved)
    }

    /// A user's unresolved alerts in a course, after stale removal.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        course_id: CourseId,
        now: DateTime<Utc>,
    ) -> Result<Vec<AlertView>, OfficeHoursError> {
        let alerts = self
            .store
            .list_alerts_for_user(user_id, course_id, false)
            .await?;
        self.remove_stale_alerts(alerts, now).await
    }

    /// Re-check alerts whose validity depends on live state. Invalid ones are
    /// resolved and left out of the result.
    ///
    /// - rephrase: stale once the question closed or its queue is disabled
    ///   or unstaffed;
    /// - leave prompt: stale once the student has nothing live in the queue;
    /// - forced checkout notice: stale once the staff member checked back in.
    pub async fn remove_stale_alerts(
        &self,
        alerts: Vec<Alert>,
        now: DateTime<Utc>,
    ) -> Result<Vec<AlertView>, OfficeHoursError> {
        let mut kept = Vec::with_capacity(alerts.len());
        for alert in alerts {
            if alert.is_resolved() {
                continue;
            }
            if self.is_still_valid(&alert).await? {
                kept.push(AlertView::from(alert));
            } else {
                self.store.resolve_alert(alert.id, now).await?;
                debug!(alert_id = %alert.id, "resolved stale alert on read");
            }
        }
        Ok(kept)
    }

    async fn is_still_valid(&self, alert: &Alert) -> Result<bool, OfficeHoursError> {
        match &alert.payload {
            AlertPayload::RephraseQuestion {
                question_id,
                queue_id,
            } => {
                let question_open = self
                    .store
                    .get_question(*question_id)
                    .await?
                    .is_some_and(|q| !q.status.is_terminal());
                if !question_open {
                    return Ok(false);
                }
                Ok(self
                    .store
                    .get_queue(*queue_id)
                    .await?
                    .is_some_and(|q| !q.is_disabled && q.is_staffed()))
            }
            AlertPayload::PromptStudentToLeaveQueue { queue_id, .. } => Ok(!self
                .store
                .list_live_questions_for_student(*queue_id, alert.user_id)
                .await?
                .is_empty()),
            AlertPayload::EventEndedCheckoutStaff { queue_id } => Ok(self
                .store
                .get_queue(*queue_id)
                .await?
                .is_some_and(|q| !q.staff.contains(&alert.user_id))),
        }
    }
}
