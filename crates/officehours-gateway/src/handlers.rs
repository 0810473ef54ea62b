// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the queue REST API.

use std::collections::BTreeSet;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use officehours_core::model::{DeliveryMode, Question, QuestionGroup, QueueSettings};
use officehours_core::{AlertId, CourseId, QuestionId, QuestionStatus, QueueId, UserId};
use officehours_queue::{AlertView, QuestionDraft, RawAlert, Snapshot};

use crate::auth::Identity;
use crate::error::ApiError;
use crate::server::GatewayState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: QuestionStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResponse {
    pub question: Question,
    pub previous: QuestionStatus,
    pub changed: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateQuestionRequest {
    pub text: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub is_task_question: bool,
    /// `Queued` (default) or `Drafting`.
    #[serde(default = "default_new_status")]
    pub status: QuestionStatus,
}

fn default_new_status() -> QuestionStatus {
    QuestionStatus::Queued
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResponse {
    pub checked_in: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutResponse {
    pub removed: bool,
    pub queue_emptied: bool,
    /// Leave prompts issued because the queue lost its last staff member.
    pub prompts_sent: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct CleanParams {
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanResponse {
    pub queues_cleaned: usize,
    pub questions_staled: usize,
    pub alerts_resolved: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisableResponse {
    pub questions_staled: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRequest {
    pub question_ids: Vec<QuestionId>,
}

#[derive(Debug, Deserialize)]
pub struct AlertParams {
    pub course_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendAlertRequest {
    pub user_id: i64,
    pub course_id: i64,
    pub alert_type: String,
    pub payload: serde_json::Value,
    #[serde(default = "default_delivery_mode")]
    pub delivery_mode: DeliveryMode,
}

fn default_delivery_mode() -> DeliveryMode {
    DeliveryMode::Modal
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub resolved: bool,
}

fn require_staff(identity: &Identity, action: &str) -> Result<(), ApiError> {
    if identity.role.is_staff() {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!("only staff may {action}")))
    }
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    })
}

/// GET /metrics, Prometheus text format.
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.metrics_render {
        Some(render) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

/// PATCH /v1/questions/{id}/status
pub async fn patch_question_status(
    State(state): State<GatewayState>,
    identity: Identity,
    Path(question_id): Path<i64>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let outcome = state
        .service
        .change_status(
            QuestionId(question_id),
            body.status,
            identity.user_id,
            identity.role,
        )
        .await?;
    Ok(Json(TransitionResponse {
        question: outcome.question,
        previous: outcome.previous,
        changed: outcome.changed,
    }))
}

/// POST /v1/queues/{id}/questions
pub async fn post_question(
    State(state): State<GatewayState>,
    identity: Identity,
    Path(queue_id): Path<i64>,
    Json(body): Json<CreateQuestionRequest>,
) -> Result<(StatusCode, Json<Question>), ApiError> {
    let question = state
        .service
        .create_question(QuestionDraft {
            queue_id: QueueId(queue_id),
            creator_id: identity.user_id,
            text: body.text,
            tags: body.tags,
            is_task_question: body.is_task_question,
            status: body.status,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(question)))
}

/// GET /v1/queues/{id}/questions
pub async fn get_questions(
    State(state): State<GatewayState>,
    identity: Identity,
    Path(queue_id): Path<i64>,
) -> Result<Json<Snapshot>, ApiError> {
    let queue_id = QueueId(queue_id);
    state.service.require_queue(queue_id).await?;
    let snapshot = state
        .service
        .personalized(queue_id, identity.user_id, identity.role)
        .await?;
    Ok(Json(snapshot))
}

/// POST /v1/queues/{id}/checkin
pub async fn post_checkin(
    State(state): State<GatewayState>,
    identity: Identity,
    Path(queue_id): Path<i64>,
) -> Result<Json<CheckInResponse>, ApiError> {
    let checked_in = state
        .service
        .check_in(QueueId(queue_id), identity.user_id, identity.role)
        .await?;
    Ok(Json(CheckInResponse { checked_in }))
}

/// POST /v1/queues/{id}/checkout
///
/// When the last staff member leaves, students still waiting are asked
/// whether they want to stay.
pub async fn post_checkout(
    State(state): State<GatewayState>,
    identity: Identity,
    Path(queue_id): Path<i64>,
) -> Result<Json<CheckOutResponse>, ApiError> {
    let queue_id = QueueId(queue_id);
    let outcome = state.service.check_out(queue_id, identity.user_id).await?;
    let prompts_sent = if outcome.queue_emptied {
        state
            .reclaimer
            .leave_queue_prompt(queue_id)
            .await
            .unwrap_or(0)
    } else {
        0
    };
    Ok(Json(CheckOutResponse {
        removed: outcome.removed,
        queue_emptied: outcome.queue_emptied,
        prompts_sent,
    }))
}

/// POST /v1/queues/{id}/clean?force=true
pub async fn post_clean(
    State(state): State<GatewayState>,
    identity: Identity,
    Path(queue_id): Path<i64>,
    Query(params): Query<CleanParams>,
) -> Result<Json<CleanResponse>, ApiError> {
    require_staff(&identity, "clean a queue")?;
    let report = state
        .reclaimer
        .clean_queue(QueueId(queue_id), params.force)
        .await?;
    Ok(Json(CleanResponse {
        queues_cleaned: report.queues_cleaned,
        questions_staled: report.questions_staled,
        alerts_resolved: report.alerts_resolved,
    }))
}

/// POST /v1/queues/{id}/disable
pub async fn post_disable(
    State(state): State<GatewayState>,
    identity: Identity,
    Path(queue_id): Path<i64>,
) -> Result<Json<DisableResponse>, ApiError> {
    let questions_staled = state
        .service
        .disable_queue(QueueId(queue_id), identity.role)
        .await?;
    Ok(Json(DisableResponse { questions_staled }))
}

/// PUT /v1/queues/{id}/settings
pub async fn put_settings(
    State(state): State<GatewayState>,
    identity: Identity,
    Path(queue_id): Path<i64>,
    Json(settings): Json<QueueSettings>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .update_queue_config(QueueId(queue_id), settings, identity.role)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/queues/{id}/groups
pub async fn post_group(
    State(state): State<GatewayState>,
    identity: Identity,
    Path(queue_id): Path<i64>,
    Json(body): Json<GroupRequest>,
) -> Result<(StatusCode, Json<QuestionGroup>), ApiError> {
    let group = state
        .service
        .create_group(
            QueueId(queue_id),
            identity.user_id,
            identity.role,
            &body.question_ids,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(group)))
}

/// GET /v1/alerts?course_id=
pub async fn get_alerts(
    State(state): State<GatewayState>,
    identity: Identity,
    Query(params): Query<AlertParams>,
) -> Result<Json<Vec<AlertView>>, ApiError> {
    let alerts = state
        .service
        .list_alerts(identity.user_id, CourseId(params.course_id))
        .await?;
    Ok(Json(alerts))
}

/// POST /v1/alerts
///
/// 201 for a new alert, 200 when an equivalent one is still unresolved.
pub async fn post_alert(
    State(state): State<GatewayState>,
    identity: Identity,
    Json(body): Json<SendAlertRequest>,
) -> Result<(StatusCode, Json<AlertView>), ApiError> {
    require_staff(&identity, "send alerts")?;
    let creation = state
        .service
        .send_alert(
            identity.role,
            RawAlert {
                user_id: UserId(body.user_id),
                course_id: CourseId(body.course_id),
                alert_type: body.alert_type,
                payload: body.payload,
                delivery_mode: body.delivery_mode,
            },
        )
        .await?;
    let status = if creation.is_new() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(AlertView::from(creation.alert().clone()))))
}

/// PATCH /v1/alerts/{id}/resolve
pub async fn patch_resolve_alert(
    State(state): State<GatewayState>,
    identity: Identity,
    Path(alert_id): Path<i64>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let resolved = state
        .service
        .resolve_alert(AlertId(alert_id), identity.user_id)
        .await?;
    Ok(Json(ResolveResponse { resolved }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_defaults_to_queued() {
        let body: CreateQuestionRequest =
            serde_json::from_str(r#"{"text": "segfault in lab 3"}"#).unwrap();
        assert_eq!(body.status, QuestionStatus::Queued);
        assert!(body.tags.is_empty());
        assert!(!body.is_task_question);
    }

    #[test]
    fn create_request_rejects_unknown_fields() {
        let err = serde_json::from_str::<CreateQuestionRequest>(r#"{"text": "x", "helper": 3}"#);
        assert!(err.is_err());
    }

    #[test]
    fn send_alert_request_defaults_to_modal() {
        let body: SendAlertRequest = serde_json::from_str(
            r#"{"userId": 100, "courseId": 7, "alertType": "eventEndedCheckoutStaff", "payload": {"queueId": 2}}"#,
        )
        .unwrap();
        assert_eq!(body.delivery_mode, DeliveryMode::Modal);
        assert_eq!(body.payload["queueId"], 2);
    }

    #[test]
    fn status_request_uses_variant_names() {
        let body: StatusRequest = serde_json::from_str(r#"{"status": "PriorityQueued"}"#).unwrap();
        assert_eq!(body.status, QuestionStatus::PriorityQueued);
    }
}
