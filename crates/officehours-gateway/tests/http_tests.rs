// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST surface driven through the router without a socket.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use officehours_core::{QuestionStatus, UserId};
use officehours_gateway::{AuthConfig, BroadcastHub, GatewayState, router};
use officehours_reclaim::Reclaimer;
use officehours_test_utils::{COURSE, TestHarness};

const TOKEN: &str = "test-token";
const TA: UserId = UserId(5);
const ALICE: UserId = UserId(100);
const BOB: UserId = UserId(101);

fn app(h: &TestHarness) -> Router {
    with_auth(state(h))
}

fn with_auth(state: GatewayState) -> Router {
    router(
        state,
        AuthConfig {
            bearer_token: Some(TOKEN.to_string()),
        },
    )
}

fn state(h: &TestHarness) -> GatewayState {
    let hub = BroadcastHub::new(
        h.read_cache.clone(),
        h.dyn_store(),
        h.chat.clone(),
        &h.config.broadcast,
    );
    let service = h.service_with_sink(Arc::new(hub.clone()));
    let reclaimer = Reclaimer::new(service.clone(), h.reporter.clone(), &h.config.reclaim);
    GatewayState::new(service, reclaimer, hub)
}

fn request(method: &str, uri: &str, who: Option<(UserId, &str)>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {TOKEN}"));
    if let Some((user, role)) = who {
        builder = builder
            .header("x-user-id", user.0.to_string())
            .header("x-user-role", role);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn health_is_public() {
    let h = TestHarness::builder().build().await.unwrap();
    let app = app(&h);
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn metrics_are_public_when_enabled() {
    let h = TestHarness::builder().build().await.unwrap();
    let get_metrics = || Request::builder().uri("/metrics").body(Body::empty()).unwrap();

    let response = app(&h).oneshot(get_metrics()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let app = with_auth(state(&h).with_metrics(Arc::new(|| "officehours_up 1\n".to_string())));
    let response = app.oneshot(get_metrics()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/plain; version=0.0.4"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"officehours_up 1\n");
}

#[tokio::test]
async fn api_requires_token_and_identity() {
    let h = TestHarness::builder().build().await.unwrap();
    let app = app(&h);
    let queue = h.queue_with_staff(&[TA]).await.unwrap();
    let uri = format!("/v1/queues/{queue}/questions");

    let no_token = Request::builder().uri(&uri).body(Body::empty()).unwrap();
    assert_eq!(send(&app, no_token).await.0, StatusCode::UNAUTHORIZED);

    let wrong = Request::builder()
        .uri(&uri)
        .header("authorization", "Bearer nope")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, wrong).await.0, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, request("GET", &uri, None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "unauthorized");
}

#[tokio::test]
async fn no_configured_token_rejects_everything() {
    let h = TestHarness::builder().build().await.unwrap();
    let hub = BroadcastHub::new(
        h.read_cache.clone(),
        h.dyn_store(),
        h.chat.clone(),
        &h.config.broadcast,
    );
    let service = h.service();
    let reclaimer = Reclaimer::new(service.clone(), h.reporter.clone(), &h.config.reclaim);
    let app = router(
        GatewayState::new(service, reclaimer, hub),
        AuthConfig { bearer_token: None },
    );
    let (status, _) = send(&app, request("GET", "/v1/alerts?course_id=7", Some((ALICE, "student")), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn question_flow_over_http() {
    let h = TestHarness::builder().build().await.unwrap();
    let app = app(&h);
    let queue = h.queue_with_staff(&[TA]).await.unwrap();

    let (status, created) = send(
        &app,
        request(
            "POST",
            &format!("/v1/queues/{queue}/questions"),
            Some((ALICE, "student")),
            Some(json!({"text": "why does my loop never end"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "Queued");
    let id = created["id"].as_i64().unwrap();

    // A second live question from the same student is rejected.
    let (status, body) = send(
        &app,
        request(
            "POST",
            &format!("/v1/queues/{queue}/questions"),
            Some((ALICE, "student")),
            Some(json!({"text": "another one"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    // Bob sees Alice's question redacted.
    let (status, snapshot) = send(
        &app,
        request("GET", &format!("/v1/queues/{queue}/questions"), Some((BOB, "student")), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["questions"][0]["id"], id);
    assert!(snapshot["questions"][0].get("detail").is_none());

    // A student may not start helping.
    let (status, _) = send(
        &app,
        request(
            "PATCH",
            &format!("/v1/questions/{id}/status"),
            Some((ALICE, "student")),
            Some(json!({"status": "Helping"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, outcome) = send(
        &app,
        request(
            "PATCH",
            &format!("/v1/questions/{id}/status"),
            Some((TA, "ta")),
            Some(json!({"status": "Helping"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["changed"], true);
    assert_eq!(outcome["previous"], "Queued");
    assert_eq!(outcome["question"]["helperId"], TA.0);

    // Another TA cannot take it over.
    let (status, body) = send(
        &app,
        request(
            "PATCH",
            &format!("/v1/questions/{id}/status"),
            Some((UserId(6), "professor")),
            Some(json!({"status": "Resolved"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "conflict");
}

#[tokio::test]
async fn unknown_resources_are_404() {
    let h = TestHarness::builder().build().await.unwrap();
    let app = app(&h);

    let (status, body) = send(
        &app,
        request("GET", "/v1/queues/999/questions", Some((ALICE, "student")), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");

    let (status, _) = send(
        &app,
        request(
            "PATCH",
            "/v1/questions/999/status",
            Some((TA, "ta")),
            Some(json!({"status": "Helping"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn last_checkout_prompts_waiting_students() {
    let h = TestHarness::builder().build().await.unwrap();
    let app = app(&h);
    let queue = h.queue_with_staff(&[TA]).await.unwrap();
    h.question(queue, ALICE, QuestionStatus::Queued).await.unwrap();

    let (status, body) = send(
        &app,
        request("POST", &format!("/v1/queues/{queue}/checkout"), Some((TA, "ta")), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["queueEmptied"], true);
    assert_eq!(body["promptsSent"], 1);

    let (status, alerts) = send(
        &app,
        request(
            "GET",
            &format!("/v1/alerts?course_id={}", COURSE.0),
            Some((ALICE, "student")),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let alerts = alerts.as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["payload"]["type"], "promptStudentToLeaveQueue");
    assert_eq!(alerts[0]["deliveryMode"], "modal");

    // Alice chooses to stay.
    let alert_id = alerts[0]["id"].as_i64().unwrap();
    let (status, _) = send(
        &app,
        request("PATCH", &format!("/v1/alerts/{alert_id}/resolve"), Some((BOB, "student")), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "only the owner may resolve");
    let (status, body) = send(
        &app,
        request("PATCH", &format!("/v1/alerts/{alert_id}/resolve"), Some((ALICE, "student")), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resolved"], true);

    // Checking back in is reported once.
    let uri = format!("/v1/queues/{queue}/checkin");
    let (_, first) = send(&app, request("POST", &uri, Some((TA, "ta")), None)).await;
    let (_, second) = send(&app, request("POST", &uri, Some((TA, "ta")), None)).await;
    assert_eq!(first["checkedIn"], true);
    assert_eq!(second["checkedIn"], false);
}

#[tokio::test]
async fn clean_is_staff_only() {
    let h = TestHarness::builder().build().await.unwrap();
    let app = app(&h);
    let queue = h.queue_with_staff(&[TA]).await.unwrap();
    let q = h.question(queue, ALICE, QuestionStatus::Queued).await.unwrap();
    let uri = format!("/v1/queues/{queue}/clean?force=true");

    let (status, body) = send(&app, request("POST", &uri, Some((ALICE, "student")), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "forbidden");

    let (status, _) = send(
        &app,
        request("POST", &format!("/v1/queues/{queue}/clean"), Some((TA, "ta")), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.reload(&q).await.unwrap().status, QuestionStatus::Queued);

    let (status, body) = send(&app, request("POST", &uri, Some((TA, "ta")), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["questionsStaled"], 1);
    assert_eq!(h.reload(&q).await.unwrap().status, QuestionStatus::Stale);
}

#[tokio::test]
async fn settings_and_groups() {
    let h = TestHarness::builder().build().await.unwrap();
    let app = app(&h);
    let queue = h.queue_with_staff(&[TA]).await.unwrap();
    let a = h.question(queue, ALICE, QuestionStatus::Queued).await.unwrap();
    let b = h.question(queue, BOB, QuestionStatus::Queued).await.unwrap();

    let (status, _) = send(
        &app,
        request(
            "PUT",
            &format!("/v1/queues/{queue}/settings"),
            Some((ALICE, "student")),
            Some(json!({})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, group) = send(
        &app,
        request(
            "POST",
            &format!("/v1/queues/{queue}/groups"),
            Some((TA, "ta")),
            Some(json!({"questionIds": [a.id.0, b.id.0, a.id.0]})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(group["questionIds"].as_array().unwrap().len(), 2);

    let (status, body) = send(
        &app,
        request("POST", &format!("/v1/queues/{queue}/disable"), Some((TA, "ta")), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["questionsStaled"], 2);
}

#[tokio::test]
async fn staff_send_alerts_over_http() {
    let h = TestHarness::builder().build().await.unwrap();
    let app = app(&h);
    let queue = h.queue_with_staff(&[TA]).await.unwrap();
    let q = h.question(queue, ALICE, QuestionStatus::Queued).await.unwrap();
    let leave = json!({
        "userId": ALICE.0,
        "courseId": COURSE.0,
        "alertType": "promptStudentToLeaveQueue",
        "payload": { "queueId": queue.0 },
    });

    let (status, _) = send(
        &app,
        request("POST", "/v1/alerts", Some((BOB, "student")), Some(leave.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/v1/alerts",
            Some((TA, "ta")),
            Some(json!({
                "userId": ALICE.0,
                "courseId": COURSE.0,
                "alertType": "rephraseQuestion",
                "payload": { "queueId": queue.0 },
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap_or_default().contains("rephraseQuestion"));

    let (status, first) = send(
        &app,
        request("POST", "/v1/alerts", Some((TA, "ta")), Some(leave.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["deliveryMode"], "modal");
    assert_eq!(first["payload"]["type"], "promptStudentToLeaveQueue");

    let (status, second) = send(
        &app,
        request("POST", "/v1/alerts", Some((TA, "ta")), Some(leave)),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "an unresolved leave prompt is reused");
    assert_eq!(second["id"], first["id"]);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/v1/alerts",
            Some((TA, "ta")),
            Some(json!({
                "userId": ALICE.0,
                "courseId": COURSE.0,
                "alertType": "rephraseQuestion",
                "payload": { "queueId": queue.0, "questionId": q.id.0 },
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}
