// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, patch, post, put},
};
use tokio_util::sync::CancellationToken;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use officehours_config::model::ServerConfig;
use officehours_core::OfficeHoursError;
use officehours_queue::QueueService;
use officehours_reclaim::Reclaimer;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;
use crate::hub::BroadcastHub;
use crate::ws;

/// Upper bound on requests handled at once.
const MAX_IN_FLIGHT: usize = 512;

/// Renders the metrics exposition text.
pub type MetricsRender = Arc<dyn Fn() -> String + Send + Sync>;

/// State for the unauthenticated health and metrics routes.
#[derive(Clone)]
pub struct HealthState {
    pub start_time: Instant,
    /// `None` when metrics are disabled; `/metrics` then answers 404.
    pub metrics_render: Option<MetricsRender>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub service: QueueService,
    pub reclaimer: Reclaimer,
    pub hub: BroadcastHub,
    pub health: HealthState,
}

impl GatewayState {
    pub fn new(service: QueueService, reclaimer: Reclaimer, hub: BroadcastHub) -> Self {
        Self {
            service,
            reclaimer,
            hub,
            health: HealthState {
                start_time: Instant::now(),
                metrics_render: None,
            },
        }
    }

    /// Serve `render` on `GET /metrics`.
    pub fn with_metrics(mut self, render: MetricsRender) -> Self {
        self.health.metrics_render = Some(render);
        self
    }
}

/// Build the router: `/health` is public, everything under `/v1` needs the
/// bearer token.
pub fn router(state: GatewayState, auth: AuthConfig) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route(
            "/v1/questions/{id}/status",
            patch(handlers::patch_question_status),
        )
        .route(
            "/v1/queues/{id}/questions",
            get(handlers::get_questions).post(handlers::post_question),
        )
        .route("/v1/queues/{id}/checkin", post(handlers::post_checkin))
        .route("/v1/queues/{id}/checkout", post(handlers::post_checkout))
        .route("/v1/queues/{id}/clean", post(handlers::post_clean))
        .route("/v1/queues/{id}/disable", post(handlers::post_disable))
        .route("/v1/queues/{id}/settings", put(handlers::put_settings))
        .route("/v1/queues/{id}/groups", post(handlers::post_group))
        .route("/v1/queues/{id}/ws", get(ws::ws_handler))
        .route(
            "/v1/alerts",
            get(handlers::get_alerts).post(handlers::post_alert),
        )
        .route(
            "/v1/alerts/{id}/resolve",
            patch(handlers::patch_resolve_alert),
        )
        .route_layer(axum_middleware::from_fn_with_state(auth, auth_middleware))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(ConcurrencyLimitLayer::new(MAX_IN_FLIGHT))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), OfficeHoursError> {
    let app = router(
        state,
        AuthConfig {
            bearer_token: config.bearer_token.clone(),
        },
    );

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| OfficeHoursError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| OfficeHoursError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}
