// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast hub and HTTP/WebSocket surface.
//!
//! [`BroadcastHub`] is the change sink wired into the queue service: every
//! accepted mutation arms a trailing-edge throttle per (queue, kind), and
//! when the window closes each subscriber of the queue's room gets a payload
//! personalized to its viewer. The axum router exposes the queue service
//! over REST and the hub over WebSocket.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod server;
pub mod throttle;
pub mod ws;

pub use auth::{AuthConfig, Identity};
pub use error::ApiError;
pub use hub::{BroadcastHub, HubMessage, HubPayload, Subscription, Viewer};
pub use server::{GatewayState, MetricsRender, router, start_server};
pub use throttle::Throttle;
