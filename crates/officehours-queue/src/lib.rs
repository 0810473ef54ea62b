// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Question lifecycle, snapshot read model, and alerts.
//!
//! [`QueueService`] is the entry point: it applies transitions through
//! [`LifecycleService`], keeps the [`ReadCache`] current, and signals a
//! [`officehours_core::ChangeSink`] after every accepted mutation.

pub mod alerts;
pub mod cache;
pub mod defaults;
pub mod lifecycle;
pub mod metrics;
pub mod service;
pub mod snapshot;

pub use alerts::{AlertCreation, AlertRegistry, AlertView, RawAlert, assert_payload_type};
pub use cache::{ReadCache, cache_key};
pub use defaults::{LogPushNotifier, MemoryChatSessions, MemorySnapshotCache, TracingErrorReporter};
pub use lifecycle::{
    LifecycleService, QuestionDraft, SYSTEM_ACTOR, SideEffect, TransitionOutcome, TransitionPlan,
    plan_transition,
};
pub use service::{CheckOutOutcome, QueueService, QueueServiceBuilder};
pub use snapshot::{QuestionDetail, QuestionView, Snapshot, personalize};
