// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Every external dependency of the core sits behind one of these traits and
//! extends [`Collaborator`]. Async traits use `#[async_trait]` so they can be
//! held as `Arc<dyn Trait>`.

pub mod cache;
pub mod chat;
pub mod collaborator;
pub mod push;
pub mod reporter;
pub mod sink;
pub mod store;

pub use cache::SnapshotCache;
pub use chat::ChatSessions;
pub use collaborator::Collaborator;
pub use push::PushNotifier;
pub use reporter::ErrorReporter;
pub use sink::{ChangeSink, NullSink};
pub use store::QueueStore;
