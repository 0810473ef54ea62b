// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for officehours integration tests.
//!
//! Provides recording collaborators and a harness over a temp SQLite
//! database, so tests run without any external service.
//!
//! # Components
//!
//! - [`RecordingPush`] - push notifier capturing every event
//! - [`MockChat`] - chat sessions with call log and injectable `end` failure
//! - [`MockCache`] - snapshot cache with injectable read/write failures
//! - [`RecordingSink`] / [`RecordingReporter`] - change signals and job failures

pub mod harness;
pub mod mock_cache;
pub mod mock_chat;
pub mod mock_push;
pub mod recorders;

pub use harness::{COURSE, TestHarness};
pub use mock_cache::MockCache;
pub use mock_chat::{ChatCall, MockChat};
pub use mock_push::RecordingPush;
pub use recorders::{RecordingReporter, RecordingSink};
