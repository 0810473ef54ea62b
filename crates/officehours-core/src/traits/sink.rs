// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification hook fired after every accepted queue mutation.

use crate::types::{ChangeKind, QueueId};

/// Receives "this queue changed" signals after the cache was refreshed.
///
/// Implementations must not block: the broadcast hub only records the signal
/// and delivers later on its throttle window.
pub trait ChangeSink: Send + Sync + 'static {
    fn queue_changed(&self, queue_id: QueueId, kind: ChangeKind);
}

/// A sink that drops every signal. Used by one-shot CLI commands.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ChangeSink for NullSink {
    fn queue_changed(&self, _queue_id: QueueId, _kind: ChangeKind) {}
}
