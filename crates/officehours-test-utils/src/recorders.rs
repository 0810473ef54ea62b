// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recorders for the synchronous hooks: change signals and job failures.

use std::sync::Mutex;

use async_trait::async_trait;

use officehours_core::{
    ChangeKind, ChangeSink, Collaborator, CollaboratorKind, ErrorReporter, OfficeHoursError,
    QueueId,
};

/// Records every `queue_changed` signal in order.
#[derive(Default)]
pub struct RecordingSink {
    signals: Mutex<Vec<(QueueId, ChangeKind)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signals(&self) -> Vec<(QueueId, ChangeKind)> {
        self.signals
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn count(&self, queue_id: QueueId, kind: ChangeKind) -> usize {
        self.signals()
            .iter()
            .filter(|s| **s == (queue_id, kind))
            .count()
    }
}

impl ChangeSink for RecordingSink {
    fn queue_changed(&self, queue_id: QueueId, kind: ChangeKind) {
        self.signals
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((queue_id, kind));
    }
}

/// Records `(job, error message)` for each captured failure.
#[derive(Default)]
pub struct RecordingReporter {
    captured: Mutex<Vec<(String, String)>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn captured(&self) -> Vec<(String, String)> {
        self.captured
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl Collaborator for RecordingReporter {
    fn name(&self) -> &str {
        "recording-reporter"
    }

    fn kind(&self) -> CollaboratorKind {
        CollaboratorKind::ErrorTracking
    }
}

impl ErrorReporter for RecordingReporter {
    fn capture(&self, job: &str, error: &OfficeHoursError) {
        self.captured
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((job.to_string(), error.to_string()));
    }
}
