// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error-tracking collaborator for background job failures.

use crate::error::OfficeHoursError;
use crate::traits::collaborator::Collaborator;

/// Receives failures caught at a background job boundary.
pub trait ErrorReporter: Collaborator {
    fn capture(&self, job: &str, error: &OfficeHoursError);
}
