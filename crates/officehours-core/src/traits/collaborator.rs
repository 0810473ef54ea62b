// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait that every external collaborator implements.

use async_trait::async_trait;

use crate::error::OfficeHoursError;
use crate::types::{CollaboratorKind, HealthStatus};

/// Identity and health for an external collaborator (store, cache, push, ...).
#[async_trait]
pub trait Collaborator: Send + Sync + 'static {
    /// Returns the human-readable name of this collaborator instance.
    fn name(&self) -> &str;

    /// Returns which collaborator role this instance fills.
    fn kind(&self) -> CollaboratorKind;

    /// Performs a health check and returns the current status.
    async fn health_check(&self) -> Result<HealthStatus, OfficeHoursError> {
        Ok(HealthStatus::Healthy)
    }
}
