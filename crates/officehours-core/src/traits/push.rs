// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push notification collaborator.

use async_trait::async_trait;

use crate::error::OfficeHoursError;
use crate::model::PushEvent;
use crate::traits::collaborator::Collaborator;
use crate::types::UserId;

/// Best-effort, fire-and-forget delivery of push events to a user.
///
/// Callers log failures and never retry.
#[async_trait]
pub trait PushNotifier: Collaborator {
    async fn notify(&self, user_id: UserId, event: PushEvent) -> Result<(), OfficeHoursError>;
}
