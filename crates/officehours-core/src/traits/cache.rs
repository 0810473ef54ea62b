// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-latency key-value store holding one serialized snapshot per queue.

use async_trait::async_trait;

use crate::error::OfficeHoursError;
use crate::traits::collaborator::Collaborator;

/// Key-value store for serialized queue snapshots.
///
/// Writers always replace the whole value for a key; there is no partial
/// update and no expiry.
#[async_trait]
pub trait SnapshotCache: Collaborator {
    /// Reads the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, OfficeHoursError>;

    /// Overwrites the value stored under `key`.
    async fn set(&self, key: &str, value: String) -> Result<(), OfficeHoursError>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), OfficeHoursError>;
}
