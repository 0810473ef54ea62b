// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The snapshot read model kept in the [`SnapshotCache`].

use std::sync::Arc;

use tracing::{debug, warn};

use officehours_core::model::{AlertType, DeliveryMode};
use officehours_core::{OfficeHoursError, QueueId, QueueStore, Role, SnapshotCache, UserId};

use crate::snapshot::{Snapshot, personalize};

/// Cache key holding the serialized snapshot of a queue.
pub fn cache_key(queue_id: QueueId) -> String {
    format!("q:{queue_id}")
}

/// Derives queue snapshots from the store and keeps them in the cache.
///
/// The cached value is always a full overwrite. A missing or unreadable
/// entry is rebuilt on read, so the cache can be dropped at any time.
#[derive(Clone)]
pub struct ReadCache {
    store: Arc<dyn QueueStore>,
    cache: Arc<dyn SnapshotCache>,
    max_questions: usize,
}

impl ReadCache {
    pub fn new(
        store: Arc<dyn QueueStore>,
        cache: Arc<dyn SnapshotCache>,
        max_questions: usize,
    ) -> Self {
        Self {
            store,
            cache,
            max_questions,
        }
    }

    /// Build a snapshot straight from the store.
    pub async fn compute(&self, queue_id: QueueId) -> Result<Snapshot, OfficeHoursError> {
        let records = self
            .store
            .list_live_questions(queue_id, self.max_questions)
            .await?;
        let groups = self.store.list_groups(queue_id).await?;
        let alerts = self
            .store
            .list_unresolved_alerts_for_queue(
                queue_id,
                Some(AlertType::PromptStudentToLeaveQueue),
                Some(DeliveryMode::Modal),
            )
            .await?;
        Ok(Snapshot::from_parts(records, groups, alerts))
    }

    /// Recompute and overwrite the cache entry for `queue_id`.
    ///
    /// A cache write failure is logged, the outdated entry is dropped, and
    /// the fresh snapshot is still returned; store failures propagate.
    pub async fn refresh(&self, queue_id: QueueId) -> Result<Snapshot, OfficeHoursError> {
        let snapshot = self.compute(queue_id).await?;
        let key = cache_key(queue_id);
        let written = match serde_json::to_string(&snapshot) {
            Ok(value) => match self.cache.set(&key, value).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(queue_id = %queue_id, error = %e, "snapshot cache write failed");
                    false
                }
            },
            Err(e) => {
                warn!(queue_id = %queue_id, error = %e, "snapshot serialization failed");
                false
            }
        };
        if !written {
            if let Err(e) = self.invalidate(queue_id).await {
                warn!(queue_id = %queue_id, error = %e, "snapshot invalidation failed");
            }
        }
        debug!(queue_id = %queue_id, "snapshot refreshed");
        Ok(snapshot)
    }

    /// The unredacted snapshot, from the cache when possible.
    pub async fn get_questions(&self, queue_id: QueueId) -> Result<Snapshot, OfficeHoursError> {
        let key = cache_key(queue_id);
        match self.cache.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Snapshot>(&raw) {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) => {
                    warn!(queue_id = %queue_id, error = %e, "unreadable snapshot entry, rebuilding")
                }
            },
            Ok(None) => debug!(queue_id = %queue_id, "snapshot cache miss"),
            Err(e) => warn!(queue_id = %queue_id, error = %e, "snapshot cache read failed"),
        }
        self.refresh(queue_id).await
    }

    /// `viewer`'s copy of the queue snapshot.
    pub async fn personalized(
        &self,
        queue_id: QueueId,
        viewer: UserId,
        role: Role,
    ) -> Result<Snapshot, OfficeHoursError> {
        let snapshot = self.get_questions(queue_id).await?;
        Ok(personalize(&snapshot, viewer, role))
    }

    /// Drop the cache entry. The next read rebuilds it.
    pub async fn invalidate(&self, queue_id: QueueId) -> Result<(), OfficeHoursError> {
        self.cache.delete(&cache_key(queue_id)).await
    }
}
