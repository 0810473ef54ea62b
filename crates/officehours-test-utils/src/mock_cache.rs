// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Snapshot cache wrapper with injectable faults.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use officehours_core::{Collaborator, CollaboratorKind, OfficeHoursError, SnapshotCache};
use officehours_queue::MemorySnapshotCache;

/// An in-memory cache that can fail reads or writes on demand and counts
/// writes, so tests can tell a cache hit from a rebuild.
#[derive(Default)]
pub struct MockCache {
    inner: MemorySnapshotCache,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MockCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, failing: bool) {
        self.fail_reads.store(failing, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    /// Successful `set` calls so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Overwrite an entry directly, bypassing fault injection.
    pub async fn poison(&self, key: &str, raw: &str) -> Result<(), OfficeHoursError> {
        self.inner.set(key, raw.to_string()).await
    }

    pub async fn raw(&self, key: &str) -> Result<Option<String>, OfficeHoursError> {
        self.inner.get(key).await
    }

    fn unavailable(op: &str) -> OfficeHoursError {
        OfficeHoursError::Cache {
            message: format!("injected {op} failure"),
            source: None,
        }
    }
}

#[async_trait]
impl Collaborator for MockCache {
    fn name(&self) -> &str {
        "mock-cache"
    }

    fn kind(&self) -> CollaboratorKind {
        CollaboratorKind::SnapshotCache
    }
}

#[async_trait]
impl SnapshotCache for MockCache {
    async fn get(&self, key: &str) -> Result<Option<String>, OfficeHoursError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::unavailable("read"));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), OfficeHoursError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::unavailable("write"));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), OfficeHoursError> {
        self.inner.delete(key).await
    }
}
