// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Construction of the shared components.
//!
//! Order matters: the read cache sits on the store, the change sink (the
//! broadcast hub when serving) sits on the read cache, the queue service
//! signals the sink, and the reclaimer drives the service.

use std::sync::Arc;

use officehours_config::OfficeHoursConfig;
use officehours_core::{ChangeSink, ChatSessions, OfficeHoursError, QueueStore};
use officehours_queue::{
    LogPushNotifier, MemoryChatSessions, MemorySnapshotCache, QueueService, ReadCache,
    TracingErrorReporter,
};
use officehours_reclaim::Reclaimer;
use officehours_storage::SqliteStore;

pub struct Core {
    pub store: Arc<SqliteStore>,
    pub read_cache: ReadCache,
    pub chat: Arc<dyn ChatSessions>,
}

impl Core {
    pub async fn open(config: &OfficeHoursConfig) -> Result<Self, OfficeHoursError> {
        let store = Arc::new(SqliteStore::open(config.storage.clone()).await?);
        let read_cache = ReadCache::new(
            store.clone(),
            Arc::new(MemorySnapshotCache::new()),
            config.queue.max_questions_per_queue,
        );
        Ok(Self {
            store,
            read_cache,
            chat: Arc::new(MemoryChatSessions::new()),
        })
    }

    pub fn dyn_store(&self) -> Arc<dyn QueueStore> {
        self.store.clone()
    }

    pub fn service(&self, sink: Arc<dyn ChangeSink>) -> QueueService {
        QueueService::builder(self.dyn_store(), self.read_cache.clone())
            .push(Arc::new(LogPushNotifier))
            .chat(self.chat.clone())
            .sink(sink)
            .build()
    }

    pub fn reclaimer(&self, service: QueueService, config: &OfficeHoursConfig) -> Reclaimer {
        Reclaimer::new(service, Arc::new(TracingErrorReporter), &config.reclaim)
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("officehours={log_level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
