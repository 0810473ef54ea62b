// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `officehours serve`: gateway plus reclamation scheduler.

use std::sync::Arc;

use tracing::{info, warn};

use officehours_config::OfficeHoursConfig;
use officehours_core::OfficeHoursError;
use officehours_gateway::{BroadcastHub, GatewayState, start_server};
use officehours_reclaim::spawn_cron_jobs;

use crate::shutdown;
use crate::wiring::{Core, init_tracing};

/// Run until SIGINT/SIGTERM, then stop the cron loops, drop pending leave
/// timers, and close the database.
pub async fn run_serve(config: OfficeHoursConfig) -> Result<(), OfficeHoursError> {
    init_tracing(&config.server.log_level);
    let metrics = if config.metrics.enabled {
        match officehours_queue::metrics::install_prometheus() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "failed to install prometheus recorder, continuing without metrics");
                None
            }
        }
    } else {
        info!("metrics disabled");
        None
    };

    let core = Core::open(&config).await?;
    let hub = BroadcastHub::new(
        core.read_cache.clone(),
        core.dyn_store(),
        core.chat.clone(),
        &config.broadcast,
    );
    let service = core.service(Arc::new(hub.clone()));
    let reclaimer = core.reclaimer(service.clone(), &config);

    let cancel = shutdown::install_signal_handler();

    let cron = if config.reclaim.enabled {
        spawn_cron_jobs(reclaimer.clone(), &config.reclaim, cancel.clone())?
    } else {
        info!("reclamation scheduler disabled");
        Vec::new()
    };

    if config.server.bearer_token.is_none() {
        warn!("server.bearer_token is not set, every API request will be rejected");
    }

    info!(
        database = %config.storage.database_path,
        throttle_ms = config.broadcast.throttle_ms,
        "officehours starting"
    );
    let mut state = GatewayState::new(service, reclaimer.clone(), hub);
    if let Some(handle) = metrics {
        state = state.with_metrics(Arc::new(move || handle.render()));
    }
    let served = start_server(&config.server, state, cancel.clone()).await;

    cancel.cancel();
    let pending = reclaimer.timers().len();
    reclaimer.timers().cancel_all();
    if pending > 0 {
        info!(pending, "dropped pending leave timers");
    }
    for handle in cron {
        if let Err(e) = handle.await {
            warn!(error = %e, "cron task ended abnormally");
        }
    }
    core.store.close().await?;
    info!("officehours stopped");
    served
}
