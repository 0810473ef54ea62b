// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot maintenance commands.

use std::path::Path;
use std::sync::Arc;

use officehours_config::OfficeHoursConfig;
use officehours_config::loader::config_file_paths;
use officehours_core::{NullSink, OfficeHoursError, QueueId};
use officehours_reclaim::{Reclaimer, SweepReport};

use crate::wiring::{Core, init_tracing};

async fn open(config: &OfficeHoursConfig) -> Result<(Core, Reclaimer), OfficeHoursError> {
    init_tracing(&config.server.log_level);
    let core = Core::open(config).await?;
    let service = core.service(Arc::new(NullSink));
    let reclaimer = core.reclaimer(service, config);
    Ok((core, reclaimer))
}

fn print_report(report: &SweepReport) {
    println!(
        "queues cleaned: {}, questions staled: {}, alerts resolved: {}",
        report.queues_cleaned, report.questions_staled, report.alerts_resolved
    );
}

pub async fn run_sweep(config: OfficeHoursConfig) -> Result<(), OfficeHoursError> {
    let (core, reclaimer) = open(&config).await?;
    let report = reclaimer.daily_sweep().await;
    core.store.close().await?;
    let report =
        report.ok_or_else(|| OfficeHoursError::Internal("daily sweep failed, see log".into()))?;
    print_report(&report);
    Ok(())
}

pub async fn run_clean(config: OfficeHoursConfig, queue: i64, force: bool) -> Result<(), OfficeHoursError> {
    let (core, reclaimer) = open(&config).await?;
    let report = reclaimer.clean_queue(QueueId(queue), force).await;
    core.store.close().await?;
    let report = report?;
    if report.queues_cleaned == 0 {
        println!("queue {queue} has staff checked in, use --force to clean anyway");
    } else {
        print_report(&report);
    }
    Ok(())
}

pub async fn run_force_checkout(config: OfficeHoursConfig) -> Result<(), OfficeHoursError> {
    let (core, reclaimer) = open(&config).await?;
    let removed = reclaimer.staff_force_checkout().await;
    core.store.close().await?;
    let removed = removed
        .ok_or_else(|| OfficeHoursError::Internal("forced checkout failed, see log".into()))?;
    println!("staff checked out: {removed}");
    Ok(())
}

pub fn check_config(config: &OfficeHoursConfig, explicit: Option<&Path>) {
    match explicit {
        Some(path) => println!("config file: {}", path.display()),
        None => {
            for path in config_file_paths() {
                let state = if path.exists() { "found" } else { "absent" };
                println!("config file: {} ({state})", path.display());
            }
        }
    }
    println!("server: {}:{}", config.server.host, config.server.port);
    println!(
        "bearer token: {}",
        if config.server.bearer_token.is_some() { "set" } else { "NOT SET" }
    );
    println!("database: {}", config.storage.database_path);
    println!(
        "reclaim: enabled={}, sweep=`{}`, force checkout=`{}`, leave delay={}s",
        config.reclaim.enabled,
        config.reclaim.daily_sweep_cron,
        config.reclaim.force_checkout_cron,
        config.reclaim.leave_prompt_delay_secs
    );
    println!("config OK");
}
