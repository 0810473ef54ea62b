// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cron-driven job loops.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use croner::Cron;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use officehours_core::OfficeHoursError;

/// Parse a five-field cron pattern.
pub fn parse_schedule(pattern: &str) -> Result<Cron, OfficeHoursError> {
    pattern
        .parse::<Cron>()
        .map_err(|e| OfficeHoursError::Config(format!("invalid cron pattern `{pattern}`: {e}")))
}

/// Time from `now` until the schedule next fires, or `None` if it never does.
pub fn next_delay(cron: &Cron, now: DateTime<Utc>) -> Option<Duration> {
    let next = cron.find_next_occurrence(&now, false).ok()?;
    Some((next - now).to_std().unwrap_or(Duration::ZERO))
}

/// Run `job` each time `cron` fires until `cancel` is triggered.
///
/// Runs are sequential: a slow run delays the next computation of the
/// schedule rather than overlapping with it.
pub async fn run_cron<F, Fut>(name: &'static str, cron: Cron, cancel: CancellationToken, mut job: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    info!(job = name, "cron loop started");
    loop {
        let Some(delay) = next_delay(&cron, Utc::now()) else {
            warn!(job = name, "schedule has no further occurrences, stopping");
            break;
        };
        debug!(job = name, delay_secs = delay.as_secs(), "waiting for next run");
        tokio::select! {
            _ = tokio::time::sleep(delay) => job().await,
            _ = cancel.cancelled() => {
                info!(job = name, "cron loop shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn rejects_garbage_patterns() {
        let err = parse_schedule("every morning").unwrap_err();
        assert!(matches!(err, OfficeHoursError::Config(_)));
        assert!(parse_schedule("0 8 * * *").is_ok());
    }

    #[test]
    fn delay_until_next_morning() {
        let cron = parse_schedule("0 8 * * *").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 7, 30, 0).unwrap();
        assert_eq!(next_delay(&cron, now), Some(Duration::from_secs(30 * 60)));

        let after = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
        assert_eq!(
            next_delay(&cron, after),
            Some(Duration::from_secs(24 * 3600)),
            "an exact match is not re-fired"
        );
    }

    #[tokio::test]
    async fn cancelled_loop_returns_without_running() {
        let cron = parse_schedule("0 8 * * *").unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut runs = 0;
        run_cron("test", cron, cancel, || {
            runs += 1;
            async {}
        })
        .await;
        assert_eq!(runs, 0);
    }
}
