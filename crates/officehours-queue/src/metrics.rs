// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric descriptions, recording helpers, and the Prometheus recorder.
//!
//! Recorded through the `metrics` facade. The binary installs the Prometheus
//! recorder at startup and the gateway renders it on `GET /metrics`; without
//! a recorder the calls are no-ops.

use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use officehours_core::{ChangeKind, OfficeHoursError, QuestionStatus};

/// Install the process-wide Prometheus recorder and describe the counters.
///
/// Only one recorder can be installed per process; a second call fails.
pub fn install_prometheus() -> Result<PrometheusHandle, OfficeHoursError> {
    let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        OfficeHoursError::Internal(format!("failed to install Prometheus recorder: {e}"))
    })?;
    register_metrics();
    tracing::info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Register metric descriptions. Call once at startup.
pub fn register_metrics() {
    describe_counter!(
        "officehours_transitions_total",
        "Accepted question status transitions"
    );
    describe_counter!(
        "officehours_broadcasts_total",
        "Snapshot deliveries to queue subscribers"
    );
    describe_counter!(
        "officehours_job_failures_total",
        "Background job runs that ended in an error"
    );
}

pub fn record_transition(from: QuestionStatus, to: QuestionStatus) {
    metrics::counter!(
        "officehours_transitions_total",
        "from" => from.to_string(),
        "to" => to.to_string()
    )
    .increment(1);
}

pub fn record_broadcast(kind: ChangeKind, deliveries: usize) {
    metrics::counter!("officehours_broadcasts_total", "kind" => kind.to_string())
        .increment(deliveries as u64);
}

pub fn record_job_failure(job: &str) {
    metrics::counter!("officehours_job_failures_total", "job" => job.to_string()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_the_rendered_output() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            register_metrics();
            record_transition(QuestionStatus::Queued, QuestionStatus::Helping);
            record_transition(QuestionStatus::Queued, QuestionStatus::Helping);
            record_broadcast(ChangeKind::Questions, 3);
            record_job_failure("daily_sweep");
        });

        let text = handle.render();
        assert!(
            text.contains(r#"officehours_transitions_total{from="Queued",to="Helping"} 2"#),
            "{text}"
        );
        assert!(text.contains("officehours_broadcasts_total"), "{text}");
        assert!(
            text.contains(r#"officehours_job_failures_total{job="daily_sweep"} 1"#),
            "{text}"
        );
    }
}
