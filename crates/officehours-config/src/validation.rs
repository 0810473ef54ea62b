// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks run after deserialization.
//!
//! All problems are collected before returning so an operator sees the full
//! list in one run.

use crate::diagnostic::ConfigError;
use crate::model::OfficeHoursConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
pub fn validate_config(config: &OfficeHoursConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::validation("server.host must not be empty"));
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        errors.push(ConfigError::validation(format!(
            "server.host `{host}` is not an IP address or hostname"
        )));
    }

    if !LOG_LEVELS.contains(&config.server.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "server.log_level `{}` must be one of {}",
            config.server.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if let Some(token) = &config.server.bearer_token {
        if token.trim().is_empty() {
            errors.push(ConfigError::validation(
                "server.bearer_token must not be blank when set",
            ));
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if config.queue.max_questions_per_queue == 0 {
        errors.push(ConfigError::validation(
            "queue.max_questions_per_queue must be greater than 0",
        ));
    }

    if config.broadcast.throttle_ms == 0 {
        errors.push(ConfigError::validation(
            "broadcast.throttle_ms must be greater than 0",
        ));
    }

    if config.broadcast.subscriber_buffer == 0 {
        errors.push(ConfigError::validation(
            "broadcast.subscriber_buffer must be greater than 0",
        ));
    }

    if config.reclaim.leave_prompt_delay_secs == 0 {
        errors.push(ConfigError::validation(
            "reclaim.leave_prompt_delay_secs must be greater than 0",
        ));
    }

    for (key, pattern) in [
        ("reclaim.daily_sweep_cron", &config.reclaim.daily_sweep_cron),
        (
            "reclaim.force_checkout_cron",
            &config.reclaim.force_checkout_cron,
        ),
    ] {
        if let Err(e) = pattern.parse::<croner::Cron>() {
            errors.push(ConfigError::validation(format!(
                "{key} `{pattern}` is not a valid cron expression: {e}"
            )));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
