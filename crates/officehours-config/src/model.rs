// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! Every section rejects unknown keys so typos surface at startup.

use serde::{Deserialize, Serialize};

/// Top-level officehours configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OfficeHoursConfig {
    /// HTTP/WebSocket server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Read-model settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Subscriber push settings.
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// Background reclamation settings.
    #[serde(default)]
    pub reclaim: ReclaimConfig,

    /// Prometheus exporter settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// HTTP/WebSocket server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token required on API routes. `None` rejects every API call.
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3080
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("officehours").join("officehours.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("officehours.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Read-model configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Upper bound on live questions loaded into one snapshot.
    #[serde(default = "default_max_questions")]
    pub max_questions_per_queue: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_questions_per_queue: default_max_questions(),
        }
    }
}

fn default_max_questions() -> usize {
    200
}

/// Broadcast configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BroadcastConfig {
    /// Trailing-edge throttle window per (queue, change kind), in milliseconds.
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,

    /// Outbound buffer per subscriber connection.
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            throttle_ms: default_throttle_ms(),
            subscriber_buffer: default_subscriber_buffer(),
        }
    }
}

fn default_throttle_ms() -> u64 {
    1000
}

fn default_subscriber_buffer() -> usize {
    16
}

/// Background reclamation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReclaimConfig {
    /// Run the cron-driven jobs. Leave-queue prompts still work when off.
    #[serde(default = "default_reclaim_enabled")]
    pub enabled: bool,

    /// Cron expression (UTC) for the stale-question sweep.
    #[serde(default = "default_daily_sweep_cron")]
    pub daily_sweep_cron: String,

    /// Cron expression (UTC) for the forced staff checkout.
    #[serde(default = "default_force_checkout_cron")]
    pub force_checkout_cron: String,

    /// Delay before an unanswered leave-queue prompt removes the student.
    #[serde(default = "default_leave_prompt_delay_secs")]
    pub leave_prompt_delay_secs: u64,
}

impl Default for ReclaimConfig {
    fn default() -> Self {
        Self {
            enabled: default_reclaim_enabled(),
            daily_sweep_cron: default_daily_sweep_cron(),
            force_checkout_cron: default_force_checkout_cron(),
            leave_prompt_delay_secs: default_leave_prompt_delay_secs(),
        }
    }
}

fn default_reclaim_enabled() -> bool {
    true
}

fn default_daily_sweep_cron() -> String {
    "0 8 * * *".to_string()
}

fn default_force_checkout_cron() -> String {
    "0 7 * * *".to_string()
}

fn default_leave_prompt_delay_secs() -> u64 {
    600
}

/// Prometheus exporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Install the recorder and serve `GET /metrics`.
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

fn default_metrics_enabled() -> bool {
    true
}
