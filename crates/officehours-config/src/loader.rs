// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Merge order, later wins: compiled defaults, `/etc/officehours/officehours.toml`,
//! `~/.config/officehours/officehours.toml`, `./officehours.toml`, then
//! `OFFICEHOURS_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::OfficeHoursConfig;

/// Config sections, used to turn `OFFICEHOURS_RECLAIM_ENABLED` into `reclaim.enabled`.
const SECTIONS: &[&str] = &[
    "server", "storage", "queue", "broadcast", "reclaim", "metrics",
];

/// Candidate config files, lowest precedence first.
pub fn config_file_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/officehours/officehours.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("officehours/officehours.toml"));
    }
    paths.push(PathBuf::from("officehours.toml"));
    paths
}

/// Build the full layered Figment.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(OfficeHoursConfig::default()));
    for path in config_file_paths() {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(env_provider())
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<OfficeHoursConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<OfficeHoursConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OfficeHoursConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<OfficeHoursConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OfficeHoursConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Maps `OFFICEHOURS_<SECTION>_<KEY>` onto `<section>.<key>`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `OFFICEHOURS_RECLAIM_LEAVE_PROMPT_DELAY_SECS` lands on
/// `reclaim.leave_prompt_delay_secs`.
fn env_provider() -> Env {
    Env::prefixed("OFFICEHOURS_").map(|key| {
        let key = key.as_str();
        for section in SECTIONS {
            if let Some(rest) = key
                .strip_prefix(section)
                .and_then(|rest| rest.strip_prefix('_'))
            {
                return format!("{section}.{rest}").into();
            }
        }
        key.to_string().into()
    })
}
