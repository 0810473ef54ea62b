// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. Every function takes `&Database` and runs on the
//! single writer thread.

pub mod alerts;
pub mod events;
pub mod groups;
pub mod questions;
pub mod queues;
pub mod users;

use std::str::FromStr;

use rusqlite::types::Type;
use serde::de::DeserializeOwned;

/// Reads a TEXT column through `FromStr` (strum enums).
pub(crate) fn parse_column<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Reads a TEXT column holding JSON.
pub(crate) fn json_column<T: DeserializeOwned>(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Serializes a value for a JSON TEXT column before it enters a closure.
pub(crate) fn to_json<T: serde::Serialize>(
    value: &T,
) -> Result<String, officehours_core::OfficeHoursError> {
    serde_json::to_string(value).map_err(|e| officehours_core::OfficeHoursError::Storage {
        source: Box::new(e),
    })
}
