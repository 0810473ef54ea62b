// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Display identity for users. Accounts themselves live upstream.

use officehours_core::model::UserSummary;
use officehours_core::{OfficeHoursError, UserId};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// Insert or refresh a user's display fields.
pub async fn upsert_user(
    db: &Database,
    id: UserId,
    name: &str,
    photo_url: Option<&str>,
) -> Result<(), OfficeHoursError> {
    let name = name.to_string();
    let photo_url = photo_url.map(str::to_string);
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO users (id, name, photo_url) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name, photo_url = excluded.photo_url",
                params![id.0, name, photo_url],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_user(db: &Database, id: UserId) -> Result<Option<UserSummary>, OfficeHoursError> {
    db.connection()
        .call(move |conn| -> Result<Option<UserSummary>, rusqlite::Error> {
            conn.query_row(
                "SELECT id, name, photo_url FROM users WHERE id = ?1",
                params![id.0],
                |row| {
                    Ok(UserSummary {
                        id: UserId(row.get(0)?),
                        name: row.get(1)?,
                        photo_url: row.get(2)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
