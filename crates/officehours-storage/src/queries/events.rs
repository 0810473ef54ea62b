// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Staff check-in / check-out history.

use officehours_core::model::StaffEvent;
use officehours_core::{CourseId, OfficeHoursError, QueueId, UserId};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::queries::parse_column;

pub async fn record(db: &Database, event: &StaffEvent) -> Result<(), OfficeHoursError> {
    let event = event.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO staff_events (user_id, course_id, queue_id, kind, at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    event.user_id.0,
                    event.course_id.0,
                    event.queue_id.0,
                    event.kind.to_string(),
                    event.at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Events for a queue, oldest first.
pub async fn list_for_queue(
    db: &Database,
    queue_id: QueueId,
) -> Result<Vec<StaffEvent>, OfficeHoursError> {
    db.connection()
        .call(move |conn| -> Result<Vec<StaffEvent>, rusqlite::Error> {
            let mut stmt = conn.prepare_cached(
                "SELECT user_id, course_id, queue_id, kind, at FROM staff_events
                 WHERE queue_id = ?1 ORDER BY at ASC, id ASC",
            )?;
            let rows = stmt.query_map(params![queue_id.0], |row| {
                Ok(StaffEvent {
                    user_id: UserId(row.get(0)?),
                    course_id: CourseId(row.get(1)?),
                    queue_id: QueueId(row.get(2)?),
                    kind: parse_column(row, 3)?,
                    at: row.get(4)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
