// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue rows, staff membership, and the tag/task config.

use officehours_core::model::{Queue, QueueSettings};
use officehours_core::{CourseId, OfficeHoursError, QueueId, UserId};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};

use crate::database::{Database, map_tr_err};
use crate::queries::{json_column, to_json};

/// Create a queue with empty settings. Course management is upstream; this
/// exists for seeding and tests.
pub async fn insert_queue(
    db: &Database,
    course_id: CourseId,
    room: &str,
    allow_questions: bool,
) -> Result<QueueId, OfficeHoursError> {
    let room = room.to_string();
    db.connection()
        .call(move |conn| -> Result<QueueId, rusqlite::Error> {
            conn.execute(
                "INSERT INTO queues (course_id, room, allow_questions) VALUES (?1, ?2, ?3)",
                params![course_id.0, room, allow_questions],
            )?;
            Ok(QueueId(conn.last_insert_rowid()))
        })
        .await
        .map_err(map_tr_err)
}

fn load_queue(conn: &Connection, id: QueueId) -> rusqlite::Result<Option<Queue>> {
    let row = conn
        .query_row(
            "SELECT id, course_id, room, allow_questions, is_disabled, config
             FROM queues WHERE id = ?1",
            params![id.0],
            |row| {
                Ok(Queue {
                    id: QueueId(row.get(0)?),
                    course_id: CourseId(row.get(1)?),
                    room: row.get(2)?,
                    allow_questions: row.get(3)?,
                    is_disabled: row.get(4)?,
                    settings: json_column::<QueueSettings>(row, 5)?,
                    staff: Vec::new(),
                })
            },
        )
        .optional()?;

    let Some(mut queue) = row else {
        return Ok(None);
    };
    queue.staff = staff_of(conn, id)?;
    Ok(Some(queue))
}

fn staff_of(conn: &Connection, id: QueueId) -> rusqlite::Result<Vec<UserId>> {
    let mut stmt =
        conn.prepare_cached("SELECT user_id FROM queue_staff WHERE queue_id = ?1 ORDER BY rowid")?;
    let rows = stmt.query_map(params![id.0], |row| Ok(UserId(row.get(0)?)))?;
    rows.collect()
}

pub async fn get_queue(db: &Database, id: QueueId) -> Result<Option<Queue>, OfficeHoursError> {
    db.connection()
        .call(move |conn| load_queue(conn, id))
        .await
        .map_err(map_tr_err)
}

pub async fn list_queues(db: &Database) -> Result<Vec<Queue>, OfficeHoursError> {
    db.connection()
        .call(|conn| -> Result<Vec<Queue>, rusqlite::Error> {
            let ids: Vec<i64> = {
                let mut stmt = conn.prepare("SELECT id FROM queues ORDER BY id")?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect::<Result<_, _>>()?
            };
            let mut queues = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(queue) = load_queue(conn, QueueId(id))? {
                    queues.push(queue);
                }
            }
            Ok(queues)
        })
        .await
        .map_err(map_tr_err)
}

/// Returns false when the user was already checked in.
pub async fn add_staff(
    db: &Database,
    queue_id: QueueId,
    user_id: UserId,
) -> Result<bool, OfficeHoursError> {
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO queue_staff (queue_id, user_id) VALUES (?1, ?2)",
                params![queue_id.0, user_id.0],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Returns false when the user was not checked in.
pub async fn remove_staff(
    db: &Database,
    queue_id: QueueId,
    user_id: UserId,
) -> Result<bool, OfficeHoursError> {
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "DELETE FROM queue_staff WHERE queue_id = ?1 AND user_id = ?2",
                params![queue_id.0, user_id.0],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Empties the staff list and returns who was on it.
pub async fn clear_staff(db: &Database, queue_id: QueueId) -> Result<Vec<UserId>, OfficeHoursError> {
    db.connection()
        .call(move |conn| -> Result<Vec<UserId>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let removed = staff_of(&tx, queue_id)?;
            tx.execute(
                "DELETE FROM queue_staff WHERE queue_id = ?1",
                params![queue_id.0],
            )?;
            tx.commit()?;
            Ok(removed)
        })
        .await
        .map_err(map_tr_err)
}

/// Returns false when the queue does not exist.
pub async fn set_disabled(
    db: &Database,
    queue_id: QueueId,
    disabled: bool,
) -> Result<bool, OfficeHoursError> {
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE queues SET is_disabled = ?2 WHERE id = ?1",
                params![queue_id.0, disabled],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Rewrites `queues.config` and the derived `queue_tags` rows in one
/// IMMEDIATE transaction, so concurrent config edits serialize on the
/// database write lock. Returns false when the queue does not exist.
pub async fn update_settings(
    db: &Database,
    queue_id: QueueId,
    settings: &QueueSettings,
) -> Result<bool, OfficeHoursError> {
    let config = to_json(settings)?;
    let tags: Vec<(String, String, Option<String>)> = settings
        .tags
        .iter()
        .map(|t| (t.id.clone(), t.display_name.clone(), t.color.clone()))
        .collect();

    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let changed = tx.execute(
                "UPDATE queues SET config = ?2 WHERE id = ?1",
                params![queue_id.0, config],
            )?;
            if changed == 0 {
                return Ok(false);
            }
            tx.execute(
                "DELETE FROM queue_tags WHERE queue_id = ?1",
                params![queue_id.0],
            )?;
            {
                let mut insert = tx.prepare(
                    "INSERT INTO queue_tags (queue_id, tag_key, display_name, color)
                     VALUES (?1, ?2, ?3, ?4)",
                )?;
                for (key, display_name, color) in &tags {
                    insert.execute(params![queue_id.0, key, display_name, color])?;
                }
            }
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
}

/// Tag keys currently mirrored for a queue, in insertion order.
pub async fn tag_keys(db: &Database, queue_id: QueueId) -> Result<Vec<String>, OfficeHoursError> {
    db.connection()
        .call(move |conn| -> Result<Vec<String>, rusqlite::Error> {
            let mut stmt =
                conn.prepare("SELECT tag_key FROM queue_tags WHERE queue_id = ?1 ORDER BY id")?;
            let rows = stmt.query_map(params![queue_id.0], |row| row.get(0))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
