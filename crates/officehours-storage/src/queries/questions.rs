// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Question rows and the compare-and-swap status update.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use officehours_core::model::{NewQuestion, Question, QuestionRecord, UserSummary};
use officehours_core::{
    GroupId, OfficeHoursError, QuestionId, QuestionStatus, QueueId, UserId,
};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::queries::{json_column, parse_column, to_json};

const QUESTION_COLUMNS: &str = "q.id, q.queue_id, q.creator_id, q.helper_id, q.status, q.text, \
     q.tags, q.group_id, q.is_task_question, q.created_at, q.first_helped_at, q.helped_at, \
     q.last_ready_at, q.closed_at, q.wait_time, q.help_time";

/// Number of columns in [`QUESTION_COLUMNS`].
const QUESTION_WIDTH: usize = 16;

/// `'Resolved','ConfirmedDeleted',...` for `NOT IN` filters.
static TERMINAL_LIST: LazyLock<String> = LazyLock::new(|| {
    QuestionStatus::ALL
        .iter()
        .filter(|s| s.is_terminal())
        .map(|s| format!("'{s}'"))
        .collect::<Vec<_>>()
        .join(",")
});

fn question_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Question> {
    Ok(Question {
        id: QuestionId(row.get(0)?),
        queue_id: QueueId(row.get(1)?),
        creator_id: UserId(row.get(2)?),
        helper_id: row.get::<_, Option<i64>>(3)?.map(UserId),
        status: parse_column(row, 4)?,
        text: row.get(5)?,
        tags: json_column::<BTreeSet<String>>(row, 6)?,
        group_id: row.get::<_, Option<i64>>(7)?.map(GroupId),
        is_task_question: row.get(8)?,
        created_at: row.get(9)?,
        first_helped_at: row.get(10)?,
        helped_at: row.get(11)?,
        last_ready_at: row.get(12)?,
        closed_at: row.get(13)?,
        wait_time: row.get(14)?,
        help_time: row.get(15)?,
    })
}

fn summary_at(
    row: &rusqlite::Row<'_>,
    id: Option<UserId>,
    offset: usize,
) -> rusqlite::Result<Option<UserSummary>> {
    let Some(id) = id else {
        return Ok(None);
    };
    Ok(Some(UserSummary {
        id,
        name: row.get::<_, Option<String>>(offset)?.unwrap_or_default(),
        photo_url: row.get(offset + 1)?,
    }))
}

pub async fn get_question(
    db: &Database,
    id: QuestionId,
) -> Result<Option<Question>, OfficeHoursError> {
    db.connection()
        .call(move |conn| -> Result<Option<Question>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {QUESTION_COLUMNS} FROM questions q WHERE q.id = ?1"),
                params![id.0],
                question_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn insert_question(
    db: &Database,
    new: &NewQuestion,
) -> Result<Question, OfficeHoursError> {
    let tags = to_json(&new.tags)?;
    let new = new.clone();
    db.connection()
        .call(move |conn| -> Result<Question, rusqlite::Error> {
            // A question created straight into the line starts its wait clock now.
            let last_ready_at = new.status.is_waiting().then_some(new.created_at);
            conn.execute(
                "INSERT INTO questions
                 (queue_id, creator_id, status, text, tags, is_task_question, created_at, last_ready_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    new.queue_id.0,
                    new.creator_id.0,
                    new.status.to_string(),
                    new.text,
                    tags,
                    new.is_task_question,
                    new.created_at,
                    last_ready_at,
                ],
            )?;
            Ok(Question {
                id: QuestionId(conn.last_insert_rowid()),
                queue_id: new.queue_id,
                creator_id: new.creator_id,
                helper_id: None,
                status: new.status,
                text: new.text,
                tags: new.tags,
                group_id: None,
                is_task_question: new.is_task_question,
                created_at: new.created_at,
                first_helped_at: None,
                helped_at: None,
                last_ready_at,
                closed_at: None,
                wait_time: 0,
                help_time: 0,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Writes every mutable column of `question` only if the stored status is
/// still `expected`. Returns whether a row was written.
pub async fn update_if_status(
    db: &Database,
    question: &Question,
    expected: QuestionStatus,
) -> Result<bool, OfficeHoursError> {
    let tags = to_json(&question.tags)?;
    let q = question.clone();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE questions SET
                    helper_id = ?3, status = ?4, text = ?5, tags = ?6, group_id = ?7,
                    first_helped_at = ?8, helped_at = ?9, last_ready_at = ?10, closed_at = ?11,
                    wait_time = ?12, help_time = ?13
                 WHERE id = ?1 AND status = ?2",
                params![
                    q.id.0,
                    expected.to_string(),
                    q.helper_id.map(|u| u.0),
                    q.status.to_string(),
                    q.text,
                    tags,
                    q.group_id.map(|g| g.0),
                    q.first_helped_at,
                    q.helped_at,
                    q.last_ready_at,
                    q.closed_at,
                    q.wait_time,
                    q.help_time,
                ],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Live questions of a queue joined with creator and helper display fields,
/// oldest first (id breaks ties), at most `limit` rows.
pub async fn list_live(
    db: &Database,
    queue_id: QueueId,
    limit: usize,
) -> Result<Vec<QuestionRecord>, OfficeHoursError> {
    let sql = format!(
        "SELECT {QUESTION_COLUMNS}, c.name, c.photo_url, h.name, h.photo_url
         FROM questions q
         LEFT JOIN users c ON c.id = q.creator_id
         LEFT JOIN users h ON h.id = q.helper_id
         WHERE q.queue_id = ?1 AND q.status NOT IN ({})
         ORDER BY q.created_at ASC, q.id ASC
         LIMIT ?2",
        *TERMINAL_LIST
    );
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> Result<Vec<QuestionRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt.query_map(params![queue_id.0, limit], |row| {
                let question = question_from_row(row)?;
                let creator = summary_at(row, Some(question.creator_id), QUESTION_WIDTH)?
                    .unwrap_or_else(|| UserSummary {
                        id: question.creator_id,
                        name: String::new(),
                        photo_url: None,
                    });
                let helper = summary_at(row, question.helper_id, QUESTION_WIDTH + 2)?;
                Ok(QuestionRecord {
                    question,
                    creator,
                    helper,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Live questions a student owns in a queue.
pub async fn list_live_for_student(
    db: &Database,
    queue_id: QueueId,
    student_id: UserId,
) -> Result<Vec<Question>, OfficeHoursError> {
    let sql = format!(
        "SELECT {QUESTION_COLUMNS} FROM questions q
         WHERE q.queue_id = ?1 AND q.creator_id = ?2 AND q.status NOT IN ({})
         ORDER BY q.created_at ASC, q.id ASC",
        *TERMINAL_LIST
    );
    db.connection()
        .call(move |conn| -> Result<Vec<Question>, rusqlite::Error> {
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt.query_map(params![queue_id.0, student_id.0], question_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Distinct queues holding at least one live question.
pub async fn queues_with_live(db: &Database) -> Result<Vec<QueueId>, OfficeHoursError> {
    let sql = format!(
        "SELECT DISTINCT queue_id FROM questions WHERE status NOT IN ({}) ORDER BY queue_id",
        *TERMINAL_LIST
    );
    db.connection()
        .call(move |conn| -> Result<Vec<QueueId>, rusqlite::Error> {
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt.query_map([], |row| Ok(QueueId(row.get(0)?)))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
