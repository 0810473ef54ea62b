// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Question groups. Membership is `questions.group_id`.

use chrono::{DateTime, Utc};
use officehours_core::model::QuestionGroup;
use officehours_core::{GroupId, OfficeHoursError, QuestionId, QueueId, UserId};
use rusqlite::{Connection, params};

use crate::database::{Database, map_tr_err};

/// Creates a group and attaches the given questions to it. Every question
/// must belong to `queue_id`; otherwise nothing is written and the first
/// offending id is reported as not found.
pub async fn create_group(
    db: &Database,
    queue_id: QueueId,
    creator_id: UserId,
    question_ids: &[QuestionId],
    now: DateTime<Utc>,
) -> Result<QuestionGroup, OfficeHoursError> {
    let ids = question_ids.to_vec();
    let outcome = db
        .connection()
        .call(
            move |conn| -> Result<Result<QuestionGroup, QuestionId>, rusqlite::Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO question_groups (queue_id, creator_id, created_at)
                     VALUES (?1, ?2, ?3)",
                    params![queue_id.0, creator_id.0, now],
                )?;
                let group_id = GroupId(tx.last_insert_rowid());
                for id in &ids {
                    let changed = tx.execute(
                        "UPDATE questions SET group_id = ?1 WHERE id = ?2 AND queue_id = ?3",
                        params![group_id.0, id.0, queue_id.0],
                    )?;
                    if changed == 0 {
                        // Dropping the transaction rolls back the group row.
                        return Ok(Err(*id));
                    }
                }
                tx.commit()?;
                Ok(Ok(QuestionGroup {
                    id: group_id,
                    queue_id,
                    creator_id,
                    question_ids: ids,
                }))
            },
        )
        .await
        .map_err(map_tr_err)?;

    outcome.map_err(|missing| OfficeHoursError::not_found("question", missing))
}

fn members(conn: &Connection, group_id: GroupId) -> rusqlite::Result<Vec<QuestionId>> {
    let mut stmt =
        conn.prepare_cached("SELECT id FROM questions WHERE group_id = ?1 ORDER BY id")?;
    let rows = stmt.query_map(params![group_id.0], |row| Ok(QuestionId(row.get(0)?)))?;
    rows.collect()
}

/// Groups of a queue with their current members.
pub async fn list_groups(
    db: &Database,
    queue_id: QueueId,
) -> Result<Vec<QuestionGroup>, OfficeHoursError> {
    db.connection()
        .call(move |conn| -> Result<Vec<QuestionGroup>, rusqlite::Error> {
            let conn: &Connection = conn;
            let heads: Vec<(i64, i64)> = {
                let mut stmt = conn.prepare_cached(
                    "SELECT id, creator_id FROM question_groups WHERE queue_id = ?1 ORDER BY id",
                )?;
                let rows = stmt.query_map(params![queue_id.0], |row| Ok((row.get(0)?, row.get(1)?)))?;
                rows.collect::<Result<_, _>>()?
            };
            heads
                .into_iter()
                .map(|(id, creator)| {
                    Ok(QuestionGroup {
                        id: GroupId(id),
                        queue_id,
                        creator_id: UserId(creator),
                        question_ids: members(conn, GroupId(id))?,
                    })
                })
                .collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::questions::{get_question, insert_question};
    use crate::queries::queues::insert_queue;
    use crate::queries::test_support::{seed, setup_db};
    use officehours_core::model::NewQuestion;
    use officehours_core::{CourseId, QuestionStatus};

    async fn question(db: &Database, queue: QueueId, creator: i64) -> QuestionId {
        insert_question(
            db,
            &NewQuestion {
                queue_id: queue,
                creator_id: UserId(creator),
                text: "help".into(),
                tags: Default::default(),
                is_task_question: false,
                status: QuestionStatus::Queued,
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn create_attaches_members() {
        let (db, _dir) = setup_db().await;
        let queue = seed(&db).await;
        let a = question(&db, queue, 1).await;
        let b = question(&db, queue, 2).await;

        let group = create_group(&db, queue, UserId(10), &[a, b], Utc::now())
            .await
            .unwrap();
        assert_eq!(group.question_ids, vec![a, b]);

        let loaded = get_question(&db, a).await.unwrap().unwrap();
        assert_eq!(loaded.group_id, Some(group.id));

        let groups = list_groups(&db, queue).await.unwrap();
        assert_eq!(groups, vec![group]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn foreign_question_rolls_back() {
        let (db, _dir) = setup_db().await;
        let queue = seed(&db).await;
        let other_queue = insert_queue(&db, CourseId(7), "Elsewhere", true)
            .await
            .unwrap();
        let mine = question(&db, queue, 1).await;
        let foreign = question(&db, other_queue, 2).await;

        let err = create_group(&db, queue, UserId(10), &[mine, foreign], Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, OfficeHoursError::NotFound { entity: "question", id } if id == foreign.0));

        assert!(list_groups(&db, queue).await.unwrap().is_empty());
        let loaded = get_question(&db, mine).await.unwrap().unwrap();
        assert_eq!(loaded.group_id, None);
        db.close().await.unwrap();
    }
}
