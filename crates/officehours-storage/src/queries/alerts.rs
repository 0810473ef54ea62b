// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Alert rows.

use chrono::{DateTime, Utc};
use officehours_core::model::{Alert, AlertPayload, AlertType, DeliveryMode, NewAlert};
use officehours_core::{AlertId, CourseId, OfficeHoursError, QueueId, UserId};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::queries::{json_column, parse_column, to_json};

const ALERT_COLUMNS: &str =
    "id, user_id, course_id, payload, delivery_mode, sent, resolved, read_at";

fn alert_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Alert> {
    Ok(Alert {
        id: AlertId(row.get(0)?),
        user_id: UserId(row.get(1)?),
        course_id: CourseId(row.get(2)?),
        payload: json_column::<AlertPayload>(row, 3)?,
        delivery_mode: parse_column(row, 4)?,
        sent: row.get(5)?,
        resolved: row.get(6)?,
        read_at: row.get(7)?,
    })
}

pub async fn insert_alert(db: &Database, new: &NewAlert) -> Result<Alert, OfficeHoursError> {
    let payload = to_json(&new.payload)?;
    let new = new.clone();
    db.connection()
        .call(move |conn| -> Result<Alert, rusqlite::Error> {
            conn.execute(
                "INSERT INTO alerts
                 (user_id, course_id, queue_id, alert_type, payload, delivery_mode, sent)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    new.user_id.0,
                    new.course_id.0,
                    new.payload.queue_id().0,
                    new.payload.alert_type().to_string(),
                    payload,
                    new.delivery_mode.to_string(),
                    new.sent,
                ],
            )?;
            Ok(Alert {
                id: AlertId(conn.last_insert_rowid()),
                user_id: new.user_id,
                course_id: new.course_id,
                payload: new.payload,
                delivery_mode: new.delivery_mode,
                sent: new.sent,
                resolved: None,
                read_at: None,
            })
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_alert(db: &Database, id: AlertId) -> Result<Option<Alert>, OfficeHoursError> {
    db.connection()
        .call(move |conn| -> Result<Option<Alert>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE id = ?1"),
                params![id.0],
                alert_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_for_user(
    db: &Database,
    user_id: UserId,
    course_id: CourseId,
    include_resolved: bool,
) -> Result<Vec<Alert>, OfficeHoursError> {
    db.connection()
        .call(move |conn| -> Result<Vec<Alert>, rusqlite::Error> {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {ALERT_COLUMNS} FROM alerts
                 WHERE user_id = ?1 AND course_id = ?2 AND (?3 OR resolved IS NULL)
                 ORDER BY sent ASC, id ASC"
            ))?;
            let rows = stmt.query_map(
                params![user_id.0, course_id.0, include_resolved],
                alert_from_row,
            )?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_unresolved_for_queue(
    db: &Database,
    queue_id: QueueId,
    alert_type: Option<AlertType>,
    mode: Option<DeliveryMode>,
) -> Result<Vec<Alert>, OfficeHoursError> {
    let alert_type = alert_type.map(|t| t.to_string());
    let mode = mode.map(|m| m.to_string());
    db.connection()
        .call(move |conn| -> Result<Vec<Alert>, rusqlite::Error> {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {ALERT_COLUMNS} FROM alerts
                 WHERE queue_id = ?1 AND resolved IS NULL
                   AND (?2 IS NULL OR alert_type = ?2)
                   AND (?3 IS NULL OR delivery_mode = ?3)
                 ORDER BY sent ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![queue_id.0, alert_type, mode], alert_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Returns false when the alert is missing or already resolved.
pub async fn resolve(db: &Database, id: AlertId, at: DateTime<Utc>) -> Result<bool, OfficeHoursError> {
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE alerts SET resolved = ?2 WHERE id = ?1 AND resolved IS NULL",
                params![id.0, at],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{seed, setup_db};
    use officehours_core::QuestionId;

    fn prompt(user: i64, queue: QueueId, mode: DeliveryMode) -> NewAlert {
        NewAlert {
            user_id: UserId(user),
            course_id: CourseId(7),
            payload: AlertPayload::PromptStudentToLeaveQueue {
                queue_id: queue,
                question_id: None,
            },
            delivery_mode: mode,
            sent: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_get_and_resolve() {
        let (db, _dir) = setup_db().await;
        let queue = seed(&db).await;

        let alert = insert_alert(&db, &prompt(1, queue, DeliveryMode::Modal))
            .await
            .unwrap();
        let loaded = get_alert(&db, alert.id).await.unwrap().unwrap();
        assert_eq!(loaded.payload, alert.payload);
        assert!(!loaded.is_resolved());

        assert!(resolve(&db, alert.id, Utc::now()).await.unwrap());
        assert!(!resolve(&db, alert.id, Utc::now()).await.unwrap());
        assert!(get_alert(&db, alert.id).await.unwrap().unwrap().is_resolved());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn queue_filter_by_type_and_mode() {
        let (db, _dir) = setup_db().await;
        let queue = seed(&db).await;

        insert_alert(&db, &prompt(1, queue, DeliveryMode::Modal))
            .await
            .unwrap();
        insert_alert(&db, &prompt(2, queue, DeliveryMode::Feed))
            .await
            .unwrap();
        insert_alert(
            &db,
            &NewAlert {
                user_id: UserId(1),
                course_id: CourseId(7),
                payload: AlertPayload::RephraseQuestion {
                    question_id: QuestionId(4),
                    queue_id: queue,
                },
                delivery_mode: DeliveryMode::Modal,
                sent: Utc::now(),
            },
        )
        .await
        .unwrap();

        let all = list_unresolved_for_queue(&db, queue, None, None).await.unwrap();
        assert_eq!(all.len(), 3);

        let modal_prompts = list_unresolved_for_queue(
            &db,
            queue,
            Some(AlertType::PromptStudentToLeaveQueue),
            Some(DeliveryMode::Modal),
        )
        .await
        .unwrap();
        assert_eq!(modal_prompts.len(), 1);
        assert_eq!(modal_prompts[0].user_id, UserId(1));

        let modal = list_unresolved_for_queue(&db, queue, None, Some(DeliveryMode::Modal))
            .await
            .unwrap();
        assert_eq!(modal.len(), 2);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn user_listing_hides_resolved_by_default() {
        let (db, _dir) = setup_db().await;
        let queue = seed(&db).await;
        let a = insert_alert(&db, &prompt(1, queue, DeliveryMode::Modal))
            .await
            .unwrap();
        insert_alert(&db, &prompt(1, queue, DeliveryMode::Feed))
            .await
            .unwrap();
        resolve(&db, a.id, Utc::now()).await.unwrap();

        let open = list_for_user(&db, UserId(1), CourseId(7), false).await.unwrap();
        assert_eq!(open.len(), 1);
        let everything = list_for_user(&db, UserId(1), CourseId(7), true).await.unwrap();
        assert_eq!(everything.len(), 2);
        let other_course = list_for_user(&db, UserId(1), CourseId(8), true).await.unwrap();
        assert!(other_course.is_empty());
        db.close().await.unwrap();
    }
}
