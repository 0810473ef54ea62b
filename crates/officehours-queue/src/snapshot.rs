// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-queue read model and viewer personalization.
//!
//! A [`Snapshot`] is derived from source rows and never written back. The
//! cached copy is always the unredacted staff view; [`personalize`] produces
//! each viewer's copy at read time.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use officehours_core::model::{Alert, QuestionGroup, QuestionRecord, UserSummary};
use officehours_core::{GroupId, QuestionId, QuestionStatus, QueueId, Role, UserId};

/// Fields visible only to staff and to the question's own creator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDetail {
    pub queue_id: QueueId,
    pub creator: UserSummary,
    pub helper: Option<UserSummary>,
    pub text: String,
    pub tags: BTreeSet<String>,
    pub group_id: Option<GroupId>,
    pub is_task_question: bool,
    pub first_helped_at: Option<DateTime<Utc>>,
    pub helped_at: Option<DateTime<Utc>>,
    pub last_ready_at: Option<DateTime<Utc>>,
    pub wait_time: i64,
    pub help_time: i64,
}

/// One entry in a snapshot list. Redacted entries carry no `detail`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: QuestionId,
    pub status: QuestionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<QuestionDetail>,
}

impl QuestionView {
    pub fn full(record: QuestionRecord) -> Self {
        let QuestionRecord {
            question: q,
            creator,
            helper,
        } = record;
        Self {
            id: q.id,
            status: q.status,
            created_at: q.created_at,
            detail: Some(QuestionDetail {
                queue_id: q.queue_id,
                creator,
                helper,
                text: q.text,
                tags: q.tags,
                group_id: q.group_id,
                is_task_question: q.is_task_question,
                first_helped_at: q.first_helped_at,
                helped_at: q.helped_at,
                last_ready_at: q.last_ready_at,
                wait_time: q.wait_time,
                help_time: q.help_time,
            }),
        }
    }

    /// Only `{id, status, createdAt}` survive.
    pub fn redacted(&self) -> Self {
        Self {
            id: self.id,
            status: self.status,
            created_at: self.created_at,
            detail: None,
        }
    }

    pub fn creator_id(&self) -> Option<UserId> {
        self.detail.as_ref().map(|d| d.creator.id)
    }
}

/// Partitioned view of a queue's live questions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// `PriorityQueued`, oldest first.
    pub priority_queue: Vec<QuestionView>,
    /// `Helping` and `Paused`.
    pub questions_getting_help: Vec<QuestionView>,
    /// `Queued`, oldest first.
    pub questions: Vec<QuestionView>,
    /// `Drafting` and limbo statuses.
    pub on_hold: Vec<QuestionView>,
    /// The viewer's own live questions. Empty in the cached copy.
    pub your_questions: Vec<QuestionView>,
    pub groups: Vec<QuestionGroup>,
    pub unresolved_alerts: Vec<Alert>,
}

impl Snapshot {
    /// Partition records (already ordered oldest first) by status.
    pub fn from_parts(
        records: Vec<QuestionRecord>,
        groups: Vec<QuestionGroup>,
        unresolved_alerts: Vec<Alert>,
    ) -> Self {
        let mut snapshot = Snapshot {
            groups,
            unresolved_alerts,
            ..Snapshot::default()
        };
        for record in records {
            let status = record.question.status;
            let view = QuestionView::full(record);
            match status {
                QuestionStatus::Queued => snapshot.questions.push(view),
                QuestionStatus::PriorityQueued => snapshot.priority_queue.push(view),
                QuestionStatus::Helping | QuestionStatus::Paused => {
                    snapshot.questions_getting_help.push(view)
                }
                QuestionStatus::Drafting
                | QuestionStatus::CantFind
                | QuestionStatus::ReQueueing
                | QuestionStatus::TADeleted => snapshot.on_hold.push(view),
                // Terminal rows are filtered by the query; drop any stragglers.
                _ => {}
            }
        }
        snapshot
    }

    /// Every entry across the partitions.
    pub fn entries(&self) -> impl Iterator<Item = &QuestionView> {
        self.priority_queue
            .iter()
            .chain(&self.questions_getting_help)
            .chain(&self.questions)
            .chain(&self.on_hold)
    }

    pub fn contains(&self, id: QuestionId) -> bool {
        self.entries().any(|v| v.id == id)
    }
}

/// Produce `viewer`'s copy of a cached snapshot.
///
/// Staff get everything. A student sees other students' entries reduced to
/// `{id, status, createdAt}`, their own entries in full (also collected in
/// `your_questions`), only their own on-hold entries, and only their own
/// alerts.
pub fn personalize(snapshot: &Snapshot, viewer: UserId, role: Role) -> Snapshot {
    if role != Role::Student {
        return snapshot.clone();
    }

    let is_mine = |v: &QuestionView| v.creator_id() == Some(viewer);
    let scoped = |list: &[QuestionView]| -> Vec<QuestionView> {
        list.iter()
            .map(|v| if is_mine(v) { v.clone() } else { v.redacted() })
            .collect()
    };

    let mut your_questions: Vec<QuestionView> =
        snapshot.entries().filter(|v| is_mine(v)).cloned().collect();
    your_questions.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));

    Snapshot {
        priority_queue: scoped(&snapshot.priority_queue),
        questions_getting_help: scoped(&snapshot.questions_getting_help),
        questions: scoped(&snapshot.questions),
        on_hold: snapshot
            .on_hold
            .iter()
            .filter(|v| is_mine(v))
            .cloned()
            .collect(),
        your_questions,
        groups: snapshot.groups.clone(),
        unresolved_alerts: snapshot
            .unresolved_alerts
            .iter()
            .filter(|a| a.user_id == viewer)
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use officehours_core::model::Question;

    fn record(id: i64, creator: i64, status: QuestionStatus, minute: u32) -> QuestionRecord {
        let created_at = Utc.with_ymd_and_hms(2026, 3, 2, 9, minute, 0).unwrap();
        QuestionRecord {
            question: Question {
                id: QuestionId(id),
                queue_id: QueueId(1),
                creator_id: UserId(creator),
                helper_id: None,
                status,
                text: format!("secret text {id}"),
                tags: BTreeSet::new(),
                group_id: None,
                is_task_question: false,
                created_at,
                first_helped_at: None,
                helped_at: None,
                last_ready_at: None,
                closed_at: None,
                wait_time: 0,
                help_time: 0,
            },
            creator: UserSummary {
                id: UserId(creator),
                name: format!("Student {creator}"),
                photo_url: Some(format!("https://img/{creator}.png")),
            },
            helper: None,
        }
    }

    fn sample() -> Snapshot {
        Snapshot::from_parts(
            vec![
                record(1, 100, QuestionStatus::Queued, 0),
                record(2, 200, QuestionStatus::PriorityQueued, 1),
                record(3, 300, QuestionStatus::Helping, 2),
                record(4, 100, QuestionStatus::Paused, 3),
                record(5, 200, QuestionStatus::CantFind, 4),
                record(6, 300, QuestionStatus::Drafting, 5),
            ],
            vec![],
            vec![],
        )
    }

    #[test]
    fn partitions_by_status() {
        let s = sample();
        let ids = |l: &[QuestionView]| l.iter().map(|v| v.id.0).collect::<Vec<_>>();
        assert_eq!(ids(&s.questions), vec![1]);
        assert_eq!(ids(&s.priority_queue), vec![2]);
        assert_eq!(ids(&s.questions_getting_help), vec![3, 4]);
        assert_eq!(ids(&s.on_hold), vec![5, 6]);
        assert!(s.your_questions.is_empty());
    }

    #[test]
    fn staff_see_everything() {
        let s = sample();
        assert_eq!(personalize(&s, UserId(999), Role::Ta), s);
        assert_eq!(personalize(&s, UserId(999), Role::Professor), s);
    }

    #[test]
    fn students_only_see_their_own_details() {
        let s = personalize(&sample(), UserId(100), Role::Student);

        let mine: Vec<_> = s.your_questions.iter().map(|v| v.id.0).collect();
        assert_eq!(mine, vec![1, 4]);

        let json = serde_json::to_string(&Snapshot {
            your_questions: vec![],
            ..s.clone()
        })
        .unwrap();
        for other in [200, 300] {
            assert!(!json.contains(&format!("Student {other}")));
            assert!(!json.contains(&format!("img/{other}.png")));
        }
        assert!(!json.contains("secret text 2"));
        assert!(!json.contains("secret text 3"));

        // Own entries stay in full where they sit.
        assert!(s.questions[0].detail.is_some());
        assert!(s.priority_queue[0].detail.is_none());
        // Other students' on-hold entries are hidden entirely.
        assert!(s.on_hold.is_empty());
    }

    #[test]
    fn redacted_entry_serializes_three_fields() {
        let view = QuestionView::full(record(9, 1, QuestionStatus::Queued, 0)).redacted();
        let json = serde_json::to_value(&view).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 3);
        assert!(json.get("createdAt").is_some());
    }
}
