// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Properties of transition planning over random legal walks.

use std::collections::BTreeSet;

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use officehours_core::model::Question;
use officehours_core::{
    GroupId, QuestionId, QuestionStatus, QueueId, Role, UserId, allowed_targets,
};
use officehours_queue::plan_transition;

const ROLES: [Role; 4] = [Role::Student, Role::Ta, Role::Professor, Role::System];

fn start() -> Question {
    Question {
        id: QuestionId(1),
        queue_id: QueueId(1),
        creator_id: UserId(100),
        helper_id: None,
        status: QuestionStatus::Drafting,
        text: "stack overflow in my recursion".into(),
        tags: BTreeSet::new(),
        group_id: Some(GroupId(4)),
        is_task_question: false,
        created_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
        first_helped_at: None,
        helped_at: None,
        last_ready_at: None,
        closed_at: None,
        wait_time: 0,
        help_time: 0,
    }
}

fn actor_for(role: Role) -> UserId {
    match role {
        Role::Student => UserId(100),
        Role::System => UserId(0),
        // One staff member, so the ownership guard never blocks the walk.
        Role::Ta | Role::Professor => UserId(5),
    }
}

proptest! {
    #[test]
    fn times_never_decrease_along_a_legal_walk(
        steps in prop::collection::vec((0usize..4, 0usize..8, 0i64..3600), 1..24),
    ) {
        let mut q = start();
        let mut now = q.created_at;
        for (role_idx, pick, gap) in steps {
            let role = ROLES[role_idx];
            let targets = allowed_targets(q.status, role);
            if targets.is_empty() {
                continue;
            }
            let target = targets[pick % targets.len()];
            now += Duration::seconds(gap);

            let plan = plan_transition(&q, target, actor_for(role), role, now).unwrap();
            let next = plan.updated;
            prop_assert!(next.wait_time >= q.wait_time);
            prop_assert!(next.help_time >= q.help_time);
            prop_assert_eq!(next.status, target);
            if target.is_terminal() {
                prop_assert_eq!(next.closed_at, Some(now));
            }
            if target.is_limbo() {
                prop_assert_eq!(next.group_id, None);
            }
            if q.first_helped_at.is_some() {
                prop_assert_eq!(next.first_helped_at, q.first_helped_at);
            }
            q = next;
        }
        let elapsed = (now - q.created_at).num_seconds();
        prop_assert!(q.wait_time + q.help_time <= elapsed);
    }

    #[test]
    fn self_edges_are_no_ops(idx in 0usize..13, role_idx in 0usize..4) {
        let mut q = start();
        q.status = QuestionStatus::ALL[idx];
        let role = ROLES[role_idx];
        let plan = plan_transition(&q, q.status, actor_for(role), role, q.created_at + Duration::hours(1));
        // A self-edge can still hit the ownership guard; otherwise it is a no-op.
        if let Ok(plan) = plan {
            prop_assert!(!plan.changed);
            prop_assert_eq!(plan.updated, q);
        }
    }
}
