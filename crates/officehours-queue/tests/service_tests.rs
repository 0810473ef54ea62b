// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue service behavior over a real SQLite store.

use chrono::Utc;

use officehours_core::model::{
    AlertPayload, DeliveryMode, NewAlert, PushEvent, QueueSettings, QueueTag,
};
use officehours_core::{
    ChangeKind, ErrorKind, OfficeHoursError, QuestionStatus, QueueStore, Role, UserId,
};
use officehours_queue::{Snapshot, cache_key};
use officehours_test_utils::{COURSE, ChatCall, TestHarness};

const TA: UserId = UserId(5);
const TA2: UserId = UserId(6);

async fn harness() -> TestHarness {
    let h = TestHarness::builder().build().await.unwrap();
    for (id, name) in [(5, "Tina TA"), (6, "Tom TA"), (100, "Ada"), (101, "Grace"), (102, "Alan"), (103, "Barbara")] {
        h.user(id, name).await.unwrap();
    }
    h
}

#[tokio::test]
async fn help_and_resolve_updates_row_cache_and_sink() {
    let h = harness().await;
    let service = h.service();
    let queue = h.queue_with_staff(&[TA]).await.unwrap();
    let q = h.question(queue, UserId(100), QuestionStatus::Queued).await.unwrap();

    let out = service
        .change_status(q.id, QuestionStatus::Helping, TA, Role::Ta)
        .await
        .unwrap();
    assert!(out.changed);
    assert_eq!(out.previous, QuestionStatus::Queued);

    let stored = h.reload(&q).await.unwrap();
    assert_eq!(stored.status, QuestionStatus::Helping);
    assert_eq!(stored.helper_id, Some(TA));
    assert!(stored.first_helped_at.is_some());

    let snapshot = service.get_questions(queue).await.unwrap();
    assert_eq!(snapshot.questions_getting_help.len(), 1);
    assert!(snapshot.questions.is_empty());

    assert!(h.sink.count(queue, ChangeKind::Questions) >= 1);
    assert_eq!(
        h.push.sent_to(UserId(100)).await,
        vec![PushEvent::StaffReady {
            queue_id: queue,
            question_id: q.id
        }]
    );

    service
        .change_status(q.id, QuestionStatus::Resolved, TA, Role::Ta)
        .await
        .unwrap();
    let calls = h.chat.calls().await;
    assert!(matches!(calls.first(), Some(ChatCall::Create(_))));
    assert_eq!(calls.last(), Some(&ChatCall::End(queue, q.id)));
    let stored = h.reload(&q).await.unwrap();
    assert!(stored.closed_at.is_some());
    assert!(service.get_questions(queue).await.unwrap().entries().next().is_none());
}

#[tokio::test]
async fn ending_chat_falls_back_to_clearing() {
    let h = harness().await;
    let service = h.service();
    let queue = h.queue_with_staff(&[TA]).await.unwrap();
    let q = h.question(queue, UserId(100), QuestionStatus::Queued).await.unwrap();
    service
        .change_status(q.id, QuestionStatus::Helping, TA, Role::Ta)
        .await
        .unwrap();

    h.chat.fail_end(true);
    service
        .change_status(q.id, QuestionStatus::Resolved, TA, Role::Ta)
        .await
        .unwrap();
    let calls = h.chat.calls().await;
    let tail: Vec<_> = calls.iter().rev().take(2).rev().cloned().collect();
    assert_eq!(tail, vec![ChatCall::End(queue, q.id), ChatCall::Clear(queue, q.id)]);
    assert_eq!(h.reload(&q).await.unwrap().status, QuestionStatus::Resolved);
}

#[tokio::test]
async fn stale_read_loses_compare_and_swap() {
    let h = harness().await;
    let service = h.service();
    let queue = h.queue_with_staff(&[TA, TA2]).await.unwrap();
    let q = h.question(queue, UserId(100), QuestionStatus::Queued).await.unwrap();

    // TA2 claims first; TA still holds the Queued copy.
    service
        .change_status(q.id, QuestionStatus::Helping, TA2, Role::Ta)
        .await
        .unwrap();
    let err = h
        .lifecycle()
        .change_status_at(&q, QuestionStatus::Helping, TA, Role::Ta, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OfficeHoursError::ConcurrentModification {
            expected: QuestionStatus::Queued,
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(h.reload(&q).await.unwrap().helper_id, Some(TA2));

    // Fresh read: now the ownership guard applies.
    let err = service
        .change_status(q.id, QuestionStatus::Resolved, TA, Role::Ta)
        .await
        .unwrap_err();
    assert!(matches!(err, OfficeHoursError::AlreadyClaimed { .. }));
}

#[tokio::test]
async fn rejected_transition_leaves_everything_untouched() {
    let h = harness().await;
    let service = h.service();
    let queue = h.queue_with_staff(&[TA]).await.unwrap();
    let q = h.question(queue, UserId(100), QuestionStatus::Queued).await.unwrap();

    let err = service
        .change_status(q.id, QuestionStatus::Helping, UserId(100), Role::Student)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(h.reload(&q).await.unwrap(), q);
    assert!(h.sink.signals().is_empty());

    let err = service
        .change_status(officehours_core::QuestionId(999), QuestionStatus::Helping, TA, Role::Ta)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn students_cannot_move_each_others_questions() {
    let h = harness().await;
    let service = h.service();
    let queue = h.queue_with_staff(&[TA]).await.unwrap();
    let q = h.question(queue, UserId(100), QuestionStatus::Queued).await.unwrap();

    for target in [
        QuestionStatus::ConfirmedDeleted,
        QuestionStatus::Queued,
        QuestionStatus::PriorityQueued,
    ] {
        let err = service
            .change_status(q.id, target, UserId(101), Role::Student)
            .await
            .unwrap_err();
        assert!(
            matches!(err, OfficeHoursError::NotOwner { user_id: 101, .. }),
            "{target}: {err}"
        );
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
    assert_eq!(h.reload(&q).await.unwrap(), q);
    assert!(h.sink.signals().is_empty());

    // The creator still can.
    let out = service
        .change_status(q.id, QuestionStatus::ConfirmedDeleted, UserId(100), Role::Student)
        .await
        .unwrap();
    assert_eq!(out.question.status, QuestionStatus::ConfirmedDeleted);
}

#[tokio::test]
async fn create_question_admission_rules() {
    let h = harness().await;
    let service = h.service();
    let student = UserId(100);

    let unstaffed = h.queue_with_staff(&[]).await.unwrap();
    let err = service
        .create_question(h.draft(unstaffed, student, QuestionStatus::Queued))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no staff"));
    // A draft may wait for staff to arrive.
    let draft = service
        .create_question(h.draft(unstaffed, student, QuestionStatus::Drafting))
        .await
        .unwrap();
    assert_eq!(draft.status, QuestionStatus::Drafting);
    assert_eq!(draft.last_ready_at, None);

    let staffed = h.queue_with_staff(&[TA]).await.unwrap();
    let q = service
        .create_question(h.draft(staffed, student, QuestionStatus::Queued))
        .await
        .unwrap();
    assert_eq!(q.last_ready_at, Some(q.created_at));
    let err = service
        .create_question(h.draft(staffed, student, QuestionStatus::Queued))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("already has question"));

    let err = service
        .create_question(h.draft(staffed, UserId(101), QuestionStatus::Helping))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let closed = h.store.create_queue(COURSE, "Closed", false).await.unwrap();
    h.store.add_staff(closed, TA).await.unwrap();
    let err = service
        .create_question(h.draft(closed, student, QuestionStatus::Queued))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not accepting"));

    h.store.set_queue_disabled(staffed, true).await.unwrap();
    let err = service
        .create_question(h.draft(staffed, UserId(101), QuestionStatus::Queued))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("disabled"));

    let err = service
        .create_question(h.draft(officehours_core::QueueId(404), student, QuestionStatus::Queued))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn tags_must_come_from_queue_settings() {
    let h = harness().await;
    let service = h.service();
    let queue = h.queue_with_staff(&[TA]).await.unwrap();
    service
        .update_queue_config(
            queue,
            QueueSettings {
                tags: vec![QueueTag {
                    id: "pointers".into(),
                    display_name: "Pointers".into(),
                    color: None,
                }],
                tasks: vec![],
            },
            Role::Professor,
        )
        .await
        .unwrap();

    let mut draft = h.draft(queue, UserId(100), QuestionStatus::Queued);
    draft.tags.insert("recursion".into());
    let err = service.create_question(draft.clone()).await.unwrap_err();
    assert!(err.to_string().contains("unknown tag"));

    draft.tags = ["pointers".to_string()].into();
    let q = service.create_question(draft).await.unwrap();
    assert!(q.tags.contains("pointers"));

    let err = service
        .update_queue_config(queue, QueueSettings::default(), Role::Student)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn cache_matches_recompute_after_every_mutation() {
    let h = harness().await;
    let service = h.service();
    let queue = h.queue_with_staff(&[TA]).await.unwrap();
    let a = h.question(queue, UserId(100), QuestionStatus::Queued).await.unwrap();
    let b = h.question(queue, UserId(101), QuestionStatus::Queued).await.unwrap();

    let steps = [
        (a.id, QuestionStatus::Helping, TA, Role::Ta),
        (b.id, QuestionStatus::TADeleted, TA, Role::Ta),
        (a.id, QuestionStatus::Paused, TA, Role::Ta),
        (b.id, QuestionStatus::ConfirmedDeleted, UserId(101), Role::Student),
        (a.id, QuestionStatus::Resolved, TA, Role::Ta),
    ];
    for (id, status, actor, role) in steps {
        service.change_status(id, status, actor, role).await.unwrap();
        let raw = h.cache.raw(&cache_key(queue)).await.unwrap().unwrap();
        let cached: Snapshot = serde_json::from_str(&raw).unwrap();
        assert_eq!(cached, h.read_cache.compute(queue).await.unwrap());
    }
}

#[tokio::test]
async fn unreadable_or_unavailable_cache_is_rebuilt() {
    let h = harness().await;
    let service = h.service();
    let queue = h.queue_with_staff(&[TA]).await.unwrap();
    h.question(queue, UserId(100), QuestionStatus::Queued).await.unwrap();

    h.cache.poison(&cache_key(queue), "{not json").await.unwrap();
    let snapshot = service.get_questions(queue).await.unwrap();
    assert_eq!(snapshot.questions.len(), 1);
    let raw = h.cache.raw(&cache_key(queue)).await.unwrap().unwrap();
    assert!(serde_json::from_str::<Snapshot>(&raw).is_ok());

    h.cache.fail_reads(true);
    assert_eq!(service.get_questions(queue).await.unwrap().questions.len(), 1);
}

#[tokio::test]
async fn cache_write_failure_does_not_fail_mutation() {
    let h = harness().await;
    let service = h.service();
    let queue = h.queue_with_staff(&[TA]).await.unwrap();
    let q = h.question(queue, UserId(100), QuestionStatus::Queued).await.unwrap();
    assert_eq!(service.get_questions(queue).await.unwrap().questions.len(), 1);

    h.cache.fail_writes(true);
    service
        .change_status(q.id, QuestionStatus::Helping, TA, Role::Ta)
        .await
        .unwrap();
    assert_eq!(h.reload(&q).await.unwrap().status, QuestionStatus::Helping);
    assert_eq!(h.sink.count(queue, ChangeKind::Questions), 1);

    // The pre-mutation entry was dropped rather than left behind.
    assert_eq!(h.cache.raw(&cache_key(queue)).await.unwrap(), None);
    h.cache.fail_writes(false);
    let snapshot = service.get_questions(queue).await.unwrap();
    assert!(snapshot.questions.is_empty());
    assert_eq!(snapshot.questions_getting_help.len(), 1);
}

#[tokio::test]
async fn limbo_detaches_only_that_question_from_its_group() {
    let h = harness().await;
    let service = h.service();
    let queue = h.queue_with_staff(&[TA]).await.unwrap();
    let a = h.question(queue, UserId(100), QuestionStatus::Queued).await.unwrap();
    let b = h.question(queue, UserId(101), QuestionStatus::Queued).await.unwrap();

    let err = service
        .create_group(queue, UserId(100), Role::Student, &[a.id, b.id])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let group = service
        .create_group(queue, TA, Role::Ta, &[a.id, b.id, a.id])
        .await
        .unwrap();
    assert_eq!(group.question_ids, vec![a.id, b.id]);

    service
        .change_status(a.id, QuestionStatus::Helping, TA, Role::Ta)
        .await
        .unwrap();
    service
        .change_status(a.id, QuestionStatus::CantFind, TA, Role::Ta)
        .await
        .unwrap();

    assert_eq!(h.reload(&a).await.unwrap().group_id, None);
    assert_eq!(h.reload(&b).await.unwrap().group_id, Some(group.id));
    let groups = h.store.list_groups(queue).await.unwrap();
    assert_eq!(groups[0].question_ids, vec![b.id]);
}

#[tokio::test]
async fn third_in_line_is_notified_when_the_line_moves() {
    let h = harness().await;
    let service = h.service();
    let queue = h.queue_with_staff(&[TA]).await.unwrap();
    let students = [UserId(100), UserId(101), UserId(102), UserId(103)];
    let mut questions = Vec::new();
    for s in students {
        questions.push(h.question(queue, s, QuestionStatus::Queued).await.unwrap());
    }

    service
        .change_status(questions[0].id, QuestionStatus::Helping, TA, Role::Ta)
        .await
        .unwrap();
    assert_eq!(
        h.push.sent_to(UserId(103)).await,
        vec![PushEvent::ThirdInLine {
            queue_id: queue,
            question_id: questions[3].id
        }]
    );
    assert!(h.push.sent_to(UserId(102)).await.is_empty());

    // Resolving a question already out of the line does not move it.
    h.push.clear().await;
    service
        .change_status(questions[0].id, QuestionStatus::Resolved, TA, Role::Ta)
        .await
        .unwrap();
    assert!(h.push.sent().await.is_empty());
}

#[tokio::test]
async fn priority_line_counts_ahead_for_third_in_line() {
    let h = harness().await;
    let service = h.service();
    let queue = h.queue_with_staff(&[TA]).await.unwrap();
    h.question(queue, UserId(100), QuestionStatus::PriorityQueued)
        .await
        .unwrap();
    let mut questions = Vec::new();
    for s in [UserId(101), UserId(102), UserId(103), UserId(104)] {
        questions.push(h.question(queue, s, QuestionStatus::Queued).await.unwrap());
    }

    service
        .change_status(questions[0].id, QuestionStatus::Helping, TA, Role::Ta)
        .await
        .unwrap();
    assert_eq!(
        h.push.sent_to(UserId(103)).await,
        vec![PushEvent::ThirdInLine {
            queue_id: queue,
            question_id: questions[2].id
        }]
    );
    assert!(h.push.sent_to(UserId(104)).await.is_empty());
}

#[tokio::test]
async fn check_out_reports_when_the_queue_empties() {
    let h = harness().await;
    let service = h.service();
    let queue = h.queue_with_staff(&[]).await.unwrap();

    assert!(service.check_in(queue, TA, Role::Ta).await.unwrap());
    assert!(!service.check_in(queue, TA, Role::Ta).await.unwrap());
    assert!(service.check_in(queue, TA2, Role::Professor).await.unwrap());
    assert!(service.check_in(queue, UserId(100), Role::Student).await.is_err());

    let first = service.check_out(queue, TA).await.unwrap();
    assert!(first.removed && !first.queue_emptied);
    let last = service.check_out(queue, TA2).await.unwrap();
    assert!(last.removed && last.queue_emptied);
    let again = service.check_out(queue, TA2).await.unwrap();
    assert!(!again.removed && !again.queue_emptied);

    let kinds: Vec<_> = h
        .store
        .staff_events(queue)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.kind.to_string())
        .collect();
    assert_eq!(kinds, ["checked_in", "checked_in", "checked_out", "checked_out"]);
    assert_eq!(h.sink.count(queue, ChangeKind::QueueMeta), 4);
}

#[tokio::test]
async fn disabling_a_queue_stales_live_questions_and_modal_alerts() {
    let h = harness().await;
    let service = h.service();
    let queue = h.queue_with_staff(&[TA]).await.unwrap();
    let a = h.question(queue, UserId(100), QuestionStatus::Queued).await.unwrap();
    let b = h.question(queue, UserId(101), QuestionStatus::CantFind).await.unwrap();
    let alert = h
        .store
        .insert_alert(&NewAlert {
            user_id: UserId(100),
            course_id: COURSE,
            payload: AlertPayload::PromptStudentToLeaveQueue {
                queue_id: queue,
                question_id: Some(a.id),
            },
            delivery_mode: DeliveryMode::Modal,
            sent: Utc::now(),
        })
        .await
        .unwrap();

    assert_eq!(service.disable_queue(queue, Role::Ta).await.unwrap(), 2);
    for q in [&a, &b] {
        assert_eq!(h.reload(q).await.unwrap().status, QuestionStatus::Stale);
    }
    assert!(h.store.get_alert(alert.id).await.unwrap().unwrap().is_resolved());
    assert!(h.store.get_queue(queue).await.unwrap().unwrap().is_disabled);
    assert!(service.get_questions(queue).await.unwrap().entries().next().is_none());
}

#[tokio::test]
async fn students_get_a_redacted_view() {
    let h = harness().await;
    let service = h.service();
    let queue = h.queue_with_staff(&[TA]).await.unwrap();
    let mine = h.question(queue, UserId(100), QuestionStatus::Queued).await.unwrap();
    h.question(queue, UserId(101), QuestionStatus::Queued).await.unwrap();

    let view = service
        .personalized(queue, UserId(100), Role::Student)
        .await
        .unwrap();
    assert_eq!(view.questions.len(), 2);
    assert_eq!(view.your_questions.len(), 1);
    assert_eq!(view.your_questions[0].id, mine.id);
    let other = &view.questions[1];
    assert!(other.detail.is_none());

    let staff = service.personalized(queue, TA, Role::Ta).await.unwrap();
    assert!(staff.questions.iter().all(|v| v.detail.is_some()));
    let names: Vec<_> = staff
        .questions
        .iter()
        .filter_map(|v| v.detail.as_ref().map(|d| d.creator.name.clone()))
        .collect();
    assert_eq!(names, ["Ada", "Grace"]);
}
