mod common;

use common::{network_error, web_service_error, Harness, COURSE_ID, WORKSHOP_ID};
use serde_json::json;
use workshop_sync::constants::{WARNING_ASSESSMENT_MODIFIED, WARNING_SUBMISSION_MODIFIED, WORKSHOP_COMPONENT};
use workshop_sync::form::FormData;
use workshop_sync::offline::{AttachmentFile, SubmissionAction, FEEDBACK_ATTACHMENTS_FIELD};
use workshop_sync::site::SiteError;
use workshop_sync::sync::{SyncError, SyncEvent};

fn warning(reason: &str) -> String {
    format!("The offline data of workshop 'Peer review' had to be deleted. {}", reason)
}

#[tokio::test]
async fn test_sync_replays_queued_submission_add() {
    let h = Harness::new(false).await;
    let queued = h
        .service
        .add_submission(
            WORKSHOP_ID,
            COURSE_ID,
            "My essay",
            "<p>Draft</p>",
            &[AttachmentFile::local("essay.txt", "hello")],
            true,
        )
        .await
        .unwrap();
    assert!(queued.is_queued());
    assert!(h.sync.has_data_to_sync(WORKSHOP_ID).await);

    h.connectivity.set_online(true);
    let result = h.sync.sync_workshop(WORKSHOP_ID).await.unwrap();

    assert!(result.updated);
    assert!(result.warnings.is_empty());
    {
        let state = h.site.state.lock().unwrap();
        assert_eq!(
            state.added,
            vec![("My essay".to_string(), "<p>Draft</p>".to_string(), Some(500))]
        );
        assert_eq!(state.uploads.len(), 1);
        assert_eq!(state.uploads[0].1, "essay.txt");
        assert_eq!(state.uploads[0].2, b"hello".to_vec());
        assert_eq!(state.invalidated, vec![WORKSHOP_ID]);
    }

    assert!(h.offline.get_submissions(WORKSHOP_ID).await.unwrap().is_empty());
    assert!(!h.files.submission_folder(WORKSHOP_ID, 0, false).exists());
    assert!(!h.sync.has_data_to_sync(WORKSHOP_ID).await);
    assert!(h.sync.get_sync_time(WORKSHOP_ID).await.unwrap() > 0);
}

#[tokio::test]
async fn test_sync_without_attachment_support_sends_no_item_id() {
    let h = Harness::new(false).await;
    h.site.state.lock().unwrap().workshop.submissiontypefile = 0;
    h.service
        .add_submission(WORKSHOP_ID, COURSE_ID, "Text only", "Body", &[], true)
        .await
        .unwrap();

    h.connectivity.set_online(true);
    h.sync.sync_workshop(WORKSHOP_ID).await.unwrap();

    let state = h.site.state.lock().unwrap();
    assert_eq!(state.added[0].2, None);
    assert!(state.uploads.is_empty());
}

#[tokio::test]
async fn test_sync_discards_update_of_submission_modified_on_site() {
    let h = Harness::new(false).await;
    h.site.put_submission(42, 1000);
    h.service
        .update_submission(
            WORKSHOP_ID,
            42,
            COURSE_ID,
            "Edited",
            "Edited body",
            &[AttachmentFile::local("notes.txt", "x")],
            true,
        )
        .await
        .unwrap();

    // Someone edited the submission on the site after the update was queued
    h.site.put_submission(42, -10);
    h.connectivity.set_online(true);
    let result = h.sync.sync_workshop(WORKSHOP_ID).await.unwrap();

    assert!(result.updated);
    assert_eq!(result.warnings, vec![warning(WARNING_SUBMISSION_MODIFIED)]);
    assert!(h.site.state.lock().unwrap().updated.is_empty());
    assert!(h.offline.get_submissions(WORKSHOP_ID).await.unwrap().is_empty());
    assert!(!h.files.submission_folder(WORKSHOP_ID, 42, true).exists());
}

#[tokio::test]
async fn test_sync_discards_actions_of_deleted_submission() {
    let h = Harness::new(false).await;
    h.service.delete_submission(WORKSHOP_ID, 42, COURSE_ID).await.unwrap();

    h.connectivity.set_online(true);
    let result = h.sync.sync_workshop(WORKSHOP_ID).await.unwrap();

    assert_eq!(result.warnings, vec![warning(WARNING_SUBMISSION_MODIFIED)]);
    assert!(h.site.state.lock().unwrap().deleted.is_empty());
}

#[tokio::test]
async fn test_web_service_error_discards_action_with_warning() {
    let h = Harness::new(false).await;
    h.site.put_submission(42, 1000);
    h.service.delete_submission(WORKSHOP_ID, 42, COURSE_ID).await.unwrap();
    h.site.fail("delete_submission", web_service_error("You can't delete this submission"));

    h.connectivity.set_online(true);
    let result = h.sync.sync_workshop(WORKSHOP_ID).await.unwrap();

    assert!(result.updated);
    assert_eq!(result.warnings, vec![warning("You can't delete this submission")]);
    assert!(h
        .offline
        .get_submission_action(WORKSHOP_ID, 42, SubmissionAction::Delete)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_network_error_keeps_action_and_fails_sync() {
    let h = Harness::new(false).await;
    h.site.put_submission(42, 1000);
    h.service
        .update_submission(WORKSHOP_ID, 42, COURSE_ID, "Edited", "Body", &[], true)
        .await
        .unwrap();
    h.site.fail("update_submission", network_error());

    h.connectivity.set_online(true);
    let outcome = h.sync.sync_workshop(WORKSHOP_ID).await;

    assert!(matches!(outcome, Err(SyncError::Site(SiteError::Network(_)))));
    assert_eq!(h.offline.get_submissions(WORKSHOP_ID).await.unwrap().len(), 1);
    assert_eq!(h.sync.get_sync_time(WORKSHOP_ID).await.unwrap(), 0);

    // The next attempt succeeds
    h.site.recover("update_submission");
    let result = h.sync.sync_workshop(WORKSHOP_ID).await.unwrap();
    assert!(result.warnings.is_empty());
    assert_eq!(h.site.state.lock().unwrap().updated.len(), 1);
}

#[tokio::test]
async fn test_sync_while_offline_fails() {
    let h = Harness::new(false).await;
    h.service
        .evaluate_submission(WORKSHOP_ID, 42, COURSE_ID, "Well done", true, None)
        .await
        .unwrap();

    let outcome = h.sync.sync_workshop(WORKSHOP_ID).await;
    assert!(matches!(outcome, Err(SyncError::Offline)));
    assert!(h.sync.has_data_to_sync(WORKSHOP_ID).await);
}

#[tokio::test]
async fn test_sync_without_data_only_records_time() {
    let h = Harness::new(false).await;

    let result = h.sync.sync_workshop(WORKSHOP_ID).await.unwrap();

    assert!(!result.updated);
    assert!(result.warnings.is_empty());
    assert!(h.site.calls().is_empty());
    assert!(h.sync.get_sync_time(WORKSHOP_ID).await.unwrap() > 0);
}

#[tokio::test]
async fn test_blocked_workshop_is_not_synced() {
    let h = Harness::new(true).await;
    h.sync
        .blocker()
        .block_operation(WORKSHOP_COMPONENT, WORKSHOP_ID, Some("edit"))
        .await;

    let outcome = h.sync.sync_workshop(WORKSHOP_ID).await;
    assert!(matches!(outcome, Err(SyncError::Blocked { workshop_id }) if workshop_id == WORKSHOP_ID));

    h.sync.blocker().clear_blocks(WORKSHOP_COMPONENT, WORKSHOP_ID).await;
    assert!(h.sync.sync_workshop(WORKSHOP_ID).await.is_ok());
}

#[tokio::test]
async fn test_assessment_sync_uploads_feedback_files() {
    let h = Harness::new(false).await;
    h.site.put_assessment(9, 1000);

    let mut data = FormData::new();
    data.insert("grade__idx_0".to_string(), json!(4));
    data.insert("feedbackauthor".to_string(), json!("Solid work"));
    let queued = h
        .service
        .update_assessment(
            WORKSHOP_ID,
            9,
            COURSE_ID,
            &data,
            &[AttachmentFile::local("review.txt", "comments")],
            true,
        )
        .await
        .unwrap();
    assert!(queued.is_queued());

    h.connectivity.set_online(true);
    let result = h.sync.sync_workshop(WORKSHOP_ID).await.unwrap();
    assert!(result.warnings.is_empty());

    let state = h.site.state.lock().unwrap();
    assert_eq!(state.assessed.len(), 1);
    let (assessment_id, sent) = &state.assessed[0];
    assert_eq!(*assessment_id, 9);
    assert_eq!(sent[FEEDBACK_ATTACHMENTS_FIELD], json!(500));
    assert_eq!(sent["grade__idx_0"], json!(4));
    assert_eq!(state.uploads[0].1, "review.txt");
    drop(state);

    assert!(h.offline.get_assessments(WORKSHOP_ID).await.unwrap().is_empty());
    assert!(!h.files.assessment_folder(WORKSHOP_ID, 9).exists());
}

#[tokio::test]
async fn test_stale_assessment_evaluation_warns() {
    let h = Harness::new(false).await;
    h.site.put_assessment(9, 1000);
    h.service
        .evaluate_assessment(WORKSHOP_ID, 9, COURSE_ID, "Too harsh", 0, Some("10"))
        .await
        .unwrap();

    h.site.put_assessment(9, -10);
    h.connectivity.set_online(true);
    let result = h.sync.sync_workshop(WORKSHOP_ID).await.unwrap();

    assert_eq!(result.warnings, vec![warning(WARNING_ASSESSMENT_MODIFIED)]);
    assert!(h.site.state.lock().unwrap().evaluated_assessments.is_empty());
    assert!(h.offline.get_evaluate_assessments(WORKSHOP_ID).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_submission_evaluation_is_replayed() {
    let h = Harness::new(false).await;
    h.site.put_submission(42, 1000);
    h.service
        .evaluate_submission(WORKSHOP_ID, 42, COURSE_ID, "Well done", true, Some("75"))
        .await
        .unwrap();

    h.connectivity.set_online(true);
    let result = h.sync.sync_workshop(WORKSHOP_ID).await.unwrap();

    assert!(result.updated);
    assert_eq!(
        h.site.state.lock().unwrap().evaluated_submissions,
        vec![(42, "Well done".to_string(), true, Some("75".to_string()))]
    );
}

#[tokio::test]
async fn test_sync_all_workshops_emits_event_and_respects_interval() {
    let h = Harness::new(false).await;
    let mut events = h.sync.subscribe();
    h.site.put_submission(42, 1000);
    h.service
        .evaluate_submission(WORKSHOP_ID, 42, COURSE_ID, "Good", false, None)
        .await
        .unwrap();

    h.connectivity.set_online(true);
    let summary = h.sync.sync_all_workshops(false).await.unwrap();
    assert_eq!(summary.synced.len(), 1);
    assert!(summary.failed.is_empty());
    assert_eq!(
        events.try_recv().unwrap(),
        SyncEvent::AutoSynced {
            workshop_id: WORKSHOP_ID,
            warnings: Vec::new()
        }
    );

    // Queued again right after a sync: too early unless forced
    h.service
        .evaluate_submission(WORKSHOP_ID, 42, COURSE_ID, "Better", false, None)
        .await
        .unwrap();
    let summary = h.sync.sync_all_workshops(false).await.unwrap();
    assert_eq!(summary.skipped, vec![WORKSHOP_ID]);

    let summary = h.sync.sync_all_workshops(true).await.unwrap();
    assert_eq!(summary.synced.len(), 1);
    assert_eq!(h.site.state.lock().unwrap().evaluated_submissions.len(), 2);
}

#[tokio::test]
async fn test_failed_workshop_is_reported_in_summary() {
    let h = Harness::new(false).await;
    h.service
        .evaluate_submission(WORKSHOP_ID, 42, COURSE_ID, "Good", false, None)
        .await
        .unwrap();
    h.site.fail("get_workshop_by_id", network_error());

    h.connectivity.set_online(true);
    let summary = h.sync.sync_all_workshops(true).await.unwrap();

    assert!(summary.synced.is_empty());
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, WORKSHOP_ID);
}

#[tokio::test]
async fn test_concurrent_syncs_send_each_action_once() {
    let h = Harness::new(false).await;
    h.service
        .add_submission(WORKSHOP_ID, COURSE_ID, "Once", "Body", &[], true)
        .await
        .unwrap();

    h.connectivity.set_online(true);
    let (first, second) = tokio::join!(h.sync.sync_workshop(WORKSHOP_ID), h.sync.sync_workshop(WORKSHOP_ID));

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(h.site.state.lock().unwrap().added.len(), 1);
    assert!(!h.sync.is_syncing(WORKSHOP_ID).await);
}

#[tokio::test]
async fn test_same_second_actions_replay_update_before_delete() {
    use sea_orm::Set;
    use workshop_sync::entities::submission;
    use workshop_sync::repositories::SubmissionRepository;
    use workshop_sync::utils::datetime;

    let h = Harness::new(false).await;
    h.site.put_submission(42, 1000);
    let queued_at = datetime::timestamp() - 5;
    {
        let storage = h.storage.lock().await;
        for action in [SubmissionAction::Delete, SubmissionAction::Update] {
            let row = submission::ActiveModel {
                workshop_id: Set(WORKSHOP_ID),
                submission_id: Set(42),
                action: Set(action.as_str().to_string()),
                course_id: Set(COURSE_ID),
                title: Set("Last words".to_string()),
                content: Set("Body".to_string()),
                attachments: Set(None),
                time_modified: Set(queued_at),
            };
            SubmissionRepository::save(&storage.conn, row).await.unwrap();
        }
    }

    let queued: Vec<SubmissionAction> = h
        .offline
        .get_submissions(WORKSHOP_ID)
        .await
        .unwrap()
        .into_iter()
        .map(|action| action.action)
        .collect();
    assert_eq!(queued, vec![SubmissionAction::Update, SubmissionAction::Delete]);

    h.connectivity.set_online(true);
    let result = h.sync.sync_workshop(WORKSHOP_ID).await.unwrap();

    assert!(result.warnings.is_empty());
    let replayed: Vec<String> = h
        .site
        .calls()
        .into_iter()
        .filter(|call| call == "update_submission" || call == "delete_submission")
        .collect();
    assert_eq!(replayed, vec!["update_submission", "delete_submission"]);
    assert!(h.offline.get_submissions(WORKSHOP_ID).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancelled_sync_does_not_block_later_syncs() {
    use std::time::Duration;

    let h = Harness::new(false).await;
    h.service
        .add_submission(WORKSHOP_ID, COURSE_ID, "Patient", "Body", &[], true)
        .await
        .unwrap();
    h.connectivity.set_online(true);

    let storage = h.storage.lock().await;
    let cancelled = tokio::time::timeout(Duration::from_millis(50), h.sync.sync_workshop(WORKSHOP_ID)).await;
    assert!(cancelled.is_err());
    drop(storage);

    h.sync.sync_workshop(WORKSHOP_ID).await.unwrap();
    assert_eq!(h.site.state.lock().unwrap().added.len(), 1);
    assert!(!h.sync.is_syncing(WORKSHOP_ID).await);
    assert!(!h.sync.has_data_to_sync(WORKSHOP_ID).await);

    // A later sync starts fresh
    assert!(h.sync.sync_workshop(WORKSHOP_ID).await.is_ok());
    assert_eq!(h.site.state.lock().unwrap().added.len(), 1);
}
