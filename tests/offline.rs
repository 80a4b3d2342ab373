mod common;

use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;

use workshop_sync::form::FormData;
use workshop_sync::offline::{AttachmentFile, OfflineFiles, OfflineStore, StoredFiles, SubmissionAction};
use workshop_sync::site::RemoteFile;
use workshop_sync::storage::LocalStorage;

async fn store() -> OfflineStore {
    OfflineStore::new(Arc::new(Mutex::new(LocalStorage::in_memory().await.unwrap())))
}

#[tokio::test]
async fn test_new_submission_is_keyed_by_negative_time() {
    let store = store().await;

    let queued = store
        .save_submission(7, 3, "Title", "Body", None, None, SubmissionAction::Add)
        .await
        .unwrap();

    assert!(queued.submission_id < 0);
    assert_eq!(queued.submission_id, -queued.time_modified);
    assert!(!queued.is_editing());

    let loaded = store
        .get_submission_action(7, queued.submission_id, SubmissionAction::Add)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded, queued);
}

#[tokio::test]
async fn test_same_key_replaces_previous_action() {
    let store = store().await;
    let attachments = StoredFiles {
        online: vec![RemoteFile {
            filename: "a.pdf".to_string(),
            ..Default::default()
        }],
        offline: 2,
    };

    store
        .save_submission(7, 3, "Old", "Old", None, Some(42), SubmissionAction::Update)
        .await
        .unwrap();
    store
        .save_submission(7, 3, "New", "New", Some(&attachments), Some(42), SubmissionAction::Update)
        .await
        .unwrap();
    store
        .save_submission(7, 3, "", "", None, Some(42), SubmissionAction::Delete)
        .await
        .unwrap();

    let actions = store.get_submission_actions(7, 42).await.unwrap();
    assert_eq!(actions.len(), 2);

    let update = store
        .get_submission_action(7, 42, SubmissionAction::Update)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(update.title, "New");
    assert_eq!(update.attachments, Some(attachments));

    store
        .delete_submission_action(7, 42, SubmissionAction::Delete)
        .await
        .unwrap();
    assert_eq!(store.get_submission_actions(7, 42).await.unwrap().len(), 1);

    store.delete_all_submission_actions(7, 42).await.unwrap();
    assert!(store.get_submissions(7).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_workshops_with_data_span_every_queue() {
    let store = store().await;
    store
        .save_submission(7, 3, "T", "B", None, Some(1), SubmissionAction::Update)
        .await
        .unwrap();
    store.save_assessment(9, 5, 3, &FormData::new()).await.unwrap();
    store
        .save_evaluate_submission(4, 1, 3, "Good", true, None)
        .await
        .unwrap();
    store
        .save_evaluate_assessment(9, 6, 3, "Fair", 1, Some("12"))
        .await
        .unwrap();

    assert_eq!(store.get_all_workshops().await.unwrap(), vec![4, 7, 9]);
    assert!(store.has_workshop_offline_data(4).await);
    assert!(!store.has_workshop_offline_data(5).await);

    assert_eq!(store.get_all_submissions().await.unwrap().len(), 1);
    assert_eq!(store.get_all_assessments().await.unwrap().len(), 1);
    assert_eq!(store.get_all_evaluate_submissions().await.unwrap().len(), 1);
    assert_eq!(store.get_all_evaluate_assessments().await.unwrap().len(), 1);

    store.delete_evaluate_submission(4, 1).await.unwrap();
    assert!(!store.has_workshop_offline_data(4).await);
}

#[tokio::test]
async fn test_assessment_keeps_form_data() {
    let store = store().await;
    let mut data = FormData::new();
    data.insert("grade__idx_0".to_string(), json!(3));
    data.insert("feedbackauthor".to_string(), json!("<p>Good</p>"));

    store.save_assessment(7, 5, 3, &data).await.unwrap();
    let queued = store.get_assessment(7, 5).await.unwrap().unwrap();

    assert_eq!(queued.input_data, data);
    assert_eq!(queued.course_id, 3);
    assert!(queued.feedback_attachments().is_none());

    store.delete_assessment(7, 5).await.unwrap();
    assert!(store.get_assessment(7, 5).await.unwrap().is_none());
}

#[tokio::test]
async fn test_evaluations_are_replaced_per_item() {
    let store = store().await;
    store
        .save_evaluate_assessment(7, 6, 3, "First", 1, None)
        .await
        .unwrap();
    store
        .save_evaluate_assessment(7, 6, 3, "Second", 0, Some("8"))
        .await
        .unwrap();

    let queued = store.get_evaluate_assessments(7).await.unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].feedback_text, "Second");
    assert_eq!(queued[0].weight, 0);
    assert_eq!(queued[0].grading_grade_over.as_deref(), Some("8"));
    assert_eq!(
        store.get_evaluate_assessment(7, 6).await.unwrap(),
        Some(queued[0].clone())
    );
}

#[tokio::test]
async fn test_files_are_stored_and_restored() {
    let files = OfflineFiles::new(common::scratch_dir());
    let online = RemoteFile {
        filename: "site.pdf".to_string(),
        fileurl: "https://m.example.org/pluginfile.php/1/site.pdf".to_string(),
        ..Default::default()
    };

    let stored = files
        .store_submission_files(
            7,
            0,
            false,
            &[
                AttachmentFile::local("b.txt", "second"),
                AttachmentFile::Online(online.clone()),
                AttachmentFile::local("a.txt", "first"),
            ],
        )
        .await
        .unwrap();
    assert_eq!(stored.offline, 2);
    assert_eq!(stored.online, vec![online.clone()]);

    let restored = files.get_submission_files(7, 0, false, &stored).await.unwrap();
    assert_eq!(
        restored,
        vec![
            AttachmentFile::Online(online),
            AttachmentFile::local("a.txt", "first"),
            AttachmentFile::local("b.txt", "second"),
        ]
    );

    files.delete_submission_files(7, 0, false).await.unwrap();
    let restored = files.get_submission_files(7, 0, false, &stored).await.unwrap();
    assert_eq!(restored.len(), 1);

    // Deleting twice is fine
    files.delete_submission_files(7, 0, false).await.unwrap();
    let _ = std::fs::remove_dir_all(files.root());
}

#[tokio::test]
async fn test_storing_again_replaces_local_files() {
    let files = OfflineFiles::new(common::scratch_dir());

    files
        .store_assessment_files(7, 5, &[AttachmentFile::local("old.txt", "old")])
        .await
        .unwrap();
    let stored = files
        .store_assessment_files(7, 5, &[AttachmentFile::local("new.txt", "new")])
        .await
        .unwrap();

    let restored = files.get_assessment_files(7, 5, &stored).await.unwrap();
    assert_eq!(restored, vec![AttachmentFile::local("new.txt", "new")]);

    files.delete_assessment_files(7, 5).await.unwrap();
    assert!(!files.assessment_folder(7, 5).exists());
    let _ = std::fs::remove_dir_all(files.root());
}
