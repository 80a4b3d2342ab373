use anyhow::{Context, Result};
use sea_orm::ActiveValue;

use super::{OfflineStore, StoredFiles, SubmissionAction};
use crate::entities::submission;
use crate::repositories::SubmissionRepository;
use crate::utils::datetime;

/// A queued submission action.
///
/// New submissions have no id on the site yet; they are queued with the
/// negated creation time as `submission_id`.
#[derive(Clone, Debug, PartialEq)]
pub struct OfflineSubmission {
    pub workshop_id: i64,
    pub submission_id: i64,
    pub course_id: i64,
    pub action: SubmissionAction,
    pub title: String,
    pub content: String,
    pub attachments: Option<StoredFiles>,
    pub time_modified: i64,
}

impl OfflineSubmission {
    /// Whether the submission already exists on the site
    pub fn is_editing(&self) -> bool {
        self.submission_id > 0
    }
}

impl TryFrom<submission::Model> for OfflineSubmission {
    type Error = anyhow::Error;

    fn try_from(row: submission::Model) -> Result<Self> {
        let attachments = match row.attachments.as_deref() {
            None | Some("") | Some("null") => None,
            Some(json) => Some(
                serde_json::from_str(json)
                    .with_context(|| format!("Invalid attachments of submission {}", row.submission_id))?,
            ),
        };

        Ok(Self {
            workshop_id: row.workshop_id,
            submission_id: row.submission_id,
            course_id: row.course_id,
            action: row.action.parse()?,
            title: row.title,
            content: row.content,
            attachments,
            time_modified: row.time_modified,
        })
    }
}

fn parse_rows(rows: Vec<submission::Model>) -> Result<Vec<OfflineSubmission>> {
    rows.into_iter().map(OfflineSubmission::try_from).collect()
}

impl OfflineStore {
    /// Queue a submission action, replacing any action with the same key.
    ///
    /// Without a `submission_id` the action is keyed by the negated time.
    #[allow(clippy::too_many_arguments)]
    pub async fn save_submission(
        &self,
        workshop_id: i64,
        course_id: i64,
        title: &str,
        content: &str,
        attachments: Option<&StoredFiles>,
        submission_id: Option<i64>,
        action: SubmissionAction,
    ) -> Result<OfflineSubmission> {
        let time_modified = datetime::timestamp();
        let submission_id = submission_id.filter(|id| *id != 0).unwrap_or(-time_modified);
        let attachments_json = attachments
            .map(serde_json::to_string)
            .transpose()
            .context("Failed to encode attachments")?;

        let model = submission::ActiveModel {
            workshop_id: ActiveValue::Set(workshop_id),
            submission_id: ActiveValue::Set(submission_id),
            action: ActiveValue::Set(action.as_str().to_string()),
            course_id: ActiveValue::Set(course_id),
            title: ActiveValue::Set(title.to_string()),
            content: ActiveValue::Set(content.to_string()),
            attachments: ActiveValue::Set(attachments_json),
            time_modified: ActiveValue::Set(time_modified),
        };

        let storage = self.storage.lock().await;
        SubmissionRepository::save(&storage.conn, model).await?;

        Ok(OfflineSubmission {
            workshop_id,
            submission_id,
            course_id,
            action,
            title: title.to_string(),
            content: content.to_string(),
            attachments: attachments.cloned(),
            time_modified,
        })
    }

    /// Queued submission actions of a workshop, oldest first
    pub async fn get_submissions(&self, workshop_id: i64) -> Result<Vec<OfflineSubmission>> {
        let storage = self.storage.lock().await;
        parse_rows(SubmissionRepository::get_for_workshop(&storage.conn, workshop_id).await?)
    }

    pub async fn get_all_submissions(&self) -> Result<Vec<OfflineSubmission>> {
        let storage = self.storage.lock().await;
        parse_rows(SubmissionRepository::get_all(&storage.conn).await?)
    }

    /// Queued actions of one submission, oldest first
    pub async fn get_submission_actions(&self, workshop_id: i64, submission_id: i64) -> Result<Vec<OfflineSubmission>> {
        let storage = self.storage.lock().await;
        parse_rows(SubmissionRepository::get_for_submission(&storage.conn, workshop_id, submission_id).await?)
    }

    pub async fn get_submission_action(
        &self,
        workshop_id: i64,
        submission_id: i64,
        action: SubmissionAction,
    ) -> Result<Option<OfflineSubmission>> {
        let storage = self.storage.lock().await;
        SubmissionRepository::get_action(&storage.conn, workshop_id, submission_id, action.as_str())
            .await?
            .map(OfflineSubmission::try_from)
            .transpose()
    }

    pub async fn delete_submission_action(
        &self,
        workshop_id: i64,
        submission_id: i64,
        action: SubmissionAction,
    ) -> Result<()> {
        let storage = self.storage.lock().await;
        SubmissionRepository::delete_action(&storage.conn, workshop_id, submission_id, action.as_str()).await?;
        Ok(())
    }

    /// Drop every queued action of a kind in a workshop
    pub async fn delete_submission_actions_of_kind(&self, workshop_id: i64, action: SubmissionAction) -> Result<()> {
        let storage = self.storage.lock().await;
        SubmissionRepository::delete_kind(&storage.conn, workshop_id, action.as_str()).await?;
        Ok(())
    }

    pub async fn delete_all_submission_actions(&self, workshop_id: i64, submission_id: i64) -> Result<()> {
        let storage = self.storage.lock().await;
        SubmissionRepository::delete_for_submission(&storage.conn, workshop_id, submission_id).await?;
        Ok(())
    }
}
