use log::{debug, info};

use super::helper::{apply_offline_data, DisplaySubmission};
use super::{Outcome, WorkshopError, WorkshopService};
use crate::offline::{AttachmentFile, SubmissionAction};
use crate::site::{upload_files, SiteError};

impl WorkshopService {
    /// Add the user's submission.
    ///
    /// Any queued add for the workshop is replaced. Returns the new submission id when sent.
    pub async fn add_submission(
        &self,
        workshop_id: i64,
        course_id: i64,
        title: &str,
        content: &str,
        attachments: &[AttachmentFile],
        allow_offline: bool,
    ) -> Result<Outcome<i64>, WorkshopError> {
        let allow_offline = self.offline_allowed(allow_offline);

        self.offline
            .delete_submission_actions_of_kind(workshop_id, SubmissionAction::Add)
            .await?;
        self.files.delete_submission_files(workshop_id, 0, false).await?;

        if self.should_queue(allow_offline) {
            return self
                .queue_submission(workshop_id, course_id, title, content, attachments, None, SubmissionAction::Add)
                .await;
        }

        let sent: Result<i64, SiteError> = async {
            let attachments_id = self.upload_attachments(attachments).await?;
            self.site
                .add_submission(workshop_id, title, content, attachments_id)
                .await
        }
        .await;

        match sent {
            Ok(submission_id) => {
                info!("✅ Added submission {} to workshop {}", submission_id, workshop_id);
                Ok(Outcome::Sent(submission_id))
            }
            Err(e) if self.should_queue_after(allow_offline, &e) => {
                debug!("Queueing new submission after failure: {}", e);
                self.queue_submission(workshop_id, course_id, title, content, attachments, None, SubmissionAction::Add)
                    .await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Update an existing submission.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_submission(
        &self,
        workshop_id: i64,
        submission_id: i64,
        course_id: i64,
        title: &str,
        content: &str,
        attachments: &[AttachmentFile],
        allow_offline: bool,
    ) -> Result<Outcome<i64>, WorkshopError> {
        let allow_offline = self.offline_allowed(allow_offline);

        self.offline
            .delete_submission_action(workshop_id, submission_id, SubmissionAction::Update)
            .await?;
        self.files
            .delete_submission_files(workshop_id, submission_id, true)
            .await?;

        if self.should_queue(allow_offline) {
            return self
                .queue_submission(
                    workshop_id,
                    course_id,
                    title,
                    content,
                    attachments,
                    Some(submission_id),
                    SubmissionAction::Update,
                )
                .await;
        }

        let sent: Result<(), SiteError> = async {
            let attachments_id = self.upload_attachments(attachments).await?;
            self.site
                .update_submission(submission_id, title, content, attachments_id)
                .await
        }
        .await;

        match sent {
            Ok(()) => Ok(Outcome::Sent(submission_id)),
            Err(e) if self.should_queue_after(allow_offline, &e) => {
                debug!("Queueing submission update after failure: {}", e);
                self.queue_submission(
                    workshop_id,
                    course_id,
                    title,
                    content,
                    attachments,
                    Some(submission_id),
                    SubmissionAction::Update,
                )
                .await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a submission. Queueing is always allowed.
    pub async fn delete_submission(
        &self,
        workshop_id: i64,
        submission_id: i64,
        course_id: i64,
    ) -> Result<Outcome<i64>, WorkshopError> {
        let allow_offline = self.offline_allowed(true);

        self.offline
            .delete_submission_action(workshop_id, submission_id, SubmissionAction::Delete)
            .await?;

        if self.should_queue(allow_offline) {
            return self
                .queue_submission(workshop_id, course_id, "", "", &[], Some(submission_id), SubmissionAction::Delete)
                .await;
        }

        match self.site.delete_submission(submission_id).await {
            Ok(()) => Ok(Outcome::Sent(submission_id)),
            Err(e) if self.should_queue_after(allow_offline, &e) => {
                debug!("Queueing submission delete after failure: {}", e);
                self.queue_submission(workshop_id, course_id, "", "", &[], Some(submission_id), SubmissionAction::Delete)
                    .await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// A submission with its queued actions applied
    ///
    /// `submission_id` 0 looks up a submission that only exists offline.
    /// Failing to read the site shows the offline data alone.
    pub async fn get_submission_for_display(
        &self,
        workshop_id: i64,
        submission_id: i64,
    ) -> Result<Option<DisplaySubmission>, WorkshopError> {
        let online = if submission_id > 0 {
            match self.site.get_submission(workshop_id, submission_id).await {
                Ok(submission) => Some(submission),
                Err(e) => {
                    debug!("Showing offline data only for submission {}: {}", submission_id, e);
                    None
                }
            }
        } else {
            None
        };

        let actions: Vec<_> = self
            .offline
            .get_submissions(workshop_id)
            .await?
            .into_iter()
            .filter(|action| {
                if submission_id > 0 {
                    action.submission_id == submission_id
                } else {
                    action.submission_id < 0
                }
            })
            .collect();

        Ok(apply_offline_data(&self.files, online, &actions).await?)
    }

    async fn upload_attachments(&self, attachments: &[AttachmentFile]) -> Result<Option<i64>, SiteError> {
        if attachments.is_empty() {
            return Ok(None);
        }
        Ok(Some(upload_files(self.site.as_ref(), attachments).await?))
    }

    #[allow(clippy::too_many_arguments)]
    async fn queue_submission(
        &self,
        workshop_id: i64,
        course_id: i64,
        title: &str,
        content: &str,
        attachments: &[AttachmentFile],
        submission_id: Option<i64>,
        action: SubmissionAction,
    ) -> Result<Outcome<i64>, WorkshopError> {
        let editing = action != SubmissionAction::Add;
        let stored = if action.has_content() {
            Some(
                self.files
                    .store_submission_files(workshop_id, submission_id.unwrap_or(0), editing, attachments)
                    .await?,
            )
        } else {
            None
        };

        let queued = self
            .offline
            .save_submission(
                workshop_id,
                course_id,
                title,
                content,
                stored.as_ref(),
                submission_id,
                action,
            )
            .await?;

        info!(
            "📥 Queued {} of submission {} in workshop {}",
            action, queued.submission_id, workshop_id
        );
        Ok(Outcome::Queued)
    }
}
