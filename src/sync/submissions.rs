use log::{debug, info, warn};

use super::{discard_reason, is_stale, log_file_cleanup, time_or_missing, SyncError, SyncResult, WorkshopSync};
use crate::constants::WARNING_SUBMISSION_MODIFIED;
use crate::offline::{OfflineSubmission, SubmissionAction};
use crate::site::{submission_type, upload_files, WorkshopData};

impl WorkshopSync {
    /// Replay the queued actions of one submission, oldest first
    pub(crate) async fn sync_submission(
        &self,
        workshop: &WorkshopData,
        mut actions: Vec<OfflineSubmission>,
        result: &mut SyncResult,
    ) -> Result<(), SyncError> {
        actions.sort_by_key(|action| (action.time_modified, action.action));
        let Some(first) = actions.first() else {
            return Ok(());
        };

        let mut submission_id = first.submission_id;
        let site_time = if submission_id > 0 {
            time_or_missing(
                self.site.get_submission(workshop.id, submission_id).await,
                |submission| submission.timemodified,
            )
        } else {
            0
        };

        if is_stale(site_time, first.time_modified) {
            info!(
                "🗑️  Discarding queued actions of submission {} in workshop {}",
                submission_id, workshop.id
            );
            result.updated = true;
            self.offline
                .delete_all_submission_actions(workshop.id, submission_id)
                .await?;
            log_file_cleanup(
                self.files
                    .delete_submission_files(workshop.id, submission_id, first.is_editing())
                    .await,
            );
            result.add_warning(&workshop.name, WARNING_SUBMISSION_MODIFIED);
            return Ok(());
        }

        let mut rejection = None;
        for action in &actions {
            if action.submission_id > 0 {
                submission_id = action.submission_id;
            }

            let replayed = self.replay_submission_action(workshop, action, submission_id).await;
            match replayed {
                Ok(Some(new_id)) => submission_id = new_id,
                Ok(None) => {}
                Err(e) => {
                    if let Some(reason) = discard_reason(Err(e))? {
                        warn!("⚠️  Site rejected queued {} of submission {}: {}", action.action, submission_id, reason);
                        rejection = Some(reason);
                    }
                }
            }

            result.updated = true;
            self.offline
                .delete_submission_action(action.workshop_id, action.submission_id, action.action)
                .await?;
            if action.action.has_content() {
                log_file_cleanup(
                    self.files
                        .delete_submission_files(action.workshop_id, action.submission_id, action.is_editing())
                        .await,
                );
            }
        }

        if let Some(reason) = rejection {
            result.add_warning(&workshop.name, &reason);
        }
        Ok(())
    }

    /// Send one queued action. Returns the id of a submission created by an add.
    async fn replay_submission_action(
        &self,
        workshop: &WorkshopData,
        action: &OfflineSubmission,
        submission_id: i64,
    ) -> Result<Option<i64>, SyncError> {
        debug!("Replaying {} of submission {}", action.action, submission_id);

        if action.action == SubmissionAction::Delete {
            self.site.delete_submission(submission_id).await?;
            return Ok(None);
        }

        let files = match &action.attachments {
            Some(stored) => {
                self.files
                    .get_submission_files(action.workshop_id, action.submission_id, action.is_editing(), stored)
                    .await?
            }
            None => Vec::new(),
        };
        let item_id = upload_files(self.site.as_ref(), &files).await?;
        let attachments_id = (workshop.submissiontypefile != submission_type::DISABLED).then_some(item_id);

        match action.action {
            SubmissionAction::Add => {
                let new_id = self
                    .site
                    .add_submission(workshop.id, &action.title, &action.content, attachments_id)
                    .await?;
                info!("✅ Created submission {} in workshop {}", new_id, workshop.id);
                Ok(Some(new_id))
            }
            _ => {
                self.site
                    .update_submission(submission_id, &action.title, &action.content, attachments_id)
                    .await?;
                info!("✅ Updated submission {} in workshop {}", submission_id, workshop.id);
                Ok(None)
            }
        }
    }
}
