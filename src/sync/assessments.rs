use log::{info, warn};

use super::{discard_reason, is_stale, log_file_cleanup, time_or_missing, SyncError, SyncResult, WorkshopSync};
use crate::constants::WARNING_ASSESSMENT_MODIFIED;
use crate::offline::{OfflineAssessment, FEEDBACK_ATTACHMENTS_FIELD};
use crate::site::{upload_files, WorkshopData};

impl WorkshopSync {
    /// Send a queued assessment unless it changed on the site meanwhile
    pub(crate) async fn sync_assessment(
        &self,
        workshop: &WorkshopData,
        queued: OfflineAssessment,
        result: &mut SyncResult,
    ) -> Result<(), SyncError> {
        let assessment_id = queued.assessment_id;
        let site_time = time_or_missing(
            self.site.get_assessment(workshop.id, assessment_id).await,
            |assessment| assessment.timemodified,
        );

        if is_stale(site_time, queued.time_modified) {
            info!("🗑️  Discarding queued assessment {} in workshop {}", assessment_id, workshop.id);
            self.discard_assessment(&queued, result).await?;
            result.add_warning(&workshop.name, WARNING_ASSESSMENT_MODIFIED);
            return Ok(());
        }

        let sent: Result<(), SyncError> = async {
            let files = match queued.feedback_attachments() {
                Some(stored) => {
                    self.files
                        .get_assessment_files(queued.workshop_id, assessment_id, &stored)
                        .await?
                }
                None => Vec::new(),
            };
            let item_id = upload_files(self.site.as_ref(), &files).await?;

            let mut data = queued.input_data.clone();
            data.insert(FEEDBACK_ATTACHMENTS_FIELD.to_string(), item_id.into());
            self.site.update_assessment(assessment_id, &data).await?;
            Ok(())
        }
        .await;

        let rejection = discard_reason(sent)?;
        match &rejection {
            Some(reason) => warn!("⚠️  Site rejected queued assessment {}: {}", assessment_id, reason),
            None => info!("✅ Sent assessment {} in workshop {}", assessment_id, workshop.id),
        }

        self.discard_assessment(&queued, result).await?;
        if let Some(reason) = rejection {
            result.add_warning(&workshop.name, &reason);
        }
        Ok(())
    }

    async fn discard_assessment(&self, queued: &OfflineAssessment, result: &mut SyncResult) -> Result<(), SyncError> {
        result.updated = true;
        self.offline
            .delete_assessment(queued.workshop_id, queued.assessment_id)
            .await?;
        log_file_cleanup(
            self.files
                .delete_assessment_files(queued.workshop_id, queued.assessment_id)
                .await,
        );
        Ok(())
    }
}
