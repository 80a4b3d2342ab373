use log::{info, warn};

use super::{discard_reason, is_stale, time_or_missing, SyncError, SyncResult, WorkshopSync};
use crate::constants::{WARNING_ASSESSMENT_MODIFIED, WARNING_SUBMISSION_MODIFIED};
use crate::offline::{OfflineEvaluateAssessment, OfflineEvaluateSubmission};
use crate::site::WorkshopData;

impl WorkshopSync {
    /// Send a queued submission evaluation unless the submission changed meanwhile
    pub(crate) async fn sync_evaluate_submission(
        &self,
        workshop: &WorkshopData,
        queued: OfflineEvaluateSubmission,
        result: &mut SyncResult,
    ) -> Result<(), SyncError> {
        let submission_id = queued.submission_id;
        let site_time = time_or_missing(
            self.site.get_submission(workshop.id, submission_id).await,
            |submission| submission.timemodified,
        );

        if is_stale(site_time, queued.time_modified) {
            info!("🗑️  Discarding queued evaluation of submission {}", submission_id);
            result.updated = true;
            self.offline
                .delete_evaluate_submission(queued.workshop_id, submission_id)
                .await?;
            result.add_warning(&workshop.name, WARNING_SUBMISSION_MODIFIED);
            return Ok(());
        }

        let sent = self
            .site
            .evaluate_submission(
                submission_id,
                &queued.feedback_text,
                queued.published,
                queued.grade_over.as_deref(),
            )
            .await
            .map_err(SyncError::from);

        let rejection = discard_reason(sent)?;
        match &rejection {
            Some(reason) => warn!("⚠️  Site rejected evaluation of submission {}: {}", submission_id, reason),
            None => info!("✅ Sent evaluation of submission {}", submission_id),
        }

        result.updated = true;
        self.offline
            .delete_evaluate_submission(queued.workshop_id, submission_id)
            .await?;
        if let Some(reason) = rejection {
            result.add_warning(&workshop.name, &reason);
        }
        Ok(())
    }

    /// Send a queued assessment evaluation unless the assessment changed meanwhile
    pub(crate) async fn sync_evaluate_assessment(
        &self,
        workshop: &WorkshopData,
        queued: OfflineEvaluateAssessment,
        result: &mut SyncResult,
    ) -> Result<(), SyncError> {
        let assessment_id = queued.assessment_id;
        let site_time = time_or_missing(
            self.site.get_assessment(workshop.id, assessment_id).await,
            |assessment| assessment.timemodified,
        );

        if is_stale(site_time, queued.time_modified) {
            info!("🗑️  Discarding queued evaluation of assessment {}", assessment_id);
            result.updated = true;
            self.offline
                .delete_evaluate_assessment(queued.workshop_id, assessment_id)
                .await?;
            result.add_warning(&workshop.name, WARNING_ASSESSMENT_MODIFIED);
            return Ok(());
        }

        let sent = self
            .site
            .evaluate_assessment(
                assessment_id,
                &queued.feedback_text,
                queued.weight,
                queued.grading_grade_over.as_deref(),
            )
            .await
            .map_err(SyncError::from);

        let rejection = discard_reason(sent)?;
        match &rejection {
            Some(reason) => warn!("⚠️  Site rejected evaluation of assessment {}: {}", assessment_id, reason),
            None => info!("✅ Sent evaluation of assessment {}", assessment_id),
        }

        result.updated = true;
        self.offline
            .delete_evaluate_assessment(queued.workshop_id, assessment_id)
            .await?;
        if let Some(reason) = rejection {
            result.add_warning(&workshop.name, &reason);
        }
        Ok(())
    }
}
