use log::{debug, info};

use super::helper::{apply_offline_assessment, apply_offline_evaluate_assessment, apply_offline_evaluate_submission};
use super::{Outcome, WorkshopError, WorkshopService};
use crate::form::{AssessmentForm, FormData};
use crate::offline::{AttachmentFile, FEEDBACK_ATTACHMENTS_FIELD};
use crate::site::{upload_files, AssessmentData, FormMode, SiteError, SubmissionData};

impl WorkshopService {
    /// Send the reviewer's assessment.
    ///
    /// `input_data` is the prepared form data; its feedback attachments field
    /// is filled here, with the draft item id when sent or the stored files
    /// when queued.
    pub async fn update_assessment(
        &self,
        workshop_id: i64,
        assessment_id: i64,
        course_id: i64,
        input_data: &FormData,
        feedback_files: &[AttachmentFile],
        allow_offline: bool,
    ) -> Result<Outcome<()>, WorkshopError> {
        let allow_offline = self.offline_allowed(allow_offline);

        self.offline.delete_assessment(workshop_id, assessment_id).await?;
        self.files.delete_assessment_files(workshop_id, assessment_id).await?;

        if self.should_queue(allow_offline) {
            return self
                .queue_assessment(workshop_id, assessment_id, course_id, input_data, feedback_files)
                .await;
        }

        let sent: Result<(), SiteError> = async {
            let mut data = input_data.clone();
            let attachments_id = upload_files(self.site.as_ref(), feedback_files).await?;
            data.insert(FEEDBACK_ATTACHMENTS_FIELD.to_string(), attachments_id.into());
            self.site.update_assessment(assessment_id, &data).await
        }
        .await;

        match sent {
            Ok(()) => {
                info!("✅ Updated assessment {} in workshop {}", assessment_id, workshop_id);
                Ok(Outcome::Sent(()))
            }
            Err(e) if self.should_queue_after(allow_offline, &e) => {
                debug!("Queueing assessment after failure: {}", e);
                self.queue_assessment(workshop_id, assessment_id, course_id, input_data, feedback_files)
                    .await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Evaluate a submission. Queueing is always allowed.
    pub async fn evaluate_submission(
        &self,
        workshop_id: i64,
        submission_id: i64,
        course_id: i64,
        feedback_text: &str,
        published: bool,
        grade_over: Option<&str>,
    ) -> Result<Outcome<()>, WorkshopError> {
        let allow_offline = self.offline_allowed(true);

        self.offline
            .delete_evaluate_submission(workshop_id, submission_id)
            .await?;

        if !self.should_queue(allow_offline) {
            match self
                .site
                .evaluate_submission(submission_id, feedback_text, published, grade_over)
                .await
            {
                Ok(()) => return Ok(Outcome::Sent(())),
                Err(e) if self.should_queue_after(allow_offline, &e) => {
                    debug!("Queueing submission evaluation after failure: {}", e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.offline
            .save_evaluate_submission(workshop_id, submission_id, course_id, feedback_text, published, grade_over)
            .await?;
        info!("📥 Queued evaluation of submission {} in workshop {}", submission_id, workshop_id);
        Ok(Outcome::Queued)
    }

    /// Evaluate an assessment. Queueing is always allowed.
    pub async fn evaluate_assessment(
        &self,
        workshop_id: i64,
        assessment_id: i64,
        course_id: i64,
        feedback_text: &str,
        weight: i32,
        grading_grade_over: Option<&str>,
    ) -> Result<Outcome<()>, WorkshopError> {
        let allow_offline = self.offline_allowed(true);

        self.offline
            .delete_evaluate_assessment(workshop_id, assessment_id)
            .await?;

        if !self.should_queue(allow_offline) {
            match self
                .site
                .evaluate_assessment(assessment_id, feedback_text, weight, grading_grade_over)
                .await
            {
                Ok(()) => return Ok(Outcome::Sent(())),
                Err(e) if self.should_queue_after(allow_offline, &e) => {
                    debug!("Queueing assessment evaluation after failure: {}", e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.offline
            .save_evaluate_assessment(
                workshop_id,
                assessment_id,
                course_id,
                feedback_text,
                weight,
                grading_grade_over,
            )
            .await?;
        info!("📥 Queued evaluation of assessment {} in workshop {}", assessment_id, workshop_id);
        Ok(Outcome::Queued)
    }

    /// Assessment form with a queued assessment applied
    ///
    /// Returns the form and whether queued values were applied.
    pub async fn get_assessment_form_for_display(
        &self,
        workshop_id: i64,
        assessment_id: i64,
    ) -> Result<(AssessmentForm, bool), WorkshopError> {
        let mut form = self
            .site
            .get_assessment_form(workshop_id, assessment_id, FormMode::Assessment)
            .await?;

        match self.offline.get_assessment(workshop_id, assessment_id).await? {
            Some(queued) => {
                apply_offline_assessment(&mut form, &queued);
                Ok((form, true))
            }
            None => Ok((form, false)),
        }
    }

    /// Submission with a queued evaluation applied
    pub async fn get_evaluated_submission(
        &self,
        workshop_id: i64,
        submission_id: i64,
    ) -> Result<SubmissionData, WorkshopError> {
        let mut submission = self.site.get_submission(workshop_id, submission_id).await?;
        if let Some(queued) = self
            .offline
            .get_evaluate_submission(workshop_id, submission_id)
            .await?
        {
            apply_offline_evaluate_submission(&mut submission, &queued);
        }
        Ok(submission)
    }

    /// Assessment with a queued evaluation applied
    pub async fn get_evaluated_assessment(
        &self,
        workshop_id: i64,
        assessment_id: i64,
    ) -> Result<AssessmentData, WorkshopError> {
        let mut assessment = self.site.get_assessment(workshop_id, assessment_id).await?;
        if let Some(queued) = self
            .offline
            .get_evaluate_assessment(workshop_id, assessment_id)
            .await?
        {
            apply_offline_evaluate_assessment(&mut assessment, &queued);
        }
        Ok(assessment)
    }

    async fn queue_assessment(
        &self,
        workshop_id: i64,
        assessment_id: i64,
        course_id: i64,
        input_data: &FormData,
        feedback_files: &[AttachmentFile],
    ) -> Result<Outcome<()>, WorkshopError> {
        let stored = self
            .files
            .store_assessment_files(workshop_id, assessment_id, feedback_files)
            .await?;

        let mut data = input_data.clone();
        data.insert(
            FEEDBACK_ATTACHMENTS_FIELD.to_string(),
            serde_json::to_value(&stored).map_err(anyhow::Error::from)?,
        );

        self.offline
            .save_assessment(workshop_id, assessment_id, course_id, &data)
            .await?;
        info!("📥 Queued assessment {} in workshop {}", assessment_id, workshop_id);
        Ok(Outcome::Queued)
    }
}
