use anyhow::Result;
use sea_orm::ActiveValue;

use super::OfflineStore;
use crate::entities::{evaluate_assessment, evaluate_submission};
use crate::repositories::{EvaluateAssessmentRepository, EvaluateSubmissionRepository};
use crate::utils::datetime;

/// A queued submission evaluation
pub type OfflineEvaluateSubmission = evaluate_submission::Model;
/// A queued assessment evaluation
pub type OfflineEvaluateAssessment = evaluate_assessment::Model;

impl OfflineStore {
    /// Queue a submission evaluation, replacing any previous one.
    pub async fn save_evaluate_submission(
        &self,
        workshop_id: i64,
        submission_id: i64,
        course_id: i64,
        feedback_text: &str,
        published: bool,
        grade_over: Option<&str>,
    ) -> Result<OfflineEvaluateSubmission> {
        let model = OfflineEvaluateSubmission {
            workshop_id,
            submission_id,
            course_id,
            feedback_text: feedback_text.to_string(),
            published,
            grade_over: grade_over.map(str::to_string),
            time_modified: datetime::timestamp(),
        };

        let active = evaluate_submission::ActiveModel {
            workshop_id: ActiveValue::Set(model.workshop_id),
            submission_id: ActiveValue::Set(model.submission_id),
            course_id: ActiveValue::Set(model.course_id),
            feedback_text: ActiveValue::Set(model.feedback_text.clone()),
            published: ActiveValue::Set(model.published),
            grade_over: ActiveValue::Set(model.grade_over.clone()),
            time_modified: ActiveValue::Set(model.time_modified),
        };

        let storage = self.storage.lock().await;
        EvaluateSubmissionRepository::save(&storage.conn, active).await?;
        Ok(model)
    }

    pub async fn get_evaluate_submissions(&self, workshop_id: i64) -> Result<Vec<OfflineEvaluateSubmission>> {
        let storage = self.storage.lock().await;
        EvaluateSubmissionRepository::get_for_workshop(&storage.conn, workshop_id).await
    }

    pub async fn get_all_evaluate_submissions(&self) -> Result<Vec<OfflineEvaluateSubmission>> {
        let storage = self.storage.lock().await;
        EvaluateSubmissionRepository::get_all(&storage.conn).await
    }

    pub async fn get_evaluate_submission(
        &self,
        workshop_id: i64,
        submission_id: i64,
    ) -> Result<Option<OfflineEvaluateSubmission>> {
        let storage = self.storage.lock().await;
        EvaluateSubmissionRepository::get_by_id(&storage.conn, workshop_id, submission_id).await
    }

    pub async fn delete_evaluate_submission(&self, workshop_id: i64, submission_id: i64) -> Result<()> {
        let storage = self.storage.lock().await;
        EvaluateSubmissionRepository::delete(&storage.conn, workshop_id, submission_id).await?;
        Ok(())
    }

    /// Queue an assessment evaluation, replacing any previous one.
    pub async fn save_evaluate_assessment(
        &self,
        workshop_id: i64,
        assessment_id: i64,
        course_id: i64,
        feedback_text: &str,
        weight: i32,
        grading_grade_over: Option<&str>,
    ) -> Result<OfflineEvaluateAssessment> {
        let model = OfflineEvaluateAssessment {
            workshop_id,
            assessment_id,
            course_id,
            feedback_text: feedback_text.to_string(),
            weight,
            grading_grade_over: grading_grade_over.map(str::to_string),
            time_modified: datetime::timestamp(),
        };

        let active = evaluate_assessment::ActiveModel {
            workshop_id: ActiveValue::Set(model.workshop_id),
            assessment_id: ActiveValue::Set(model.assessment_id),
            course_id: ActiveValue::Set(model.course_id),
            feedback_text: ActiveValue::Set(model.feedback_text.clone()),
            weight: ActiveValue::Set(model.weight),
            grading_grade_over: ActiveValue::Set(model.grading_grade_over.clone()),
            time_modified: ActiveValue::Set(model.time_modified),
        };

        let storage = self.storage.lock().await;
        EvaluateAssessmentRepository::save(&storage.conn, active).await?;
        Ok(model)
    }

    pub async fn get_evaluate_assessments(&self, workshop_id: i64) -> Result<Vec<OfflineEvaluateAssessment>> {
        let storage = self.storage.lock().await;
        EvaluateAssessmentRepository::get_for_workshop(&storage.conn, workshop_id).await
    }

    pub async fn get_all_evaluate_assessments(&self) -> Result<Vec<OfflineEvaluateAssessment>> {
        let storage = self.storage.lock().await;
        EvaluateAssessmentRepository::get_all(&storage.conn).await
    }

    pub async fn get_evaluate_assessment(
        &self,
        workshop_id: i64,
        assessment_id: i64,
    ) -> Result<Option<OfflineEvaluateAssessment>> {
        let storage = self.storage.lock().await;
        EvaluateAssessmentRepository::get_by_id(&storage.conn, workshop_id, assessment_id).await
    }

    pub async fn delete_evaluate_assessment(&self, workshop_id: i64, assessment_id: i64) -> Result<()> {
        let storage = self.storage.lock().await;
        EvaluateAssessmentRepository::delete(&storage.conn, workshop_id, assessment_id).await?;
        Ok(())
    }
}
