use anyhow::{Context, Result};
use sea_orm::ActiveValue;

use super::{OfflineStore, StoredFiles};
use crate::entities::assessment;
use crate::form::FormData;
use crate::repositories::AssessmentRepository;
use crate::utils::datetime;

/// Form field carrying the feedback attachments of an assessment
pub const FEEDBACK_ATTACHMENTS_FIELD: &str = "feedbackauthorattachmentsid";

/// A queued assessment.
#[derive(Clone, Debug, PartialEq)]
pub struct OfflineAssessment {
    pub workshop_id: i64,
    pub assessment_id: i64,
    pub course_id: i64,
    /// Prepared form data; the feedback attachments field holds a [`StoredFiles`] object
    pub input_data: FormData,
    pub time_modified: i64,
}

impl OfflineAssessment {
    /// Stored feedback attachments, if the form data carries any
    pub fn feedback_attachments(&self) -> Option<StoredFiles> {
        self.input_data
            .get(FEEDBACK_ATTACHMENTS_FIELD)
            .filter(|value| value.is_object())
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

impl TryFrom<assessment::Model> for OfflineAssessment {
    type Error = anyhow::Error;

    fn try_from(row: assessment::Model) -> Result<Self> {
        let input_data = serde_json::from_str(&row.input_data)
            .with_context(|| format!("Invalid input data of assessment {}", row.assessment_id))?;

        Ok(Self {
            workshop_id: row.workshop_id,
            assessment_id: row.assessment_id,
            course_id: row.course_id,
            input_data,
            time_modified: row.time_modified,
        })
    }
}

impl OfflineStore {
    /// Queue an assessment, replacing any previous one.
    pub async fn save_assessment(
        &self,
        workshop_id: i64,
        assessment_id: i64,
        course_id: i64,
        input_data: &FormData,
    ) -> Result<OfflineAssessment> {
        let time_modified = datetime::timestamp();
        let model = assessment::ActiveModel {
            workshop_id: ActiveValue::Set(workshop_id),
            assessment_id: ActiveValue::Set(assessment_id),
            course_id: ActiveValue::Set(course_id),
            input_data: ActiveValue::Set(serde_json::to_string(input_data).context("Failed to encode input data")?),
            time_modified: ActiveValue::Set(time_modified),
        };

        let storage = self.storage.lock().await;
        AssessmentRepository::save(&storage.conn, model).await?;

        Ok(OfflineAssessment {
            workshop_id,
            assessment_id,
            course_id,
            input_data: input_data.clone(),
            time_modified,
        })
    }

    pub async fn get_assessments(&self, workshop_id: i64) -> Result<Vec<OfflineAssessment>> {
        let storage = self.storage.lock().await;
        AssessmentRepository::get_for_workshop(&storage.conn, workshop_id)
            .await?
            .into_iter()
            .map(OfflineAssessment::try_from)
            .collect()
    }

    pub async fn get_all_assessments(&self) -> Result<Vec<OfflineAssessment>> {
        let storage = self.storage.lock().await;
        AssessmentRepository::get_all(&storage.conn)
            .await?
            .into_iter()
            .map(OfflineAssessment::try_from)
            .collect()
    }

    pub async fn get_assessment(&self, workshop_id: i64, assessment_id: i64) -> Result<Option<OfflineAssessment>> {
        let storage = self.storage.lock().await;
        AssessmentRepository::get_by_id(&storage.conn, workshop_id, assessment_id)
            .await?
            .map(OfflineAssessment::try_from)
            .transpose()
    }

    pub async fn delete_assessment(&self, workshop_id: i64, assessment_id: i64) -> Result<()> {
        let storage = self.storage.lock().await;
        AssessmentRepository::delete(&storage.conn, workshop_id, assessment_id).await?;
        Ok(())
    }
}
