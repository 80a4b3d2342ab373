//! Evaluation repositories for queued submission and assessment evaluations.

use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::{evaluate_assessment, evaluate_submission};

/// Repository for queued submission evaluations.
pub struct EvaluateSubmissionRepository;

impl EvaluateSubmissionRepository {
    pub async fn get_all<C>(conn: &C) -> Result<Vec<evaluate_submission::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(evaluate_submission::Entity::find()
            .order_by_asc(evaluate_submission::Column::WorkshopId)
            .order_by_asc(evaluate_submission::Column::TimeModified)
            .all(conn)
            .await?)
    }

    pub async fn get_for_workshop<C>(conn: &C, workshop_id: i64) -> Result<Vec<evaluate_submission::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(evaluate_submission::Entity::find()
            .filter(evaluate_submission::Column::WorkshopId.eq(workshop_id))
            .order_by_asc(evaluate_submission::Column::TimeModified)
            .all(conn)
            .await?)
    }

    pub async fn get_by_id<C>(
        conn: &C,
        workshop_id: i64,
        submission_id: i64,
    ) -> Result<Option<evaluate_submission::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(evaluate_submission::Entity::find_by_id((workshop_id, submission_id))
            .one(conn)
            .await?)
    }

    pub async fn save<C>(conn: &C, model: evaluate_submission::ActiveModel) -> Result<()>
    where
        C: ConnectionTrait,
    {
        evaluate_submission::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    evaluate_submission::Column::WorkshopId,
                    evaluate_submission::Column::SubmissionId,
                ])
                .update_columns([
                    evaluate_submission::Column::CourseId,
                    evaluate_submission::Column::FeedbackText,
                    evaluate_submission::Column::Published,
                    evaluate_submission::Column::GradeOver,
                    evaluate_submission::Column::TimeModified,
                ])
                .to_owned(),
            )
            .exec(conn)
            .await?;
        Ok(())
    }

    pub async fn delete<C>(conn: &C, workshop_id: i64, submission_id: i64) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        let result = evaluate_submission::Entity::delete_many()
            .filter(evaluate_submission::Column::WorkshopId.eq(workshop_id))
            .filter(evaluate_submission::Column::SubmissionId.eq(submission_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }
}

/// Repository for queued assessment evaluations.
pub struct EvaluateAssessmentRepository;

impl EvaluateAssessmentRepository {
    pub async fn get_all<C>(conn: &C) -> Result<Vec<evaluate_assessment::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(evaluate_assessment::Entity::find()
            .order_by_asc(evaluate_assessment::Column::WorkshopId)
            .order_by_asc(evaluate_assessment::Column::TimeModified)
            .all(conn)
            .await?)
    }

    pub async fn get_for_workshop<C>(conn: &C, workshop_id: i64) -> Result<Vec<evaluate_assessment::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(evaluate_assessment::Entity::find()
            .filter(evaluate_assessment::Column::WorkshopId.eq(workshop_id))
            .order_by_asc(evaluate_assessment::Column::TimeModified)
            .all(conn)
            .await?)
    }

    pub async fn get_by_id<C>(
        conn: &C,
        workshop_id: i64,
        assessment_id: i64,
    ) -> Result<Option<evaluate_assessment::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(evaluate_assessment::Entity::find_by_id((workshop_id, assessment_id))
            .one(conn)
            .await?)
    }

    pub async fn save<C>(conn: &C, model: evaluate_assessment::ActiveModel) -> Result<()>
    where
        C: ConnectionTrait,
    {
        evaluate_assessment::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    evaluate_assessment::Column::WorkshopId,
                    evaluate_assessment::Column::AssessmentId,
                ])
                .update_columns([
                    evaluate_assessment::Column::CourseId,
                    evaluate_assessment::Column::FeedbackText,
                    evaluate_assessment::Column::Weight,
                    evaluate_assessment::Column::GradingGradeOver,
                    evaluate_assessment::Column::TimeModified,
                ])
                .to_owned(),
            )
            .exec(conn)
            .await?;
        Ok(())
    }

    pub async fn delete<C>(conn: &C, workshop_id: i64, assessment_id: i64) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        let result = evaluate_assessment::Entity::delete_many()
            .filter(evaluate_assessment::Column::WorkshopId.eq(workshop_id))
            .filter(evaluate_assessment::Column::AssessmentId.eq(assessment_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }
}
