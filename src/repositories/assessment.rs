//! Assessment repository for queued assessment form data.

use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::assessment;

/// Repository for queued assessments.
pub struct AssessmentRepository;

impl AssessmentRepository {
    /// Get every queued assessment.
    pub async fn get_all<C>(conn: &C) -> Result<Vec<assessment::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(assessment::Entity::find()
            .order_by_asc(assessment::Column::WorkshopId)
            .order_by_asc(assessment::Column::TimeModified)
            .all(conn)
            .await?)
    }

    /// Get the queued assessments of a workshop.
    pub async fn get_for_workshop<C>(conn: &C, workshop_id: i64) -> Result<Vec<assessment::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(assessment::Entity::find()
            .filter(assessment::Column::WorkshopId.eq(workshop_id))
            .order_by_asc(assessment::Column::TimeModified)
            .all(conn)
            .await?)
    }

    /// Get a single queued assessment.
    pub async fn get_by_id<C>(conn: &C, workshop_id: i64, assessment_id: i64) -> Result<Option<assessment::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(assessment::Entity::find_by_id((workshop_id, assessment_id)).one(conn).await?)
    }

    /// Insert a queued assessment, replacing any previous one.
    pub async fn save<C>(conn: &C, model: assessment::ActiveModel) -> Result<()>
    where
        C: ConnectionTrait,
    {
        assessment::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([assessment::Column::WorkshopId, assessment::Column::AssessmentId])
                    .update_columns([
                        assessment::Column::CourseId,
                        assessment::Column::InputData,
                        assessment::Column::TimeModified,
                    ])
                    .to_owned(),
            )
            .exec(conn)
            .await?;
        Ok(())
    }

    /// Delete a queued assessment.
    pub async fn delete<C>(conn: &C, workshop_id: i64, assessment_id: i64) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        let result = assessment::Entity::delete_many()
            .filter(assessment::Column::WorkshopId.eq(workshop_id))
            .filter(assessment::Column::AssessmentId.eq(assessment_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }
}
