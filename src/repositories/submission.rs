//! Submission repository for queued submission actions.

use anyhow::Result;
use sea_orm::sea_query::{Expr, OnConflict, SimpleExpr};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, Order, QueryFilter, QueryOrder};

use crate::entities::submission;

/// Actions queued in the same second replay as add, update, delete
fn action_rank() -> SimpleExpr {
    Expr::cust("CASE action WHEN 'add' THEN 0 WHEN 'update' THEN 1 ELSE 2 END")
}

/// Repository for queued submission actions.
pub struct SubmissionRepository;

impl SubmissionRepository {
    /// Get every queued submission action.
    pub async fn get_all<C>(conn: &C) -> Result<Vec<submission::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(submission::Entity::find()
            .order_by_asc(submission::Column::WorkshopId)
            .order_by_asc(submission::Column::TimeModified)
            .order_by(action_rank(), Order::Asc)
            .all(conn)
            .await?)
    }

    /// Get the queued submission actions of a workshop, oldest first.
    pub async fn get_for_workshop<C>(conn: &C, workshop_id: i64) -> Result<Vec<submission::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(submission::Entity::find()
            .filter(submission::Column::WorkshopId.eq(workshop_id))
            .order_by_asc(submission::Column::TimeModified)
            .order_by(action_rank(), Order::Asc)
            .all(conn)
            .await?)
    }

    /// Get the queued actions of one submission, oldest first.
    pub async fn get_for_submission<C>(conn: &C, workshop_id: i64, submission_id: i64) -> Result<Vec<submission::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(submission::Entity::find()
            .filter(submission::Column::WorkshopId.eq(workshop_id))
            .filter(submission::Column::SubmissionId.eq(submission_id))
            .order_by_asc(submission::Column::TimeModified)
            .order_by(action_rank(), Order::Asc)
            .all(conn)
            .await?)
    }

    /// Get a single queued action.
    pub async fn get_action<C>(
        conn: &C,
        workshop_id: i64,
        submission_id: i64,
        action: &str,
    ) -> Result<Option<submission::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(
            submission::Entity::find_by_id((workshop_id, submission_id, action.to_string()))
                .one(conn)
                .await?,
        )
    }

    /// Insert a queued action, replacing any row with the same key.
    pub async fn save<C>(conn: &C, model: submission::ActiveModel) -> Result<()>
    where
        C: ConnectionTrait,
    {
        submission::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    submission::Column::WorkshopId,
                    submission::Column::SubmissionId,
                    submission::Column::Action,
                ])
                .update_columns([
                    submission::Column::CourseId,
                    submission::Column::Title,
                    submission::Column::Content,
                    submission::Column::Attachments,
                    submission::Column::TimeModified,
                ])
                .to_owned(),
            )
            .exec(conn)
            .await?;
        Ok(())
    }

    /// Delete a single queued action.
    pub async fn delete_action<C>(conn: &C, workshop_id: i64, submission_id: i64, action: &str) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        let result = submission::Entity::delete_many()
            .filter(submission::Column::WorkshopId.eq(workshop_id))
            .filter(submission::Column::SubmissionId.eq(submission_id))
            .filter(submission::Column::Action.eq(action))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Delete every queued action of a given kind in a workshop.
    pub async fn delete_kind<C>(conn: &C, workshop_id: i64, action: &str) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        let result = submission::Entity::delete_many()
            .filter(submission::Column::WorkshopId.eq(workshop_id))
            .filter(submission::Column::Action.eq(action))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Delete every queued action of one submission.
    pub async fn delete_for_submission<C>(conn: &C, workshop_id: i64, submission_id: i64) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        let result = submission::Entity::delete_many()
            .filter(submission::Column::WorkshopId.eq(workshop_id))
            .filter(submission::Column::SubmissionId.eq(submission_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }
}
