//! Sync time repository.

use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue, ConnectionTrait, EntityTrait};

use crate::entities::sync_time;

/// Repository for the last synchronization time of component items.
pub struct SyncTimeRepository;

impl SyncTimeRepository {
    /// Get the last sync time, or 0 if the item was never synced.
    pub async fn get<C>(conn: &C, component: &str, item_id: i64) -> Result<i64>
    where
        C: ConnectionTrait,
    {
        Ok(sync_time::Entity::find_by_id((component.to_string(), item_id))
            .one(conn)
            .await?
            .map(|row| row.time)
            .unwrap_or(0))
    }

    /// Store the sync time of an item.
    pub async fn set<C>(conn: &C, component: &str, item_id: i64, time: i64) -> Result<()>
    where
        C: ConnectionTrait,
    {
        let model = sync_time::ActiveModel {
            component: ActiveValue::Set(component.to_string()),
            item_id: ActiveValue::Set(item_id),
            time: ActiveValue::Set(time),
        };

        sync_time::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([sync_time::Column::Component, sync_time::Column::ItemId])
                    .update_column(sync_time::Column::Time)
                    .to_owned(),
            )
            .exec(conn)
            .await?;
        Ok(())
    }
}
