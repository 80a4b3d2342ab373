//! Web-service cache repository.

use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::entities::ws_cache;

/// Repository for cached web-service responses.
pub struct WsCacheRepository;

impl WsCacheRepository {
    /// Get a cached entry by key.
    pub async fn get<C>(conn: &C, cache_key: &str) -> Result<Option<ws_cache::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(ws_cache::Entity::find_by_id(cache_key.to_string()).one(conn).await?)
    }

    /// Store (or refresh) a cached entry.
    pub async fn put<C>(conn: &C, cache_key: &str, function: &str, data: &str, time: i64) -> Result<()>
    where
        C: ConnectionTrait,
    {
        let model = ws_cache::ActiveModel {
            cache_key: ActiveValue::Set(cache_key.to_string()),
            function: ActiveValue::Set(function.to_string()),
            data: ActiveValue::Set(data.to_string()),
            time_cached: ActiveValue::Set(time),
        };

        ws_cache::Entity::insert(model)
            .on_conflict(
                OnConflict::column(ws_cache::Column::CacheKey)
                    .update_columns([
                        ws_cache::Column::Function,
                        ws_cache::Column::Data,
                        ws_cache::Column::TimeCached,
                    ])
                    .to_owned(),
            )
            .exec(conn)
            .await?;
        Ok(())
    }

    /// Delete every entry whose key starts with `prefix`.
    pub async fn delete_with_prefix<C>(conn: &C, prefix: &str) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        let result = ws_cache::Entity::delete_many()
            .filter(ws_cache::Column::CacheKey.starts_with(prefix))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }
}
