use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use uuid::Uuid;

use crate::entities::{
    Assessment, EvaluateAssessment, EvaluateSubmission, Submission, SyncTime, WsCache,
};

/// Local storage for queued offline actions, sync times and cached web-service data
pub struct LocalStorage {
    pub conn: DatabaseConnection,
}

impl LocalStorage {
    /// Open (or create) the `SQLite` database at `path`
    pub async fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", path.display());
        let mut options = ConnectOptions::new(database_url);
        options
            .max_connections(4)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = Database::connect(options)
            .await
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        let storage = LocalStorage { conn };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Open a private in-memory database
    ///
    /// Every call gets its own shared-cache name so that independent storages
    /// never see each other's rows. A single pooled connection keeps the
    /// database alive for the lifetime of the storage.
    pub async fn in_memory() -> Result<Self> {
        let database_url = format!("sqlite:file:workshop_sync_{}?mode=memory&cache=shared", Uuid::new_v4().simple());
        let mut options = ConnectOptions::new(database_url);
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let conn = Database::connect(options).await?;

        let storage = LocalStorage { conn };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Create every table from its entity definition
    async fn init_schema(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        let schema = Schema::new(backend);

        let mut statements = vec![
            schema.create_table_from_entity(Submission),
            schema.create_table_from_entity(Assessment),
            schema.create_table_from_entity(EvaluateSubmission),
            schema.create_table_from_entity(EvaluateAssessment),
            schema.create_table_from_entity(SyncTime),
            schema.create_table_from_entity(WsCache),
        ];

        for statement in statements.iter_mut() {
            statement.if_not_exists();
            self.conn.execute(backend.build(&*statement)).await?;
        }

        debug!("💾 Offline schema ready");
        Ok(())
    }

    /// Check if any offline action is queued
    pub async fn has_data(&self) -> Result<bool> {
        let submissions = Submission::find().one(&self.conn).await?;
        let assessments = Assessment::find().one(&self.conn).await?;
        let evaluate_submissions = EvaluateSubmission::find().one(&self.conn).await?;
        let evaluate_assessments = EvaluateAssessment::find().one(&self.conn).await?;

        Ok(submissions.is_some()
            || assessments.is_some()
            || evaluate_submissions.is_some()
            || evaluate_assessments.is_some())
    }

    /// Clear all data from the database
    pub async fn clear_all_data(&self) -> Result<()> {
        Submission::delete_many().exec(&self.conn).await?;
        Assessment::delete_many().exec(&self.conn).await?;
        EvaluateSubmission::delete_many().exec(&self.conn).await?;
        EvaluateAssessment::delete_many().exec(&self.conn).await?;
        SyncTime::delete_many().exec(&self.conn).await?;
        WsCache::delete_many().exec(&self.conn).await?;
        Ok(())
    }
}
