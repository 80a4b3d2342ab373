//! Offline store for queued workshop actions.
//!
//! This module provides the [`OfflineStore`] struct, the local queue of
//! mutations that could not be sent to the site. Each kind of action has its
//! own table:
//!
//! - submission actions (add, update, delete), keyed by workshop, submission and action
//! - assessments, keyed by workshop and assessment
//! - submission evaluations, keyed by workshop and submission
//! - assessment evaluations, keyed by workshop and assessment
//!
//! Saving an action with an existing key overwrites it. Files attached to
//! queued actions live on disk and are handled by [`OfflineFiles`].

pub mod assessments;
pub mod evaluations;
pub mod files;
pub mod submissions;

pub use assessments::{OfflineAssessment, FEEDBACK_ATTACHMENTS_FIELD};
pub use evaluations::{OfflineEvaluateAssessment, OfflineEvaluateSubmission};
pub use files::{AttachmentFile, OfflineFiles, StoredFiles};
pub use submissions::OfflineSubmission;

use anyhow::Result;
use log::warn;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::repositories::{
    AssessmentRepository, EvaluateAssessmentRepository, EvaluateSubmissionRepository, SubmissionRepository,
};
use crate::storage::LocalStorage;

/// Kind of a queued submission action, ordered the way same-second actions replay
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubmissionAction {
    Add,
    Update,
    Delete,
}

impl SubmissionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionAction::Add => "add",
            SubmissionAction::Update => "update",
            SubmissionAction::Delete => "delete",
        }
    }

    /// Whether the action carries title, content and attachments
    pub fn has_content(&self) -> bool {
        matches!(self, SubmissionAction::Add | SubmissionAction::Update)
    }
}

impl fmt::Display for SubmissionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "add" => Ok(SubmissionAction::Add),
            "update" => Ok(SubmissionAction::Update),
            "delete" => Ok(SubmissionAction::Delete),
            other => Err(anyhow::anyhow!("Unknown submission action '{}'", other)),
        }
    }
}

/// Local queue of workshop mutations waiting to be sent.
#[derive(Clone)]
pub struct OfflineStore {
    storage: Arc<Mutex<LocalStorage>>,
}

impl OfflineStore {
    pub fn new(storage: Arc<Mutex<LocalStorage>>) -> Self {
        Self { storage }
    }

    /// Shared handle to the underlying storage
    pub fn storage(&self) -> Arc<Mutex<LocalStorage>> {
        self.storage.clone()
    }

    /// Ids of every workshop with at least one queued action, ascending
    pub async fn get_all_workshops(&self) -> Result<Vec<i64>> {
        let storage = self.storage.lock().await;
        let mut workshop_ids = BTreeSet::new();

        workshop_ids.extend(
            SubmissionRepository::get_all(&storage.conn)
                .await?
                .into_iter()
                .map(|row| row.workshop_id),
        );
        workshop_ids.extend(
            AssessmentRepository::get_all(&storage.conn)
                .await?
                .into_iter()
                .map(|row| row.workshop_id),
        );
        workshop_ids.extend(
            EvaluateSubmissionRepository::get_all(&storage.conn)
                .await?
                .into_iter()
                .map(|row| row.workshop_id),
        );
        workshop_ids.extend(
            EvaluateAssessmentRepository::get_all(&storage.conn)
                .await?
                .into_iter()
                .map(|row| row.workshop_id),
        );

        Ok(workshop_ids.into_iter().collect())
    }

    /// Whether a workshop has anything queued. Storage errors count as "no".
    pub async fn has_workshop_offline_data(&self, workshop_id: i64) -> bool {
        match self.count_workshop_rows(workshop_id).await {
            Ok(count) => count > 0,
            Err(e) => {
                warn!("⚠️  Could not read offline data of workshop {}: {}", workshop_id, e);
                false
            }
        }
    }

    async fn count_workshop_rows(&self, workshop_id: i64) -> Result<usize> {
        let storage = self.storage.lock().await;
        Ok(SubmissionRepository::get_for_workshop(&storage.conn, workshop_id).await?.len()
            + AssessmentRepository::get_for_workshop(&storage.conn, workshop_id).await?.len()
            + EvaluateSubmissionRepository::get_for_workshop(&storage.conn, workshop_id)
                .await?
                .len()
            + EvaluateAssessmentRepository::get_for_workshop(&storage.conn, workshop_id)
                .await?
                .len())
    }
}
