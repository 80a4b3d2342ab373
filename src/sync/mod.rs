//! Synchronization service for queued workshop actions.
//!
//! This module provides the [`WorkshopSync`] struct which drains the offline
//! store and replays every queued action against the site once it is
//! reachable again.
//!
//! For each action the sync first asks the site when the target entity was
//! last modified:
//! - the entity is gone, or changed on the site after the action was queued:
//!   the action is discarded with a warning
//! - otherwise the action is replayed, attachments first
//!
//! A web-service error while replaying discards the action with a warning.
//! Any other error keeps the action and fails the sync so it can be retried.
//! Only one sync of a given workshop runs at a time; a second caller waits
//! for the running one and receives its result.

pub mod assessments;
pub mod blocker;
pub mod evaluations;
pub mod submissions;

pub use blocker::SyncBlocker;

use anyhow::Result;
use log::{debug, error, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};

use crate::constants::{DEFAULT_SYNC_INTERVAL_SECONDS, WORKSHOP_COMPONENT};
use crate::offline::{OfflineFiles, OfflineStore, OfflineSubmission};
use crate::repositories::SyncTimeRepository;
use crate::site::{SiteError, WorkshopSite};
use crate::utils::datetime;
use crate::workshop::Connectivity;

/// Outcome of a workshop sync
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncResult {
    /// Why queued actions were discarded, without duplicates
    pub warnings: Vec<String>,
    /// Whether anything was sent or discarded
    pub updated: bool,
}

impl SyncResult {
    /// Record that queued data of `workshop_name` was dropped because of `reason`
    pub fn add_warning(&mut self, workshop_name: &str, reason: &str) {
        let message = format!(
            "The offline data of workshop '{}' had to be deleted. {}",
            workshop_name, reason
        );
        if !self.warnings.contains(&message) {
            self.warnings.push(message);
        }
    }
}

/// Error types for sync operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncError {
    #[error("Workshop {workshop_id} is being edited and can't be synchronized right now")]
    Blocked { workshop_id: i64 },

    #[error("Can't synchronize while offline")]
    Offline,

    #[error(transparent)]
    Site(#[from] SiteError),

    #[error("Offline storage error: {0}")]
    Storage(Arc<anyhow::Error>),
}

impl From<anyhow::Error> for SyncError {
    fn from(e: anyhow::Error) -> Self {
        SyncError::Storage(Arc::new(e))
    }
}

/// Notifications sent by the sync service
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncEvent {
    /// A background sync sent or discarded queued data
    AutoSynced { workshop_id: i64, warnings: Vec<String> },
}

/// Outcome of syncing every workshop with queued data
#[derive(Debug, Default)]
pub struct SyncSummary {
    pub synced: Vec<(i64, SyncResult)>,
    /// Not due yet
    pub skipped: Vec<i64>,
    pub failed: Vec<(i64, SyncError)>,
}

type SyncOutcome = Result<SyncResult, SyncError>;

/// Service replaying queued workshop actions against the site.
#[derive(Clone)]
pub struct WorkshopSync {
    site: Arc<dyn WorkshopSite>,
    offline: OfflineStore,
    files: OfflineFiles,
    connectivity: Connectivity,
    blocker: SyncBlocker,
    sync_interval: u64,
    events: broadcast::Sender<SyncEvent>,
    ongoing: Arc<Mutex<HashMap<i64, watch::Receiver<Option<SyncOutcome>>>>>,
}

impl WorkshopSync {
    pub fn new(
        site: Arc<dyn WorkshopSite>,
        offline: OfflineStore,
        files: OfflineFiles,
        connectivity: Connectivity,
    ) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            site,
            offline,
            files,
            connectivity,
            blocker: SyncBlocker::new(),
            sync_interval: DEFAULT_SYNC_INTERVAL_SECONDS,
            events,
            ongoing: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Minimum seconds between two automatic syncs of a workshop
    pub fn with_sync_interval(mut self, seconds: u64) -> Self {
        self.sync_interval = seconds;
        self
    }

    /// Share a blocker with the code editing workshops
    pub fn with_blocker(mut self, blocker: SyncBlocker) -> Self {
        self.blocker = blocker;
        self
    }

    pub fn blocker(&self) -> &SyncBlocker {
        &self.blocker
    }

    /// Receive [`SyncEvent`]s
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub async fn has_data_to_sync(&self, workshop_id: i64) -> bool {
        self.offline.has_workshop_offline_data(workshop_id).await
    }

    /// Whether a sync of the workshop is running right now
    pub async fn is_syncing(&self, workshop_id: i64) -> bool {
        self.ongoing.lock().await.contains_key(&workshop_id)
    }

    /// Last sync time of a workshop, 0 if never synced
    pub async fn get_sync_time(&self, workshop_id: i64) -> Result<i64> {
        let storage = self.offline.storage();
        let storage = storage.lock().await;
        SyncTimeRepository::get(&storage.conn, WORKSHOP_COMPONENT, workshop_id).await
    }

    async fn set_sync_time(&self, workshop_id: i64) {
        let storage = self.offline.storage();
        let storage = storage.lock().await;
        if let Err(e) =
            SyncTimeRepository::set(&storage.conn, WORKSHOP_COMPONENT, workshop_id, datetime::timestamp()).await
        {
            warn!("⚠️  Failed to store sync time of workshop {}: {}", workshop_id, e);
        }
    }

    /// Whether the sync interval has passed since the last sync
    pub async fn is_sync_needed(&self, workshop_id: i64) -> Result<bool> {
        let last_sync = self.get_sync_time(workshop_id).await?;
        Ok(datetime::seconds_since(last_sync) >= self.sync_interval as i64)
    }

    /// Sync every workshop with queued data.
    ///
    /// Without `force`, workshops synced less than the sync interval ago are
    /// skipped. One workshop failing doesn't stop the others.
    pub async fn sync_all_workshops(&self, force: bool) -> Result<SyncSummary> {
        let workshop_ids = self.offline.get_all_workshops().await?;
        info!("🔄 Synchronizing {} workshops with offline data", workshop_ids.len());

        let mut summary = SyncSummary::default();
        for workshop_id in workshop_ids {
            let outcome = if force {
                self.sync_workshop(workshop_id).await.map(Some)
            } else {
                self.sync_workshop_if_needed(workshop_id).await
            };

            match outcome {
                Ok(Some(result)) => {
                    if result.updated {
                        // Nobody listening is fine
                        let _ = self.events.send(SyncEvent::AutoSynced {
                            workshop_id,
                            warnings: result.warnings.clone(),
                        });
                    }
                    summary.synced.push((workshop_id, result));
                }
                Ok(None) => summary.skipped.push(workshop_id),
                Err(e) => {
                    error!("❌ Failed to sync workshop {}: {}", workshop_id, e);
                    summary.failed.push((workshop_id, e));
                }
            }
        }

        Ok(summary)
    }

    /// Sync a workshop if the sync interval has passed. `None` when it wasn't due.
    pub async fn sync_workshop_if_needed(&self, workshop_id: i64) -> Result<Option<SyncResult>, SyncError> {
        if !self.is_sync_needed(workshop_id).await? {
            debug!("Workshop {} was synced recently, skipping", workshop_id);
            return Ok(None);
        }
        self.sync_workshop(workshop_id).await.map(Some)
    }

    /// Sync a workshop now.
    ///
    /// Joins the running sync of the same workshop if there is one. The sync
    /// runs on its own task, so dropping the returned future doesn't stop it.
    pub async fn sync_workshop(&self, workshop_id: i64) -> SyncOutcome {
        loop {
            let sender = {
                let mut ongoing = self.ongoing.lock().await;
                if let Some(receiver) = ongoing.get(&workshop_id) {
                    let mut receiver = receiver.clone();
                    drop(ongoing);
                    debug!("Workshop {} is already syncing, waiting for it", workshop_id);
                    match wait_for_outcome(&mut receiver).await {
                        Some(outcome) => return outcome,
                        None => {
                            warn!("⚠️  Running sync of workshop {} went away, starting over", workshop_id);
                            self.evict_closed(workshop_id).await;
                            continue;
                        }
                    }
                }

                if self.blocker.is_blocked(WORKSHOP_COMPONENT, workshop_id).await {
                    debug!("Workshop {} is blocked, not syncing", workshop_id);
                    return Err(SyncError::Blocked { workshop_id });
                }

                let (sender, receiver) = watch::channel(None);
                ongoing.insert(workshop_id, receiver);
                sender
            };

            let this = self.clone();
            let task = tokio::spawn(async move {
                let outcome = this.perform_sync(workshop_id).await;
                this.ongoing.lock().await.remove(&workshop_id);
                sender.send_replace(Some(outcome.clone()));
                outcome
            });

            return match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("❌ Sync task of workshop {} failed: {}", workshop_id, e);
                    self.evict_closed(workshop_id).await;
                    Err(anyhow::anyhow!("Sync of workshop {} stopped: {}", workshop_id, e).into())
                }
            };
        }
    }

    /// Forget a running sync whose task is gone
    async fn evict_closed(&self, workshop_id: i64) {
        let mut ongoing = self.ongoing.lock().await;
        let closed = ongoing
            .get(&workshop_id)
            .is_some_and(|receiver| receiver.has_changed().is_err());
        if closed {
            ongoing.remove(&workshop_id);
        }
    }

    async fn perform_sync(&self, workshop_id: i64) -> SyncOutcome {
        info!("🔄 Syncing workshop {}", workshop_id);

        let submissions = self
            .offline
            .get_submissions(workshop_id)
            .await
            .unwrap_or_else(|e| empty_queue("submissions", e));
        let assessments = self
            .offline
            .get_assessments(workshop_id)
            .await
            .unwrap_or_else(|e| empty_queue("assessments", e));
        let submission_evaluations = self
            .offline
            .get_evaluate_submissions(workshop_id)
            .await
            .unwrap_or_else(|e| empty_queue("submission evaluations", e));
        let assessment_evaluations = self
            .offline
            .get_evaluate_assessments(workshop_id)
            .await
            .unwrap_or_else(|e| empty_queue("assessment evaluations", e));

        let course_id = [
            submissions.first().map(|row| row.course_id),
            assessments.first().map(|row| row.course_id),
            submission_evaluations.first().map(|row| row.course_id),
            assessment_evaluations.first().map(|row| row.course_id),
        ]
        .into_iter()
        .flatten()
        .find(|course_id| *course_id != 0);

        let Some(course_id) = course_id else {
            debug!("Nothing to sync in workshop {}", workshop_id);
            self.set_sync_time(workshop_id).await;
            return Ok(SyncResult::default());
        };

        if !self.connectivity.is_online() {
            return Err(SyncError::Offline);
        }

        let workshop = self.site.get_workshop_by_id(course_id, workshop_id).await?;
        let mut result = SyncResult::default();
        let mut failure = None;

        let mut groups: BTreeMap<i64, Vec<OfflineSubmission>> = BTreeMap::new();
        for action in submissions {
            groups.entry(action.submission_id).or_default().push(action);
        }

        for actions in groups.into_values() {
            let outcome = self.sync_submission(&workshop, actions, &mut result).await;
            keep_first_failure(&mut failure, outcome);
        }
        for assessment in assessments {
            let outcome = self.sync_assessment(&workshop, assessment, &mut result).await;
            keep_first_failure(&mut failure, outcome);
        }
        for evaluation in submission_evaluations {
            let outcome = self.sync_evaluate_submission(&workshop, evaluation, &mut result).await;
            keep_first_failure(&mut failure, outcome);
        }
        for evaluation in assessment_evaluations {
            let outcome = self.sync_evaluate_assessment(&workshop, evaluation, &mut result).await;
            keep_first_failure(&mut failure, outcome);
        }

        if let Some(e) = failure {
            error!("❌ Sync of workshop {} stopped: {}", workshop_id, e);
            return Err(e);
        }

        if result.updated {
            if let Err(e) = self.site.invalidate_content(workshop_id, course_id).await {
                warn!("⚠️  Failed to invalidate cached data of workshop {}: {}", workshop_id, e);
            }
        }

        self.set_sync_time(workshop_id).await;
        info!(
            "✅ Synced workshop {} ({} warnings)",
            workshop_id,
            result.warnings.len()
        );
        Ok(result)
    }
}

/// Stored files are removed on a best-effort basis
pub(crate) fn log_file_cleanup(removal: Result<()>) {
    if let Err(e) = removal {
        warn!("⚠️  Failed to delete stored files: {}", e);
    }
}

fn empty_queue<T>(kind: &str, e: anyhow::Error) -> Vec<T> {
    warn!("⚠️  Could not read queued {}: {}", kind, e);
    Vec::new()
}

/// Keep syncing the remaining items but remember the first failure
fn keep_first_failure(failure: &mut Option<SyncError>, outcome: Result<(), SyncError>) {
    if let Err(e) = outcome {
        warn!("⚠️  Keeping queued action for a later sync: {}", e);
        failure.get_or_insert(e);
    }
}

/// Result of the running sync, `None` when it ended without publishing one
async fn wait_for_outcome(receiver: &mut watch::Receiver<Option<SyncOutcome>>) -> Option<SyncOutcome> {
    match receiver.wait_for(Option::is_some).await {
        Ok(outcome) => outcome.clone(),
        Err(_) => None,
    }
}

/// Split a web-service rejection from failures that should be retried
///
/// Returns the discard reason when the site refused the action.
pub(crate) fn discard_reason(outcome: Result<(), SyncError>) -> Result<Option<String>, SyncError> {
    match outcome {
        Ok(()) => Ok(None),
        Err(SyncError::Site(e)) if e.is_web_service_error() => Ok(Some(e.to_string())),
        Err(e) => Err(e),
    }
}

/// Entity modification time used for the staleness check, -1 when it can't be read
pub(crate) fn time_or_missing<T>(fetched: Result<T, SiteError>, time: impl FnOnce(&T) -> i64) -> i64 {
    match fetched {
        Ok(entity) => time(&entity),
        Err(e) => {
            debug!("Entity unavailable on the site: {}", e);
            -1
        }
    }
}

/// Whether a queued action must be discarded
pub(crate) fn is_stale(site_time: i64, queued_time: i64) -> bool {
    site_time < 0 || site_time >= queued_time
}
