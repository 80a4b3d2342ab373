//! Workshop data provider.
//!
//! This module provides the [`WorkshopService`] struct which sends workshop
//! mutations to the site or queues them in the [`OfflineStore`] when the site
//! can't be reached, and merges queued actions onto site data for display.
//!
//! Every mutation follows the same flow:
//! 1. Drop any queued action it would replace
//! 2. Queue it right away when offline and queueing is allowed
//! 3. Otherwise send it; a transport failure with queueing allowed queues it,
//!    a web-service error is returned to the caller

pub mod assessments;
pub mod helper;
pub mod submissions;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::offline::{OfflineFiles, OfflineStore};
use crate::site::{SiteError, WorkshopSite};

/// Shared online/offline flag flipped by the embedding application
#[derive(Clone, Debug)]
pub struct Connectivity(Arc<AtomicBool>);

impl Connectivity {
    pub fn new(online: bool) -> Self {
        Self(Arc::new(AtomicBool::new(online)))
    }

    pub fn is_online(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set_online(&self, online: bool) {
        self.0.store(online, Ordering::SeqCst);
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Result of a mutation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The site accepted it
    Sent(T),
    /// It waits in the offline store for the next sync
    Queued,
}

impl<T> Outcome<T> {
    pub fn is_queued(&self) -> bool {
        matches!(self, Outcome::Queued)
    }

    pub fn sent(self) -> Option<T> {
        match self {
            Outcome::Sent(value) => Some(value),
            Outcome::Queued => None,
        }
    }
}

/// Error types for workshop mutations.
#[derive(Debug, thiserror::Error)]
pub enum WorkshopError {
    #[error(transparent)]
    Site(#[from] SiteError),

    #[error("Offline storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl WorkshopError {
    /// Whether the site refused the mutation
    pub fn is_web_service_error(&self) -> bool {
        matches!(self, WorkshopError::Site(e) if e.is_web_service_error())
    }
}

/// Workshop provider choosing between the site and the offline store.
#[derive(Clone)]
pub struct WorkshopService {
    site: Arc<dyn WorkshopSite>,
    offline: OfflineStore,
    files: OfflineFiles,
    connectivity: Connectivity,
    allow_offline: bool,
}

impl WorkshopService {
    pub fn new(
        site: Arc<dyn WorkshopSite>,
        offline: OfflineStore,
        files: OfflineFiles,
        connectivity: Connectivity,
    ) -> Self {
        Self {
            site,
            offline,
            files,
            connectivity,
            allow_offline: true,
        }
    }

    /// Forbid queueing for every mutation, whatever the caller asks
    pub fn with_offline_allowed(mut self, allow_offline: bool) -> Self {
        self.allow_offline = allow_offline;
        self
    }

    pub fn site(&self) -> &Arc<dyn WorkshopSite> {
        &self.site
    }

    pub fn offline(&self) -> &OfflineStore {
        &self.offline
    }

    pub fn files(&self) -> &OfflineFiles {
        &self.files
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    fn offline_allowed(&self, requested: bool) -> bool {
        requested && self.allow_offline
    }

    /// Queue straight away instead of trying the site
    fn should_queue(&self, allow_offline: bool) -> bool {
        allow_offline && !self.connectivity.is_online()
    }

    /// Fall back to queueing after a failed send
    fn should_queue_after(&self, allow_offline: bool, error: &SiteError) -> bool {
        allow_offline && !error.is_web_service_error()
    }
}
