//! Service wiring from configuration.

use anyhow::Result;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::offline::{OfflineFiles, OfflineStore};
use crate::site::{create_site, WorkshopSite};
use crate::storage::LocalStorage;
use crate::sync::WorkshopSync;
use crate::workshop::{Connectivity, WorkshopService};

/// The provider and the sync service sharing one storage, site and connectivity flag
#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub storage: Arc<Mutex<LocalStorage>>,
    pub connectivity: Connectivity,
    pub workshops: WorkshopService,
    pub sync: WorkshopSync,
}

impl AppContext {
    /// Open the configured database and connect to the configured site
    pub async fn from_config(config: Config) -> Result<Self> {
        let database_path = config.database_path()?;
        info!("💾 Opening offline storage at {}", database_path.display());
        let storage = Arc::new(Mutex::new(LocalStorage::new(&database_path).await?));
        let site = create_site(&config, storage.clone())?;
        Self::with_site(config, storage, site)
    }

    /// Wire the services around an existing site client
    pub fn with_site(config: Config, storage: Arc<Mutex<LocalStorage>>, site: Arc<dyn WorkshopSite>) -> Result<Self> {
        let offline = OfflineStore::new(storage.clone());
        let files = OfflineFiles::new(config.files_dir()?);
        let connectivity = Connectivity::default();

        let workshops = WorkshopService::new(site.clone(), offline.clone(), files.clone(), connectivity.clone())
            .with_offline_allowed(config.sync.allow_offline);
        let sync = WorkshopSync::new(site, offline, files, connectivity.clone())
            .with_sync_interval(config.sync.sync_interval_seconds);

        Ok(Self {
            config,
            storage,
            connectivity,
            workshops,
            sync,
        })
    }
}
