//! Site factory for creating site clients from configuration.

use anyhow::{anyhow, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::{MoodleSite, WorkshopSite};
use crate::config::Config;
use crate::constants::ERROR_NO_API_TOKEN;
use crate::storage::LocalStorage;

/// Create a site client from configuration.
///
/// # Errors
/// Returns error if:
/// - The token environment variable is unset or empty
/// - The HTTP client cannot be built
pub fn create_site(config: &Config, storage: Arc<Mutex<LocalStorage>>) -> Result<Arc<dyn WorkshopSite>> {
    let token = config
        .site
        .token()
        .ok_or_else(|| anyhow!("{} ({})", ERROR_NO_API_TOKEN, config.site.token_env))?;

    let site = MoodleSite::new(
        &config.site.url,
        token,
        Duration::from_secs(config.site.timeout_seconds),
        storage,
    )?;

    Ok(Arc::new(site))
}
